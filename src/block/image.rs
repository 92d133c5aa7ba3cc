//! 镜像句柄
//!
//! 提供按块号和字节偏移寻址的原始访问器（地址运算 + 边界检查）。

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
    types::{ext2_group_desc, ext2_sblock},
};

/// 镜像的静态布局
///
/// 在 [`Image::open`] 时从 superblock 和块组描述符中读出，
/// 之后的任何操作都不会改变这些字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    /// 块大小（字节）
    pub block_size: u32,
    /// 第一个数据块（1 KiB 块为 1，否则为 0）
    pub first_data_block: u32,
    /// 总块数
    pub blocks_count: u32,
    /// 总 inode 数
    pub inodes_count: u32,
    /// inode 记录大小
    pub inode_size: u16,
    /// 第一个普通 inode
    pub first_ino: u32,
    /// 块位图所在块
    pub block_bitmap: u32,
    /// inode 位图所在块
    pub inode_bitmap: u32,
    /// inode 表起始块
    pub inode_table: u32,
}

impl ImageLayout {
    /// 块组描述符表所在的块
    pub fn group_desc_block(&self) -> u32 {
        self.first_data_block + 1
    }

    /// 每块包含的 512 字节扇区数（i_blocks 的换算系数）
    pub fn sectors_per_block(&self) -> u32 {
        self.block_size / EXT2_SECTOR_SIZE
    }

    /// 间接块可容纳的块指针数
    pub fn pointers_per_block(&self) -> u32 {
        self.block_size / 4
    }

    /// 块位图中有效的位数
    pub fn block_bits(&self) -> u32 {
        self.blocks_count - self.first_data_block
    }
}

/// ext2 镜像句柄
///
/// 包装任意可读写的字节缓冲区（`Vec<u8>`、`&mut [u8]`、可写内存映射等），
/// 并以显式参数的形式在每个操作之间传递，不使用全局状态。
///
/// # 示例
///
/// ```rust,ignore
/// use ext2img_core::{Image, mkfs::{self, MkfsOptions}};
///
/// let mut buf = vec![0u8; 128 * 1024];
/// mkfs::format(&mut buf, &MkfsOptions::default())?;
/// let image = Image::open(buf)?;
/// assert_eq!(image.layout().block_size, 1024);
/// ```
pub struct Image<B> {
    buf: B,
    layout: ImageLayout,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Image<B> {
    /// 打开镜像并校验布局
    ///
    /// # 错误
    ///
    /// - `ErrorKind::Corrupted` - 魔数错误，或缓冲区比 superblock 声明的小
    /// - `ErrorKind::Unsupported` - 块大小不支持，或存在多个块组
    pub fn open(buf: B) -> Result<Self> {
        let bytes = buf.as_ref();
        if bytes.len() < EXT2_SUPERBLOCK_OFFSET + EXT2_SUPERBLOCK_SIZE {
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Image too small to hold a superblock",
            ));
        }

        let sb = ext2_sblock::parse(
            &bytes[EXT2_SUPERBLOCK_OFFSET..EXT2_SUPERBLOCK_OFFSET + ext2_sblock::ENCODED_LEN],
        );
        if !sb.is_valid() {
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Invalid ext2 superblock magic number",
            ));
        }

        let block_size = sb.block_size();
        if !(EXT2_MIN_BLOCK_SIZE..=EXT2_MAX_BLOCK_SIZE).contains(&block_size) {
            return Err(Error::new(ErrorKind::Unsupported, "Unsupported block size"));
        }

        let expected_fdb = if block_size == EXT2_MIN_BLOCK_SIZE { 1 } else { 0 };
        if sb.first_data_block != expected_fdb {
            return Err(Error::new(
                ErrorKind::Corrupted,
                "first_data_block does not match block size",
            ));
        }

        if (bytes.len() as u64) < sb.blocks_count as u64 * block_size as u64 {
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Image smaller than blocks_count",
            ));
        }

        if sb.blocks_count <= sb.first_data_block
            || sb.blocks_count - sb.first_data_block > sb.blocks_per_group
            || sb.inodes_count == 0
            || sb.inodes_count > sb.inodes_per_group
        {
            return Err(Error::new(
                ErrorKind::Unsupported,
                "Only single block group images are supported",
            ));
        }

        let inode_size = sb.inode_size();
        if inode_size < EXT2_GOOD_OLD_INODE_SIZE
            || !inode_size.is_power_of_two()
            || inode_size as u32 > block_size
        {
            return Err(Error::new(ErrorKind::Corrupted, "Invalid inode size"));
        }

        if sb.blocks_count <= sb.first_data_block + 1 {
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Image too small to hold a group descriptor",
            ));
        }

        let gd_offset = (sb.first_data_block as usize + 1) * block_size as usize;
        let gd_bytes = bytes
            .get(gd_offset..gd_offset + ext2_group_desc::ENCODED_LEN)
            .ok_or(Error::new(
                ErrorKind::Corrupted,
                "Group descriptor outside image",
            ))?;
        let gd = ext2_group_desc::parse(gd_bytes);

        let layout = ImageLayout {
            block_size,
            first_data_block: sb.first_data_block,
            blocks_count: sb.blocks_count,
            inodes_count: sb.inodes_count,
            inode_size,
            first_ino: sb.first_ino(),
            block_bitmap: gd.block_bitmap,
            inode_bitmap: gd.inode_bitmap,
            inode_table: gd.inode_table,
        };

        let table_bytes = layout.inodes_count as u64 * inode_size as u64;
        let table_blocks = table_bytes.div_ceil(block_size as u64);
        if layout.block_bitmap >= layout.blocks_count
            || layout.inode_bitmap >= layout.blocks_count
            || layout.inode_table as u64 + table_blocks > layout.blocks_count as u64
        {
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Group descriptor points outside the image",
            ));
        }

        log::debug!(
            "[image] opened: block_size={} blocks={} inodes={} inode_table={}",
            layout.block_size,
            layout.blocks_count,
            layout.inodes_count,
            layout.inode_table
        );

        Ok(Self { buf, layout })
    }

    /// 取回底层缓冲区
    pub fn into_inner(self) -> B {
        self.buf
    }

    /// 镜像布局
    pub fn layout(&self) -> &ImageLayout {
        &self.layout
    }

    /// 块大小（字节）
    pub fn block_size(&self) -> u32 {
        self.layout.block_size
    }

    /// 整个镜像的只读视图
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// 读取任意字节区间
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = offset
            .checked_add(len)
            .ok_or(Error::new(ErrorKind::Corrupted, "Byte range overflow"))?;
        self.buf
            .as_ref()
            .get(offset..end)
            .ok_or(Error::new(ErrorKind::Corrupted, "Byte range outside image"))
    }

    /// 获取任意字节区间的可变视图
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let end = offset
            .checked_add(len)
            .ok_or(Error::new(ErrorKind::Corrupted, "Byte range overflow"))?;
        self.buf
            .as_mut()
            .get_mut(offset..end)
            .ok_or(Error::new(ErrorKind::Corrupted, "Byte range outside image"))
    }

    /// 按块号获取块的只读视图
    ///
    /// 块号必须小于 superblock 中的总块数
    pub fn block(&self, index: u32) -> Result<&[u8]> {
        let offset = self.block_offset(index)?;
        self.bytes(offset, self.layout.block_size as usize)
    }

    /// 按块号获取块的可变视图
    pub fn block_mut(&mut self, index: u32) -> Result<&mut [u8]> {
        let offset = self.block_offset(index)?;
        let len = self.layout.block_size as usize;
        self.bytes_mut(offset, len)
    }

    /// 将整块清零
    pub fn zero_block(&mut self, index: u32) -> Result<()> {
        self.block_mut(index)?.fill(0);
        Ok(())
    }

    fn block_offset(&self, index: u32) -> Result<usize> {
        if index >= self.layout.blocks_count {
            log::error!(
                "[image] block {} outside image ({} blocks)",
                index,
                self.layout.blocks_count
            );
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Block index outside image",
            ));
        }
        Ok(index as usize * self.layout.block_size as usize)
    }
}
