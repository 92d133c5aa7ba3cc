//! 镜像格式化
//!
//! 在一块内存缓冲区上写出一个全新的单块组 ext2（修订版本 1）镜像。
//!
//! ## 布局
//!
//! | 块 | 内容 |
//! |---|---|
//! | `first_data_block` | superblock（4 KiB 块时和引导扇区共用块 0） |
//! | `+1` | 块组描述符表 |
//! | `+2` | 块位图 |
//! | `+3` | inode 位图 |
//! | `+4 ..` | inode 表 |
//! | 之后 | 根目录数据块、`lost+found` 数据块 |
//!
//! inode 1..=11 全部保留，2 是根目录，11 是 `lost+found`。

use crate::{
    bitmap::assign_bit,
    consts::*,
    dir::entry::write_entry,
    error::{Error, ErrorKind, Result},
    types::{ext2_group_desc, ext2_inode, ext2_sblock},
};

/// 格式化参数
#[derive(Debug, Clone, Copy)]
pub struct MkfsOptions {
    /// 块大小（1024、2048 或 4096）
    pub block_size: u32,
    /// 总块数，0 表示用满缓冲区
    pub blocks_count: u32,
    /// inode 总数，0 表示按每 4 块一个 inode 估算
    pub inodes_count: u32,
    /// 卷标
    pub volume_name: [u8; 16],
}

impl Default for MkfsOptions {
    fn default() -> Self {
        Self {
            block_size: EXT2_MIN_BLOCK_SIZE,
            blocks_count: 0,
            inodes_count: 0,
            volume_name: [0; 16],
        }
    }
}

impl MkfsOptions {
    /// 设置卷标（超过 16 字节的部分被截断）
    pub fn with_volume_name(mut self, name: &str) -> Self {
        let bytes = name.as_bytes();
        let len = bytes.len().min(self.volume_name.len());
        self.volume_name = [0; 16];
        self.volume_name[..len].copy_from_slice(&bytes[..len]);
        self
    }
}

/// 最少 inode 数（保留的 11 个加上少量可用的）
const MIN_INODES: u32 = 16;

/// 格式化缓冲区
///
/// # 参数
///
/// * `buf` - 目标缓冲区，前 `blocks_count * block_size` 字节会被覆盖
/// * `opts` - 格式化参数
///
/// # 错误
///
/// - `ErrorKind::Unsupported` - 块大小不支持，或块数/inode 数超出单个块组
/// - `ErrorKind::InvalidInput` - 缓冲区太小
pub fn format(buf: &mut [u8], opts: &MkfsOptions) -> Result<()> {
    let block_size = opts.block_size;
    if !matches!(block_size, 1024 | 2048 | 4096) {
        return Err(Error::new(ErrorKind::Unsupported, "Unsupported block size"));
    }
    let bs = block_size as usize;

    let buf_blocks = (buf.len() / bs).min(u32::MAX as usize) as u32;
    let blocks_count = if opts.blocks_count == 0 {
        buf_blocks
    } else {
        opts.blocks_count
    };
    if blocks_count > buf_blocks {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Buffer smaller than requested block count",
        ));
    }

    let first_data_block = if block_size == EXT2_MIN_BLOCK_SIZE { 1 } else { 0 };
    let bits_per_block = block_size * 8;
    if blocks_count <= first_data_block || blocks_count - first_data_block > bits_per_block {
        return Err(Error::new(
            ErrorKind::Unsupported,
            "Block count does not fit a single block group",
        ));
    }

    let inodes_count = if opts.inodes_count == 0 {
        (blocks_count / 4).max(MIN_INODES).div_ceil(8) * 8
    } else {
        opts.inodes_count
    };
    if !(MIN_INODES..=bits_per_block).contains(&inodes_count) {
        return Err(Error::new(
            ErrorKind::Unsupported,
            "Inode count does not fit a single block group",
        ));
    }

    let inode_size = EXT2_GOOD_OLD_INODE_SIZE as u32;
    let table_blocks = (inodes_count * inode_size).div_ceil(block_size);

    let group_desc_block = first_data_block + 1;
    let block_bitmap = first_data_block + 2;
    let inode_bitmap = first_data_block + 3;
    let inode_table = first_data_block + 4;
    let root_block = inode_table + table_blocks;
    let lost_found_block = root_block + 1;

    // 至少留出一个空闲块
    if lost_found_block + 1 >= blocks_count {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Image too small for filesystem metadata",
        ));
    }

    let image_len = blocks_count as usize * bs;
    let buf = &mut buf[..image_len];
    buf.fill(0);

    let reserved_inodes = EXT2_GOOD_OLD_FIRST_INO;
    let used_blocks = lost_found_block + 1 - first_data_block;
    let free_blocks = blocks_count - first_data_block - used_blocks;
    let free_inodes = inodes_count - reserved_inodes;

    // superblock
    let sb = ext2_sblock {
        inodes_count,
        blocks_count,
        r_blocks_count: 0,
        free_blocks_count: free_blocks,
        free_inodes_count: free_inodes,
        first_data_block,
        log_block_size: (block_size / EXT2_MIN_BLOCK_SIZE).trailing_zeros(),
        log_frag_size: (block_size / EXT2_MIN_BLOCK_SIZE).trailing_zeros(),
        blocks_per_group: bits_per_block,
        frags_per_group: bits_per_block,
        inodes_per_group: inodes_count,
        max_mnt_count: u16::MAX,
        magic: EXT2_SUPERBLOCK_MAGIC,
        state: EXT2_VALID_FS,
        errors: EXT2_ERRORS_CONTINUE,
        rev_level: EXT2_DYNAMIC_REV,
        first_ino: EXT2_GOOD_OLD_FIRST_INO,
        inode_size: EXT2_GOOD_OLD_INODE_SIZE,
        feature_incompat: EXT2_FEATURE_INCOMPAT_FILETYPE,
        volume_name: opts.volume_name,
        ..Default::default()
    };
    sb.write_to(&mut buf[EXT2_SUPERBLOCK_OFFSET..EXT2_SUPERBLOCK_OFFSET + ext2_sblock::ENCODED_LEN]);

    // 块组描述符
    let gd = ext2_group_desc {
        block_bitmap,
        inode_bitmap,
        inode_table,
        free_blocks_count: free_blocks as u16,
        free_inodes_count: free_inodes as u16,
        used_dirs_count: 2,
    };
    let gd_offset = group_desc_block as usize * bs;
    gd.write_to(&mut buf[gd_offset..gd_offset + ext2_group_desc::ENCODED_LEN]);

    // 块位图：元数据块已用，超出总块数的填充位置 1
    {
        let offset = block_bitmap as usize * bs;
        let bitmap = &mut buf[offset..offset + bs];
        for bit in 0..used_blocks {
            assign_bit(bitmap, bit, true)?;
        }
        for bit in (blocks_count - first_data_block)..bits_per_block {
            assign_bit(bitmap, bit, true)?;
        }
    }

    // inode 位图：保留 inode 已用
    {
        let offset = inode_bitmap as usize * bs;
        let bitmap = &mut buf[offset..offset + bs];
        for bit in 0..reserved_inodes {
            assign_bit(bitmap, bit, true)?;
        }
        for bit in inodes_count..bits_per_block {
            assign_bit(bitmap, bit, true)?;
        }
    }

    let sectors = block_size / EXT2_SECTOR_SIZE;
    let write_inode = |buf: &mut [u8], num: u32, inode: &ext2_inode| {
        let offset = inode_table as usize * bs + (num as usize - 1) * inode_size as usize;
        inode.write_to(&mut buf[offset..offset + ext2_inode::ENCODED_LEN]);
    };

    let mut root = ext2_inode {
        mode: EXT2_INODE_MODE_DIRECTORY | 0o755,
        size: block_size,
        links_count: 3,
        blocks: sectors,
        ..Default::default()
    };
    root.block[0] = root_block;
    write_inode(buf, EXT2_ROOT_INODE, &root);

    let mut lost_found = ext2_inode {
        mode: EXT2_INODE_MODE_DIRECTORY | 0o700,
        size: block_size,
        links_count: 2,
        blocks: sectors,
        ..Default::default()
    };
    lost_found.block[0] = lost_found_block;
    write_inode(buf, EXT2_LOST_FOUND_INODE, &lost_found);

    // 根目录：. .. lost+found
    {
        let offset = root_block as usize * bs;
        let data = &mut buf[offset..offset + bs];
        write_entry(data, 0, EXT2_ROOT_INODE, 12, b".", EXT2_DE_DIR);
        write_entry(data, 12, EXT2_ROOT_INODE, 12, b"..", EXT2_DE_DIR);
        write_entry(
            data,
            24,
            EXT2_LOST_FOUND_INODE,
            (block_size - 24) as u16,
            b"lost+found",
            EXT2_DE_DIR,
        );
    }

    // lost+found：. ..
    {
        let offset = lost_found_block as usize * bs;
        let data = &mut buf[offset..offset + bs];
        write_entry(data, 0, EXT2_LOST_FOUND_INODE, 12, b".", EXT2_DE_DIR);
        write_entry(data, 12, EXT2_ROOT_INODE, (block_size - 12) as u16, b"..", EXT2_DE_DIR);
    }

    log::info!(
        "[mkfs] formatted {} blocks of {} bytes, {} inodes, first free block {}",
        blocks_count,
        block_size,
        inodes_count,
        lost_found_block + 1
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        block::Image,
        block_group::BlockGroup,
        inode::Inode,
        superblock::Superblock,
    };
    use alloc::vec;

    #[test]
    fn test_default_layout() {
        let mut buf = vec![0u8; 128 * 1024];
        format(&mut buf, &MkfsOptions::default()).unwrap();
        let image = Image::open(buf).unwrap();

        let layout = *image.layout();
        assert_eq!(layout.inodes_count, 32);
        assert_eq!(layout.block_bitmap, 3);
        assert_eq!(layout.inode_bitmap, 4);
        assert_eq!(layout.inode_table, 5);
        assert_eq!(layout.first_ino, 11);

        let sb = Superblock::load(&image).unwrap();
        let bg = BlockGroup::load(&image).unwrap();
        // 块 1..=10 是元数据、根目录和 lost+found
        assert_eq!(sb.free_blocks_count(), 117);
        assert_eq!(bg.free_blocks_count(), 117);
        assert_eq!(sb.free_inodes_count(), 21);
        assert_eq!(bg.used_dirs_count(), 2);

        let root = Inode::load(&image, EXT2_ROOT_INODE).unwrap();
        assert!(root.is_dir());
        assert_eq!(root.links_count(), 3);
        assert_eq!(root.block_ptr(0), Some(9));
        let lf = Inode::load(&image, EXT2_LOST_FOUND_INODE).unwrap();
        assert_eq!(lf.permissions(), 0o700);
        assert_eq!(lf.block_ptr(0), Some(10));
    }

    #[test]
    fn test_large_block_layout() {
        let mut buf = vec![0u8; 64 * 4096];
        let opts = MkfsOptions {
            block_size: 4096,
            ..MkfsOptions::default()
        }
        .with_volume_name("scratch");
        format(&mut buf, &opts).unwrap();
        let image = Image::open(buf).unwrap();

        assert_eq!(image.layout().first_data_block, 0);
        assert_eq!(image.layout().group_desc_block(), 1);
        assert_eq!(Superblock::load(&image).unwrap().volume_name(), b"scratch");
    }

    #[test]
    fn test_rejects_bad_options() {
        let mut buf = vec![0u8; 8 * 1024];
        let bad_bs = MkfsOptions {
            block_size: 512,
            ..MkfsOptions::default()
        };
        assert_eq!(format(&mut buf, &bad_bs).unwrap_err().kind(), ErrorKind::Unsupported);

        // 8 块放不下 inode 表和两个目录块
        assert_eq!(
            format(&mut buf, &MkfsOptions::default()).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );

        let too_many = MkfsOptions {
            blocks_count: 64,
            ..MkfsOptions::default()
        };
        assert_eq!(format(&mut buf, &too_many).unwrap_err().kind(), ErrorKind::InvalidInput);
    }
}
