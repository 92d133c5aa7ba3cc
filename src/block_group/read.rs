//! 块组描述符读取和查询操作

use crate::{
    block::Image,
    error::Result,
    types::ext2_group_desc,
};

/// 计算块组描述符在镜像中的字节偏移
///
/// # 参数
///
/// * `image` - 镜像句柄
pub fn get_block_group_desc_offset<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>) -> usize {
    let layout = image.layout();
    layout.group_desc_block() as usize * layout.block_size as usize
}

/// 从镜像读取块组描述符
pub fn read_block_group_desc<B: AsRef<[u8]> + AsMut<[u8]>>(
    image: &Image<B>,
) -> Result<ext2_group_desc> {
    let offset = get_block_group_desc_offset(image);
    let raw = image.bytes(offset, ext2_group_desc::ENCODED_LEN)?;
    Ok(ext2_group_desc::parse(raw))
}

/// 块组描述符包装器
#[derive(Debug, Clone)]
pub struct BlockGroup {
    pub(super) inner: ext2_group_desc,
}

impl BlockGroup {
    /// 从 ext2_group_desc 创建
    pub fn new(inner: ext2_group_desc) -> Self {
        Self { inner }
    }

    /// 从镜像加载块组描述符
    pub fn load<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>) -> Result<Self> {
        Ok(Self {
            inner: read_block_group_desc(image)?,
        })
    }

    /// 获取内部结构的引用
    pub fn inner(&self) -> &ext2_group_desc {
        &self.inner
    }

    /// 块位图所在块
    pub fn block_bitmap(&self) -> u32 {
        self.inner.block_bitmap
    }

    /// inode 位图所在块
    pub fn inode_bitmap(&self) -> u32 {
        self.inner.inode_bitmap
    }

    /// inode 表起始块
    pub fn inode_table(&self) -> u32 {
        self.inner.inode_table
    }

    /// 本组空闲块数
    pub fn free_blocks_count(&self) -> u32 {
        self.inner.free_blocks_count as u32
    }

    /// 本组空闲 inode 数
    pub fn free_inodes_count(&self) -> u32 {
        self.inner.free_inodes_count as u32
    }

    /// 本组目录数
    pub fn used_dirs_count(&self) -> u32 {
        self.inner.used_dirs_count as u32
    }
}
