//! Superblock 读取

use crate::{
    block::Image,
    consts::*,
    error::Result,
    types::ext2_sblock,
};

/// 从镜像读取 superblock
///
/// # 参数
///
/// * `image` - 镜像句柄
///
/// # 返回
///
/// 成功返回 superblock 结构
pub fn read_superblock<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>) -> Result<ext2_sblock> {
    let raw = image.bytes(EXT2_SUPERBLOCK_OFFSET, ext2_sblock::ENCODED_LEN)?;
    Ok(ext2_sblock::parse(raw))
}

/// Superblock 包装器，提供高级操作
///
/// 这是镜像中 superblock 的一个拷贝；修改后必须调用
/// [`Superblock::write`] 才会落到镜像里。
#[derive(Debug, Clone)]
pub struct Superblock {
    pub(super) inner: ext2_sblock,
}

impl Superblock {
    /// 从 ext2_sblock 创建 Superblock（主要用于测试和格式化）
    pub fn new(inner: ext2_sblock) -> Self {
        Self { inner }
    }

    /// 从镜像加载 superblock
    pub fn load<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>) -> Result<Self> {
        let inner = read_superblock(image)?;
        Ok(Self { inner })
    }

    /// 获取内部 superblock 结构的引用
    pub fn inner(&self) -> &ext2_sblock {
        &self.inner
    }

    /// 获取块大小
    pub fn block_size(&self) -> u32 {
        self.inner.block_size()
    }

    /// 获取总块数
    pub fn blocks_count(&self) -> u32 {
        self.inner.blocks_count
    }

    /// 获取空闲块数
    pub fn free_blocks_count(&self) -> u32 {
        self.inner.free_blocks_count
    }

    /// 获取总 inode 数
    pub fn inodes_count(&self) -> u32 {
        self.inner.inodes_count
    }

    /// 获取空闲 inode 数
    pub fn free_inodes_count(&self) -> u32 {
        self.inner.free_inodes_count
    }

    /// 获取第一个数据块
    pub fn first_data_block(&self) -> u32 {
        self.inner.first_data_block
    }

    /// 获取卷名（去掉尾部的 NUL）
    pub fn volume_name(&self) -> &[u8] {
        let name = &self.inner.volume_name;
        let len = name.iter().position(|&b| b == 0).unwrap_or(name.len());
        &name[..len]
    }
}
