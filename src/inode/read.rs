//! Inode 读取和查询

use crate::{
    block::Image,
    consts::*,
    error::{Error, ErrorKind, Result},
    fs::InodeType,
    types::ext2_inode,
};

/// 计算 inode 在镜像中的字节偏移
///
/// # 参数
///
/// * `image` - 镜像句柄
/// * `inode_num` - inode 编号（从 1 开始）
///
/// # 说明
///
/// inode 编号从 1 开始，0 表示无效 inode
pub fn inode_offset<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>, inode_num: u32) -> Result<usize> {
    let layout = image.layout();
    if inode_num == 0 {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Invalid inode number (0)",
        ));
    }
    if inode_num > layout.inodes_count {
        log::error!(
            "[inode] inode {} beyond inodes_count {}",
            inode_num,
            layout.inodes_count
        );
        return Err(Error::new(
            ErrorKind::Corrupted,
            "Inode number beyond inodes_count",
        ));
    }

    let table = layout.inode_table as usize * layout.block_size as usize;
    Ok(table + (inode_num as usize - 1) * layout.inode_size as usize)
}

/// 从镜像读取 inode
pub fn read_inode<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>, inode_num: u32) -> Result<ext2_inode> {
    let offset = inode_offset(image, inode_num)?;
    let raw = image.bytes(offset, ext2_inode::ENCODED_LEN)?;
    Ok(ext2_inode::parse(raw))
}

/// Inode 包装器，提供高级操作
///
/// 持有 inode 的一份拷贝；修改后调用 [`Inode::write`] 写回镜像。
#[derive(Debug, Clone)]
pub struct Inode {
    pub(super) inner: ext2_inode,
    pub(super) inode_num: u32,
}

impl Inode {
    /// 从镜像加载 inode
    pub fn load<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>, inode_num: u32) -> Result<Self> {
        let inner = read_inode(image, inode_num)?;
        Ok(Self { inner, inode_num })
    }

    /// 从原始 inode 数据创建
    pub fn from_raw(inner: ext2_inode, inode_num: u32) -> Self {
        Self { inner, inode_num }
    }

    /// 获取 inode 编号
    pub fn inode_num(&self) -> u32 {
        self.inode_num
    }

    /// 获取内部 inode 结构的引用
    pub fn inner(&self) -> &ext2_inode {
        &self.inner
    }

    /// 获取文件大小
    pub fn size(&self) -> u32 {
        self.inner.size
    }

    /// 获取文件模式（类型 + 权限）
    pub fn mode(&self) -> u16 {
        self.inner.mode
    }

    /// 权限位
    pub fn permissions(&self) -> u16 {
        self.inner.mode & EXT2_INODE_MODE_PERM_MASK
    }

    /// 从 mode 解析出的 inode 类型
    pub fn inode_type(&self) -> InodeType {
        InodeType::from_mode(self.inner.mode as u32)
    }

    /// 检查是否是目录
    pub fn is_dir(&self) -> bool {
        self.inner.is_dir()
    }

    /// 检查是否是普通文件
    pub fn is_file(&self) -> bool {
        self.inner.is_file()
    }

    /// 检查是否是符号链接
    pub fn is_symlink(&self) -> bool {
        self.inner.is_symlink()
    }

    /// 获取链接计数
    pub fn links_count(&self) -> u16 {
        self.inner.links_count
    }

    /// 获取占用的扇区数（512 字节为单位）
    pub fn sectors(&self) -> u32 {
        self.inner.blocks
    }

    /// 按块号读取块指针（0..15）
    pub fn block_ptr(&self, index: usize) -> Option<u32> {
        self.inner.block.get(index).copied()
    }

    /// 获取一级间接块块号
    pub fn indirect_block(&self) -> u32 {
        self.inner.block[EXT2_INODE_INDIRECT_BLOCK]
    }

    /// 访问时间
    pub fn atime(&self) -> u32 {
        self.inner.atime
    }

    /// 创建/改变时间
    pub fn ctime(&self) -> u32 {
        self.inner.ctime
    }

    /// 修改时间
    pub fn mtime(&self) -> u32 {
        self.inner.mtime
    }

    /// 删除时间
    pub fn dtime(&self) -> u32 {
        self.inner.dtime
    }

    /// 用户 ID
    pub fn uid(&self) -> u16 {
        self.inner.uid
    }

    /// 组 ID
    pub fn gid(&self) -> u16 {
        self.inner.gid
    }
}
