//! 文件元数据

use crate::{consts::*, inode::Inode};

/// 文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// 普通文件
    RegularFile,
    /// 目录
    Directory,
    /// 符号链接
    Symlink,
    /// 字符设备
    CharDevice,
    /// 块设备
    BlockDevice,
    /// FIFO（命名管道）
    Fifo,
    /// Socket
    Socket,
    /// 未知类型
    Unknown,
}

impl FileType {
    /// 从 inode 模式解析文件类型
    pub(crate) fn from_mode(mode: u16) -> Self {
        match mode & EXT2_INODE_MODE_TYPE_MASK {
            EXT2_INODE_MODE_FILE => FileType::RegularFile,
            EXT2_INODE_MODE_DIRECTORY => FileType::Directory,
            EXT2_INODE_MODE_SOFTLINK => FileType::Symlink,
            EXT2_INODE_MODE_CHARDEV => FileType::CharDevice,
            EXT2_INODE_MODE_BLOCKDEV => FileType::BlockDevice,
            EXT2_INODE_MODE_FIFO => FileType::Fifo,
            EXT2_INODE_MODE_SOCKET => FileType::Socket,
            _ => FileType::Unknown,
        }
    }

    /// 是否是目录
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    /// 是否是普通文件
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::RegularFile)
    }

    /// 是否是符号链接
    pub fn is_symlink(&self) -> bool {
        matches!(self, FileType::Symlink)
    }
}

/// 文件元数据
///
/// 从 inode 拷贝出来的快照，之后对镜像的修改不会反映到这里。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// 文件类型
    pub file_type: FileType,
    /// 文件大小（字节）
    pub size: u32,
    /// Inode 编号
    pub inode_num: u32,
    /// 访问权限（Unix 权限位）
    pub permissions: u16,
    /// 用户 ID
    pub uid: u16,
    /// 组 ID
    pub gid: u16,
    /// 访问时间（Unix 时间戳）
    pub atime: u32,
    /// 修改时间（Unix 时间戳）
    pub mtime: u32,
    /// 创建时间（Unix 时间戳）
    pub ctime: u32,
    /// 硬链接数
    pub links_count: u16,
    /// 占用的扇区数（512 字节，含间接块）
    pub blocks_count: u32,
}

impl FileMetadata {
    /// 从 inode 创建元数据
    pub(crate) fn from_inode(inode: &Inode) -> Self {
        Self {
            file_type: FileType::from_mode(inode.mode()),
            size: inode.size(),
            inode_num: inode.inode_num(),
            permissions: inode.permissions(),
            uid: inode.uid(),
            gid: inode.gid(),
            atime: inode.atime(),
            mtime: inode.mtime(),
            ctime: inode.ctime(),
            links_count: inode.links_count(),
            blocks_count: inode.sectors(),
        }
    }

    /// 是否是目录
    pub fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }

    /// 是否是普通文件
    pub fn is_file(&self) -> bool {
        self.file_type.is_file()
    }

    /// 是否是符号链接
    pub fn is_symlink(&self) -> bool {
        self.file_type.is_symlink()
    }
}
