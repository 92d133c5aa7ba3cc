//! 文件系统层使用的公共类型
//!
//! 时钟抽象、配置、统计信息以及 inode 类型。

use crate::consts::*;
use bitflags::bitflags;
use core::time::Duration;

/// 系统硬件抽象层 trait
///
/// 提供文件系统所需的系统级功能，主要是时间戳支持
pub trait SystemHal {
    /// 获取当前系统时间
    ///
    /// # 返回
    ///
    /// - `Some(Duration)` - 当前时间（从 UNIX 纪元开始）
    /// - `None` - 时间不可用（例如在没有RTC的嵌入式系统中）
    ///
    /// # 示例
    ///
    /// ```ignore
    /// struct MyHal;
    /// impl SystemHal for MyHal {
    ///     fn now() -> Option<Duration> {
    ///         Some(Duration::from_secs(get_unix_timestamp()))
    ///     }
    /// }
    /// ```
    fn now() -> Option<Duration>;
}

/// 没有时钟的环境，所有时间戳写 0
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClockHal;

impl SystemHal for NoClockHal {
    fn now() -> Option<Duration> {
        None
    }
}

/// 使用 `std::time::SystemTime` 的时钟
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct StdHal;

#[cfg(feature = "std")]
impl SystemHal for StdHal {
    fn now() -> Option<Duration> {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
    }
}

/// 当前时间的 ext2 时间戳（秒，u32）
pub(crate) fn timestamp<H: SystemHal>() -> u32 {
    H::now()
        .map(|d| d.as_secs().min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}

bitflags! {
    /// 权限位（mode 的低 12 位）
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileMode: u16 {
        /// 其他用户可执行
        const O_EXEC  = 0o0001;
        /// 其他用户可写
        const O_WRITE = 0o0002;
        /// 其他用户可读
        const O_READ  = 0o0004;
        /// 组可执行
        const G_EXEC  = 0o0010;
        /// 组可写
        const G_WRITE = 0o0020;
        /// 组可读
        const G_READ  = 0o0040;
        /// 所有者可执行
        const U_EXEC  = 0o0100;
        /// 所有者可写
        const U_WRITE = 0o0200;
        /// 所有者可读
        const U_READ  = 0o0400;
        /// Sticky 位
        const STICKY  = 0o1000;
        /// Set group ID
        const SET_GID = 0o2000;
        /// Set user ID
        const SET_UID = 0o4000;
    }
}

impl FileMode {
    /// rw-r--r--
    pub const FILE_DEFAULT: Self = Self::from_bits_truncate(0o644);
    /// rwxr-xr-x
    pub const DIR_DEFAULT: Self = Self::from_bits_truncate(0o755);
    /// rwxrwxrwx
    pub const SYMLINK_DEFAULT: Self = Self::from_bits_truncate(0o777);
}

/// 文件系统配置
///
/// 只影响新建的 inode，已有 inode 保持原样。
#[derive(Debug, Clone, Copy)]
pub struct FsConfig {
    /// 新建普通文件的权限
    pub file_mode: FileMode,
    /// 新建目录的权限
    pub dir_mode: FileMode,
    /// 新建符号链接的权限
    pub symlink_mode: FileMode,
    /// 新建 inode 的所有者
    pub uid: u16,
    /// 新建 inode 的所属组
    pub gid: u16,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            file_mode: FileMode::FILE_DEFAULT,
            dir_mode: FileMode::DIR_DEFAULT,
            symlink_mode: FileMode::SYMLINK_DEFAULT,
            uid: 0,
            gid: 0,
        }
    }
}

/// 文件系统统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatFs {
    /// 总 inode 数
    pub inodes_count: u32,
    /// 空闲 inode 数
    pub free_inodes_count: u32,
    /// 总块数
    pub blocks_count: u32,
    /// 空闲块数
    pub free_blocks_count: u32,
    /// 块大小（字节）
    pub block_size: u32,
    /// 目录数
    pub used_dirs_count: u32,
}

/// Inode 类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum InodeType {
    /// 未知类型
    #[default]
    Unknown = 0,
    /// FIFO（命名管道）
    Fifo = 1,
    /// 字符设备
    CharacterDevice = 2,
    /// 目录
    Directory = 3,
    /// 块设备
    BlockDevice = 4,
    /// 普通文件
    RegularFile = 5,
    /// 符号链接
    Symlink = 6,
    /// Socket
    Socket = 7,
}

impl InodeType {
    /// 从 mode 中提取 inode 类型
    pub fn from_mode(mode: u32) -> Self {
        let type_bits = (mode as u16) & EXT2_INODE_MODE_TYPE_MASK;
        match type_bits {
            EXT2_INODE_MODE_FIFO => InodeType::Fifo,
            EXT2_INODE_MODE_CHARDEV => InodeType::CharacterDevice,
            EXT2_INODE_MODE_DIRECTORY => InodeType::Directory,
            EXT2_INODE_MODE_BLOCKDEV => InodeType::BlockDevice,
            EXT2_INODE_MODE_FILE => InodeType::RegularFile,
            EXT2_INODE_MODE_SOFTLINK => InodeType::Symlink,
            EXT2_INODE_MODE_SOCKET => InodeType::Socket,
            _ => InodeType::Unknown,
        }
    }

    /// 转换为 mode 类型位
    pub fn to_mode_bits(self) -> u16 {
        match self {
            InodeType::Fifo => EXT2_INODE_MODE_FIFO,
            InodeType::CharacterDevice => EXT2_INODE_MODE_CHARDEV,
            InodeType::Directory => EXT2_INODE_MODE_DIRECTORY,
            InodeType::BlockDevice => EXT2_INODE_MODE_BLOCKDEV,
            InodeType::RegularFile => EXT2_INODE_MODE_FILE,
            InodeType::Symlink => EXT2_INODE_MODE_SOFTLINK,
            InodeType::Socket => EXT2_INODE_MODE_SOCKET,
            InodeType::Unknown => 0,
        }
    }

    /// 从目录项类型转换
    pub fn from_de_type(de_type: u8) -> Self {
        match de_type {
            EXT2_DE_REG_FILE => InodeType::RegularFile,
            EXT2_DE_DIR => InodeType::Directory,
            EXT2_DE_CHRDEV => InodeType::CharacterDevice,
            EXT2_DE_BLKDEV => InodeType::BlockDevice,
            EXT2_DE_FIFO => InodeType::Fifo,
            EXT2_DE_SOCK => InodeType::Socket,
            EXT2_DE_SYMLINK => InodeType::Symlink,
            _ => InodeType::Unknown,
        }
    }

    /// 转换为目录项类型
    pub fn to_de_type(self) -> u8 {
        match self {
            InodeType::RegularFile => EXT2_DE_REG_FILE,
            InodeType::Directory => EXT2_DE_DIR,
            InodeType::CharacterDevice => EXT2_DE_CHRDEV,
            InodeType::BlockDevice => EXT2_DE_BLKDEV,
            InodeType::Fifo => EXT2_DE_FIFO,
            InodeType::Socket => EXT2_DE_SOCK,
            InodeType::Symlink => EXT2_DE_SYMLINK,
            InodeType::Unknown => EXT2_DE_UNKNOWN,
        }
    }

    /// 检查是否为目录
    pub fn is_dir(self) -> bool {
        self == InodeType::Directory
    }

    /// 检查是否为普通文件
    pub fn is_file(self) -> bool {
        self == InodeType::RegularFile
    }

    /// 检查是否为符号链接
    pub fn is_symlink(self) -> bool {
        self == InodeType::Symlink
    }
}
