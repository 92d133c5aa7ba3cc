//! 错误类型定义
//!
//! 提供 ext2 镜像操作的错误类型，以及到 POSIX errno 的映射
//! （命令行调用方据此决定进程退出码）。

use core::fmt;

use crate::consts::*;

/// ext2 操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 路径组件、源文件或目标目录不存在
    NotFound,
    /// 目标名称已存在
    AlreadyExists,
    /// 对目录执行了只适用于文件的操作
    IsADirectory,
    /// 需要目录的位置出现了非目录
    NotADirectory,
    /// 位图中没有空闲位，或间接块已满
    NoSpace,
    /// 无效参数（路径格式错误、删除根目录等）
    InvalidInput,
    /// 镜像损坏（越界偏移、非法 rec_len 等）
    Corrupted,
    /// 不支持的镜像特性（多块组、非法块大小）
    Unsupported,
}

impl ErrorKind {
    /// 对应的 POSIX errno
    pub const fn errno(self) -> i32 {
        match self {
            ErrorKind::NotFound => ENOENT,
            ErrorKind::AlreadyExists => EEXIST,
            ErrorKind::IsADirectory => EISDIR,
            ErrorKind::NotADirectory => ENOTDIR,
            ErrorKind::NoSpace => ENOSPC,
            ErrorKind::InvalidInput => EINVAL,
            ErrorKind::Corrupted => EIO,
            ErrorKind::Unsupported => ENOTSUP,
        }
    }
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// 获取 errno
    pub const fn errno(&self) -> i32 {
        self.kind.errno()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
