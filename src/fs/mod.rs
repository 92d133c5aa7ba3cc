//! 文件系统高级 API
//!
//! 这个模块在镜像上提供完整的路径级操作：复制写入、硬链接和符号链接、
//! 删除（可递归）、列目录、创建目录，以及读取内容和元数据。

mod filesystem;
mod metadata;
mod types;

#[cfg(test)]
mod tests;

pub use filesystem::Ext2FileSystem;
pub use metadata::{FileMetadata, FileType};
#[cfg(feature = "std")]
pub use types::StdHal;
pub use types::{FileMode, FsConfig, InodeType, NoClockHal, StatFs, SystemHal};
