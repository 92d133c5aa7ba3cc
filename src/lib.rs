//! ext2img_core: 在内存镜像上直接操作 ext2 文件系统
//!
//! 这是一个纯 Rust 实现的 ext2 元数据引擎，旨在提供：
//! - **零 unsafe 代码**，磁盘结构按小端序显式编解码
//! - **Rust 惯用风格**的 API
//! - 所有镜像访问都做**边界检查**，损坏的镜像返回错误而不是崩溃
//!
//! 镜像由调用者提供（`Vec<u8>`、`&mut [u8]` 或可写的内存映射），
//! 本库不负责打开文件，也不做块缓存。
//!
//! # 示例
//!
//! ```rust,ignore
//! use ext2img_core::{Ext2FileSystem, mkfs::{self, MkfsOptions}, Result};
//!
//! fn main() -> Result<()> {
//!     let mut buf = vec![0u8; 128 * 1024];
//!     mkfs::format(&mut buf, &MkfsOptions::default())?;
//!
//!     let mut fs = Ext2FileSystem::open(buf)?;
//!     fs.mkdir("/a")?;
//!     fs.copy_in("hello.txt", b"hello", "/a")?;
//!     assert_eq!(fs.read_file("/a/hello.txt")?, b"hello");
//!
//!     Ok(())
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`block`] - 镜像句柄和带边界检查的块访问
//! - [`consts`] - 常量定义
//! - [`types`] - 磁盘数据结构
//! - [`superblock`] / [`block_group`] / [`inode`] - 元数据读写
//! - [`bitmap`] / [`balloc`] / [`ialloc`] - 位图分配器
//! - [`indirect`] - 直接块和一级间接块映射
//! - [`dir`] - 目录项编解码和路径查找
//! - [`fs`] - 路径级操作
//! - [`mkfs`] - 格式化
//! - [`check`] - 一致性检查

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 镜像访问
pub mod block;

/// 常量定义
pub mod consts;

/// 数据结构定义
pub mod types;

/// Superblock 操作
pub mod superblock;

/// Inode 操作
pub mod inode;

/// 块组操作
pub mod block_group;

/// Indirect blocks 操作（传统 ext2 间接块寻址）
pub mod indirect;

/// 目录操作
pub mod dir;

/// 文件系统高级 API
pub mod fs;

/// 位图操作
pub mod bitmap;

/// Inode 分配
pub mod ialloc;

/// 块分配
pub mod balloc;

/// 镜像格式化
pub mod mkfs;

/// 一致性检查
pub mod check;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 镜像
pub use block::{Image, ImageLayout};

// Superblock
pub use superblock::{read_superblock, Superblock};

// Inode
pub use inode::{read_inode, Inode};

// BlockGroup
pub use block_group::{read_block_group_desc, BlockGroup};

// Indirect blocks
pub use indirect::IndirectBlockMapper;

// Dir
pub use dir::{basename, navigate, parent_of, read_dir, DirEntry, DirIterator};

// FileSystem
pub use fs::{
    Ext2FileSystem, FileMetadata, FileMode, FileType, FsConfig, InodeType, NoClockHal, StatFs,
    SystemHal,
};

#[cfg(feature = "std")]
pub use fs::StdHal;

// Check
pub use check::{check_image, CheckProblem, CheckReport};

// Mkfs
pub use mkfs::MkfsOptions;
