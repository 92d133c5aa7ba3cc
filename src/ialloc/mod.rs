//! Inode 分配和释放模块
//!
//! 从第一个非保留 inode 开始搜索空闲位。目录 inode 的分配和释放
//! 同时维护块组描述符中的 `used_dirs_count`。

mod alloc;
mod free;

pub use self::alloc::*;
pub use self::free::*;
