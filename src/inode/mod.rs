//! Inode 操作模块
//!
//! 这个模块提供 ext2 inode 的读取、写回和字段更新功能。
//! inode 编号从 1 开始，inode N 位于 inode 表的第 N-1 个槽位。

mod read;
mod write;

pub use read::*;
