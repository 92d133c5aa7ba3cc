//! Superblock 操作模块
//!
//! 这个模块提供 ext2 superblock 的读取、写回和计数更新功能。

mod read;
mod write;

pub use read::*;
