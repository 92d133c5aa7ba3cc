//! 块组操作模块
//!
//! 这个模块提供 ext2 块组描述符的读取、写回和计数更新功能。
//! 本库只支持单块组镜像，描述符固定位于 `first_data_block + 1` 块的开头。

mod read;
mod write;

pub use read::*;
