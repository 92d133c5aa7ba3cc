//! 物理块分配模块
//!
//! 单块组镜像上的块分配与释放。分配总是选取编号最小的空闲块，
//! 并在交给调用者之前清零。

mod alloc;
mod free;

pub use self::alloc::*;
pub use self::free::*;
