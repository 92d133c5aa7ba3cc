//! 镜像访问抽象
//!
//! 整个文件系统位于一块已映射的字节缓冲区中（"镜像"）。
//! block/image.rs 提供镜像句柄 [`Image`]：打开时校验布局，
//! 之后所有块和字节区间的访问都做边界检查，越界返回 `Corrupted`。
//!
//! 镜像本身就是唯一的数据源，没有块缓存，也没有写回步骤。

mod image;

pub use image::{Image, ImageLayout};
