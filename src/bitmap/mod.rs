//! 位图分配器
//!
//! - `ops` - 纯位操作（测试、设置、查找空闲位、计数）
//! - `resource` - 以块号/inode 号为单位的分配接口，
//!   每次翻转位都同步更新块组描述符和 superblock 中的空闲计数
//!
//! ## 编号约定
//!
//! 块位图第 i 位对应块 `first_data_block + i`；
//! inode 位图第 i 位对应 inode `i + 1`。
//! 只有 `resource` 模块做这一换算。

pub mod ops;
mod resource;

pub use ops::{assign_bit, count_ones, find_first_zero, test_bit};
pub use resource::{find_free, is_used, set_bitmap, BitmapKind};
