//! 目录操作模块
//!
//! 这个模块提供 ext2 线性目录的编解码、遍历、修改和路径查找功能。
//!
//! ## 模块结构
//!
//! - `entry` - 目录项结构和长度计算
//! - `iterator` - 目录迭代器和通用遍历函数 `walk`
//! - `lookup` - 目录内按名称查找
//! - `write` - 目录写操作（添加/删除条目）
//! - `path_lookup` - 路径查找

pub mod entry;
pub mod iterator;
pub mod lookup;
pub mod path_lookup;
pub mod write;

pub use entry::{padded_size, DirEntry, DirRecord};
pub use iterator::{read_dir, walk, DirIterator};
pub use lookup::{find, find_record};
pub use path_lookup::{basename, entry_is_dir, navigate, parent_of, resolve};
pub use write::{insert, insert_with_inode, remove};
