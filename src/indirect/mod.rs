//! 间接块寻址（传统 ext2 块映射）
//!
//! inode 的 15 个块指针中只使用前 12 个直接指针和 1 个一级间接指针，
//! 单个 inode 最多拥有 `12 + block_size / 4` 个数据块。

mod mapper;

pub use mapper::IndirectBlockMapper;
