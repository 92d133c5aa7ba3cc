//! 块释放功能

use crate::{
    bitmap::{set_bitmap, BitmapKind},
    block::Image,
    error::Result,
};

/// 释放单个块
///
/// 重复释放同一块只记录警告，不会让空闲计数虚增。
///
/// # 注意
///
/// 此函数不更新 inode 的 blocks 计数，调用者需要自己处理
pub fn free_block<B: AsRef<[u8]> + AsMut<[u8]>>(image: &mut Image<B>, block: u32) -> Result<()> {
    if set_bitmap(image, BitmapKind::Block, block, false)? {
        log::debug!("[balloc] freed block {}", block);
    }
    Ok(())
}
