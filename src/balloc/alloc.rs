//! 块分配功能

use crate::{
    bitmap::{find_free, set_bitmap, BitmapKind},
    block::Image,
    error::Result,
};

/// 分配一个数据块
///
/// # 参数
///
/// * `image` - 镜像句柄
///
/// # 返回
///
/// 成功返回分配的块号，块内容已清零
///
/// # 错误
///
/// 没有空闲块时返回 `ErrorKind::NoSpace`，镜像不做任何修改
///
/// # 注意
///
/// 此函数不更新 inode 的 blocks 计数，调用者需要自己处理
pub fn alloc_block<B: AsRef<[u8]> + AsMut<[u8]>>(image: &mut Image<B>) -> Result<u32> {
    let block = find_free(image, BitmapKind::Block)?;
    set_bitmap(image, BitmapKind::Block, block, true)?;
    image.zero_block(block)?;

    log::debug!("[balloc] allocated block {}", block);
    Ok(block)
}
