//! Inode 释放功能

use crate::{
    bitmap::{set_bitmap, BitmapKind},
    block::Image,
    block_group::BlockGroup,
    error::Result,
};

/// 释放一个 inode
///
/// 只清除位图中的位并更新计数，inode 记录本身由调用者处理
/// （设置 dtime、清零链接数等）。
///
/// # 参数
///
/// * `image` - 镜像句柄
/// * `inode_num` - 要释放的 inode 编号
/// * `is_dir` - 是否是目录
pub fn free_inode<B: AsRef<[u8]> + AsMut<[u8]>>(
    image: &mut Image<B>,
    inode_num: u32,
    is_dir: bool,
) -> Result<()> {
    if !set_bitmap(image, BitmapKind::Inode, inode_num, false)? {
        return Ok(());
    }

    if is_dir {
        let mut bg = BlockGroup::load(image)?;
        bg.dec_used_dirs();
        bg.write(image)?;
    }

    log::debug!("[ialloc] freed inode {} (dir={})", inode_num, is_dir);
    Ok(())
}
