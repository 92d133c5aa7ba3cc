//! Inode 分配功能

use crate::{
    bitmap::{find_free, set_bitmap, BitmapKind},
    block::Image,
    block_group::BlockGroup,
    error::Result,
    inode::Inode,
    types::ext2_inode,
};

/// 分配一个 inode
///
/// # 参数
///
/// * `image` - 镜像句柄
/// * `is_dir` - 是否是目录
///
/// # 返回
///
/// 成功返回分配的 inode 编号。inode 记录已清零，
/// 调用者负责设置 mode、链接数和时间戳。
pub fn alloc_inode<B: AsRef<[u8]> + AsMut<[u8]>>(image: &mut Image<B>, is_dir: bool) -> Result<u32> {
    let inode_num = find_free(image, BitmapKind::Inode)?;
    set_bitmap(image, BitmapKind::Inode, inode_num, true)?;

    if is_dir {
        let mut bg = BlockGroup::load(image)?;
        bg.inc_used_dirs();
        bg.write(image)?;
    }

    Inode::from_raw(ext2_inode::default(), inode_num).write(image)?;

    log::debug!("[ialloc] allocated inode {} (dir={})", inode_num, is_dir);
    Ok(inode_num)
}
