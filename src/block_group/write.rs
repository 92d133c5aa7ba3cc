//! 块组描述符写回和计数修改

use crate::{
    block::Image,
    error::{Error, ErrorKind, Result},
    types::ext2_group_desc,
};

use super::{get_block_group_desc_offset, BlockGroup};

impl BlockGroup {
    /// 将块组描述符写回镜像
    pub fn write<B: AsRef<[u8]> + AsMut<[u8]>>(&self, image: &mut Image<B>) -> Result<()> {
        let offset = get_block_group_desc_offset(image);
        let raw = image.bytes_mut(offset, ext2_group_desc::ENCODED_LEN)?;
        self.inner.write_to(raw);
        Ok(())
    }

    /// 设置空闲块数
    pub fn set_free_blocks_count(&mut self, count: u16) {
        self.inner.free_blocks_count = count;
    }

    /// 设置空闲 inode 数
    pub fn set_free_inodes_count(&mut self, count: u16) {
        self.inner.free_inodes_count = count;
    }

    /// 空闲块数减一，已为 0 时返回 `NoSpace`
    pub fn dec_free_blocks(&mut self) -> Result<()> {
        self.inner.free_blocks_count = self
            .inner
            .free_blocks_count
            .checked_sub(1)
            .ok_or(Error::new(ErrorKind::NoSpace, "Block group reports no free blocks"))?;
        Ok(())
    }

    /// 空闲块数加一
    pub fn inc_free_blocks(&mut self) {
        self.inner.free_blocks_count = self.inner.free_blocks_count.saturating_add(1);
    }

    /// 空闲 inode 数减一，已为 0 时返回 `NoSpace`
    pub fn dec_free_inodes(&mut self) -> Result<()> {
        self.inner.free_inodes_count = self
            .inner
            .free_inodes_count
            .checked_sub(1)
            .ok_or(Error::new(ErrorKind::NoSpace, "Block group reports no free inodes"))?;
        Ok(())
    }

    /// 空闲 inode 数加一
    pub fn inc_free_inodes(&mut self) {
        self.inner.free_inodes_count = self.inner.free_inodes_count.saturating_add(1);
    }

    /// 目录数加一
    pub fn inc_used_dirs(&mut self) {
        self.inner.used_dirs_count = self.inner.used_dirs_count.saturating_add(1);
    }

    /// 目录数减一
    pub fn dec_used_dirs(&mut self) {
        if self.inner.used_dirs_count == 0 {
            log::warn!("[block_group] used_dirs_count already 0");
            return;
        }
        self.inner.used_dirs_count -= 1;
    }
}
