//! Superblock 写回和计数更新

use crate::{
    block::Image,
    consts::*,
    error::{Error, ErrorKind, Result},
    types::ext2_sblock,
};

use super::Superblock;

impl Superblock {
    /// 将 superblock 写回镜像
    pub fn write<B: AsRef<[u8]> + AsMut<[u8]>>(&self, image: &mut Image<B>) -> Result<()> {
        let raw = image.bytes_mut(EXT2_SUPERBLOCK_OFFSET, ext2_sblock::ENCODED_LEN)?;
        self.inner.write_to(raw);
        Ok(())
    }

    /// 设置空闲块数
    pub fn set_free_blocks_count(&mut self, count: u32) {
        self.inner.free_blocks_count = count;
    }

    /// 设置空闲 inode 数
    pub fn set_free_inodes_count(&mut self, count: u32) {
        self.inner.free_inodes_count = count;
    }

    /// 设置最后写入时间
    pub fn set_wtime(&mut self, wtime: u32) {
        self.inner.wtime = wtime;
    }

    /// 空闲块数减一
    ///
    /// 计数已经为 0 时说明资源耗尽，返回 `NoSpace`
    pub fn dec_free_blocks(&mut self) -> Result<()> {
        self.inner.free_blocks_count = self
            .inner
            .free_blocks_count
            .checked_sub(1)
            .ok_or(Error::new(ErrorKind::NoSpace, "Superblock reports no free blocks"))?;
        Ok(())
    }

    /// 空闲块数加一
    pub fn inc_free_blocks(&mut self) {
        if self.inner.free_blocks_count >= self.inner.blocks_count {
            log::warn!("[superblock] free block count already at total, not incremented");
            return;
        }
        self.inner.free_blocks_count += 1;
    }

    /// 空闲 inode 数减一
    pub fn dec_free_inodes(&mut self) -> Result<()> {
        self.inner.free_inodes_count = self
            .inner
            .free_inodes_count
            .checked_sub(1)
            .ok_or(Error::new(ErrorKind::NoSpace, "Superblock reports no free inodes"))?;
        Ok(())
    }

    /// 空闲 inode 数加一
    pub fn inc_free_inodes(&mut self) {
        if self.inner.free_inodes_count >= self.inner.inodes_count {
            log::warn!("[superblock] free inode count already at total, not incremented");
            return;
        }
        self.inner.free_inodes_count += 1;
    }
}
