//! Inode 写回和字段更新

use crate::{
    block::Image,
    consts::*,
    error::Result,
    types::ext2_inode,
};

use super::{inode_offset, Inode};

impl Inode {
    /// 写回镜像
    pub fn write<B: AsRef<[u8]> + AsMut<[u8]>>(&self, image: &mut Image<B>) -> Result<()> {
        let offset = inode_offset(image, self.inode_num)?;
        let raw = image.bytes_mut(offset, ext2_inode::ENCODED_LEN)?;
        self.inner.write_to(raw);
        Ok(())
    }

    /// 将 inode 清零（分配新 inode 时使用，避免沿用上一个主人的字段）
    pub fn reset(&mut self) {
        self.inner = ext2_inode::default();
    }

    /// 设置文件类型和权限
    pub fn set_mode(&mut self, type_bits: u16, perm: u16) {
        self.inner.mode = (type_bits & EXT2_INODE_MODE_TYPE_MASK) | (perm & EXT2_INODE_MODE_PERM_MASK);
    }

    /// 设置所有者
    pub fn set_owner(&mut self, uid: u16, gid: u16) {
        self.inner.uid = uid;
        self.inner.gid = gid;
    }

    /// 设置文件大小
    pub fn set_size(&mut self, size: u32) {
        self.inner.size = size;
    }

    /// 设置链接计数
    pub fn set_links_count(&mut self, count: u16) {
        self.inner.links_count = count;
    }

    /// 链接计数加一
    pub fn inc_links(&mut self) {
        self.inner.links_count = self.inner.links_count.saturating_add(1);
    }

    /// 链接计数减一，返回新的计数
    pub fn dec_links(&mut self) -> u16 {
        self.inner.links_count = self.inner.links_count.saturating_sub(1);
        self.inner.links_count
    }

    /// 设置扇区数
    pub fn set_sectors(&mut self, sectors: u32) {
        self.inner.blocks = sectors;
    }

    /// 设置块指针
    pub fn set_block_ptr(&mut self, index: usize, block: u32) {
        if let Some(slot) = self.inner.block.get_mut(index) {
            *slot = block;
        }
    }

    /// 清空全部 15 个块指针
    pub fn clear_block_ptrs(&mut self) {
        self.inner.block = [0; EXT2_INODE_BLOCKS];
    }

    /// 设置访问、创建、修改三个时间戳
    pub fn touch(&mut self, now: u32) {
        self.inner.atime = now;
        self.inner.ctime = now;
        self.inner.mtime = now;
    }

    /// 设置修改时间
    pub fn set_mtime(&mut self, now: u32) {
        self.inner.mtime = now;
    }

    /// 设置删除时间
    pub fn set_dtime(&mut self, time: u32) {
        self.inner.dtime = time;
    }
}
