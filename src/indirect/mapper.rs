//! 间接块映射器实现
//!
//! 维护 inode 拥有的数据块列表：查询、追加一块、整体释放、
//! 以及删除中间某一块后压缩指针。

use alloc::vec::Vec;
use byteorder::{ByteOrder, LittleEndian};

use crate::{
    balloc::{alloc_block, free_block},
    block::{Image, ImageLayout},
    consts::{EXT2_INODE_DIRECT_BLOCKS, EXT2_INODE_INDIRECT_BLOCK},
    error::{Error, ErrorKind, Result},
    inode::Inode,
};

/// 间接块映射器
///
/// 只保存由块大小推出的几个常量，可以随时按镜像布局重新构造。
/// 所有修改 inode 的方法只改内存中的 [`Inode`]，由调用者写回。
#[derive(Debug, Clone, Copy)]
pub struct IndirectBlockMapper {
    /// 每个间接块可以容纳的指针数量 (block_size / 4)
    blocks_per_indirect: u32,
    /// 每块对应的 512 字节扇区数
    sectors_per_block: u32,
}

impl IndirectBlockMapper {
    /// 创建新的间接块映射器
    pub fn new(layout: &ImageLayout) -> Self {
        Self {
            blocks_per_indirect: layout.pointers_per_block(),
            sectors_per_block: layout.sectors_per_block(),
        }
    }

    /// 单个 inode 最多可拥有的数据块数
    pub fn max_data_blocks(&self) -> u32 {
        EXT2_INODE_DIRECT_BLOCKS as u32 + self.blocks_per_indirect
    }

    /// 根据 inode 记录的扇区数推算数据块个数
    ///
    /// 扇区数包含间接块本身，因此总块数超过 12 时要减去 1。
    ///
    /// # 错误
    ///
    /// 扇区数超出一级间接所能表示的范围，或者需要间接块却没有时，
    /// 返回 `ErrorKind::Corrupted`
    pub fn data_block_count(&self, inode: &Inode) -> Result<u32> {
        let total = inode.sectors() / self.sectors_per_block;
        let direct = EXT2_INODE_DIRECT_BLOCKS as u32;

        if total <= direct {
            return Ok(total);
        }

        let data = total - 1;
        if data <= direct || data > self.max_data_blocks() || inode.indirect_block() == 0 {
            log::error!(
                "[indirect] inode {} has inconsistent i_blocks {}",
                inode.inode_num(),
                inode.sectors()
            );
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Inode block count exceeds single indirect range",
            ));
        }
        Ok(data)
    }

    /// 将逻辑块号映射到物理块号
    ///
    /// # 参数
    ///
    /// - `image`: 镜像句柄
    /// - `inode`: inode 包装器
    /// - `logical_block`: 文件内的逻辑块号
    ///
    /// # 返回
    ///
    /// - `Ok(physical_block)`: 对应的物理块号
    /// - `Err(...)`: 逻辑块号越界，或指针为 0
    pub fn map_block<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        image: &Image<B>,
        inode: &Inode,
        logical_block: u32,
    ) -> Result<u32> {
        if logical_block >= self.data_block_count(inode)? {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Logical block beyond end of inode",
            ));
        }

        let physical = if (logical_block as usize) < EXT2_INODE_DIRECT_BLOCKS {
            inode.block_ptr(logical_block as usize).unwrap_or(0)
        } else {
            let index = logical_block - EXT2_INODE_DIRECT_BLOCKS as u32;
            self.read_block_pointer(image, inode.indirect_block(), index)?
        };

        if physical == 0 {
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Counted block pointer is zero",
            ));
        }
        Ok(physical)
    }

    /// inode 当前拥有的全部数据块，按逻辑顺序排列
    ///
    /// 块数来自 inode 的扇区计数，不扫描指针。
    pub fn blocks_of<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        image: &Image<B>,
        inode: &Inode,
    ) -> Result<Vec<u32>> {
        let count = self.data_block_count(inode)?;
        let mut blocks = Vec::with_capacity(count as usize);

        for logical in 0..count {
            blocks.push(self.map_block(image, inode, logical)?);
        }

        log::trace!("[indirect] inode {} owns {:?}", inode.inode_num(), blocks);
        Ok(blocks)
    }

    /// 为 inode 追加一个数据块
    ///
    /// 前 12 块写入直接指针；第 13 块时额外分配并清零一个间接块，
    /// 数据块记录为间接块的第 0 项；之后依次写入间接块的下一个槽位。
    ///
    /// # 返回
    ///
    /// 新分配的数据块号（内容已清零）
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NoSpace` - 间接块已满或没有空闲块
    pub fn grow_by_one_block<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        image: &mut Image<B>,
        inode: &mut Inode,
    ) -> Result<u32> {
        let count = self.data_block_count(inode)?;
        if count >= self.max_data_blocks() {
            return Err(Error::new(
                ErrorKind::NoSpace,
                "Indirect block is full",
            ));
        }

        let direct = EXT2_INODE_DIRECT_BLOCKS as u32;
        let block = if count < direct {
            let block = alloc_block(image)?;
            inode.set_block_ptr(count as usize, block);
            inode.set_sectors(inode.sectors() + self.sectors_per_block);
            block
        } else if count == direct {
            let indirect = alloc_block(image)?;
            let block = match alloc_block(image) {
                Ok(block) => block,
                Err(e) => {
                    free_block(image, indirect)?;
                    return Err(e);
                }
            };
            self.write_block_pointer(image, indirect, 0, block)?;
            inode.set_block_ptr(EXT2_INODE_INDIRECT_BLOCK, indirect);
            inode.set_sectors(inode.sectors() + 2 * self.sectors_per_block);
            log::debug!(
                "[indirect] inode {} now uses indirect block {}",
                inode.inode_num(),
                indirect
            );
            block
        } else {
            let block = alloc_block(image)?;
            self.write_block_pointer(image, inode.indirect_block(), count - direct, block)?;
            inode.set_sectors(inode.sectors() + self.sectors_per_block);
            block
        };

        log::debug!(
            "[indirect] inode {} block #{} -> {}",
            inode.inode_num(),
            count,
            block
        );
        Ok(block)
    }

    /// 释放 inode 的所有数据块和间接块
    ///
    /// 完成后块指针全部清零，扇区数为 0。inode 号本身不在这里释放。
    pub fn release_all_blocks<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        image: &mut Image<B>,
        inode: &mut Inode,
    ) -> Result<()> {
        let blocks = self.blocks_of(image, inode)?;
        for &block in &blocks {
            free_block(image, block)?;
        }

        let indirect = inode.indirect_block();
        if indirect != 0 {
            free_block(image, indirect)?;
        }

        inode.clear_block_ptrs();
        inode.set_sectors(0);

        log::debug!(
            "[indirect] inode {} released {} blocks",
            inode.inode_num(),
            blocks.len()
        );
        Ok(())
    }

    /// 释放第 `logical_block` 个数据块并压缩指针列表
    ///
    /// 后面的块整体前移一位，间接块第 0 项会移入最后一个直接指针。
    /// 间接块变空时一并释放。
    pub fn remove_block_at<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        image: &mut Image<B>,
        inode: &mut Inode,
        logical_block: u32,
    ) -> Result<()> {
        let mut blocks = self.blocks_of(image, inode)?;
        if logical_block as usize >= blocks.len() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Logical block beyond end of inode",
            ));
        }

        let removed = blocks.remove(logical_block as usize);
        free_block(image, removed)?;

        let direct = EXT2_INODE_DIRECT_BLOCKS;
        for slot in 0..direct {
            inode.set_block_ptr(slot, blocks.get(slot).copied().unwrap_or(0));
        }

        let indirect = inode.indirect_block();
        if blocks.len() > direct {
            let tail = &blocks[direct..];
            for (index, &block) in tail.iter().enumerate() {
                self.write_block_pointer(image, indirect, index as u32, block)?;
            }
            // 原来的最后一项已经前移
            self.write_block_pointer(image, indirect, tail.len() as u32, 0)?;
        } else if indirect != 0 {
            free_block(image, indirect)?;
            inode.set_block_ptr(EXT2_INODE_INDIRECT_BLOCK, 0);
        }

        let total = blocks.len() as u32 + u32::from(blocks.len() > direct);
        inode.set_sectors(total * self.sectors_per_block);

        log::debug!(
            "[indirect] inode {} dropped block #{} ({})",
            inode.inode_num(),
            logical_block,
            removed
        );
        Ok(())
    }

    /// 从间接块中读取指定位置的块指针
    fn read_block_pointer<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        image: &Image<B>,
        indirect_block: u32,
        index: u32,
    ) -> Result<u32> {
        if index >= self.blocks_per_indirect {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Index out of bounds in indirect block",
            ));
        }
        let offset = index as usize * 4;
        let data = image.block(indirect_block)?;
        Ok(LittleEndian::read_u32(&data[offset..offset + 4]))
    }

    fn write_block_pointer<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        image: &mut Image<B>,
        indirect_block: u32,
        index: u32,
        value: u32,
    ) -> Result<()> {
        if index >= self.blocks_per_indirect {
            return Err(Error::new(
                ErrorKind::NoSpace,
                "Indirect block is full",
            ));
        }
        let offset = index as usize * 4;
        let data = image.block_mut(indirect_block)?;
        LittleEndian::write_u32(&mut data[offset..offset + 4], value);
        Ok(())
    }
}
