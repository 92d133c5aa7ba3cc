//! 以资源编号为单位的位图操作

use crate::{
    block::{Image, ImageLayout},
    block_group::BlockGroup,
    error::{Error, ErrorKind, Result},
    superblock::Superblock,
};

use super::ops::{assign_bit, find_first_zero, test_bit};

/// 位图种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapKind {
    /// 块位图
    Block,
    /// inode 位图
    Inode,
}

impl BitmapKind {
    fn bitmap_block(self, layout: &ImageLayout) -> u32 {
        match self {
            BitmapKind::Block => layout.block_bitmap,
            BitmapKind::Inode => layout.inode_bitmap,
        }
    }

    /// 有效位数
    fn limit(self, layout: &ImageLayout) -> u32 {
        match self {
            BitmapKind::Block => layout.block_bits(),
            BitmapKind::Inode => layout.inodes_count,
        }
    }

    /// 搜索起点：块从第 0 位开始，inode 跳过保留的低编号
    fn search_start(self, layout: &ImageLayout) -> u32 {
        match self {
            BitmapKind::Block => 0,
            BitmapKind::Inode => layout.first_ino.saturating_sub(1),
        }
    }

    fn to_bit(self, layout: &ImageLayout, number: u32) -> Result<u32> {
        let bit = match self {
            BitmapKind::Block => number.checked_sub(layout.first_data_block),
            BitmapKind::Inode => number.checked_sub(1),
        };
        match bit {
            Some(bit) if bit < self.limit(layout) => Ok(bit),
            _ => Err(Error::new(
                ErrorKind::InvalidInput,
                "Resource number outside bitmap",
            )),
        }
    }

    fn to_number(self, layout: &ImageLayout, bit: u32) -> u32 {
        match self {
            BitmapKind::Block => bit + layout.first_data_block,
            BitmapKind::Inode => bit + 1,
        }
    }
}

/// 查找第一个空闲资源
///
/// # 返回
///
/// 空闲的块号或 inode 号；位图已满返回 `NoSpace`
pub fn find_free<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>, kind: BitmapKind) -> Result<u32> {
    let layout = *image.layout();
    let bitmap = image.block(kind.bitmap_block(&layout))?;

    match find_first_zero(bitmap, kind.search_start(&layout), kind.limit(&layout)) {
        Some(bit) => Ok(kind.to_number(&layout, bit)),
        None => Err(match kind {
            BitmapKind::Block => Error::new(ErrorKind::NoSpace, "No free blocks available"),
            BitmapKind::Inode => Error::new(ErrorKind::NoSpace, "No free inodes available"),
        }),
    }
}

/// 查询资源是否已被占用
pub fn is_used<B: AsRef<[u8]> + AsMut<[u8]>>(
    image: &Image<B>,
    kind: BitmapKind,
    number: u32,
) -> Result<bool> {
    let layout = *image.layout();
    let bit = kind.to_bit(&layout, number)?;
    Ok(test_bit(image.block(kind.bitmap_block(&layout))?, bit))
}

/// 将资源标记为已用/空闲
///
/// 只有位的状态真正变化时才会修改位图，并同时更新块组描述符和
/// superblock 中对应的空闲计数。
///
/// # 返回
///
/// 位发生翻转返回 `true`
///
/// # 错误
///
/// 标记为已用时若空闲计数已经为 0，返回 `NoSpace`，位图和计数都不做修改
pub fn set_bitmap<B: AsRef<[u8]> + AsMut<[u8]>>(
    image: &mut Image<B>,
    kind: BitmapKind,
    number: u32,
    used: bool,
) -> Result<bool> {
    let layout = *image.layout();
    let bit = kind.to_bit(&layout, number)?;
    let bitmap_block = kind.bitmap_block(&layout);

    if test_bit(image.block(bitmap_block)?, bit) == used {
        log::warn!(
            "[bitmap] {:?} {} already {}",
            kind,
            number,
            if used { "used" } else { "free" }
        );
        return Ok(false);
    }

    let mut sb = Superblock::load(image)?;
    let mut bg = BlockGroup::load(image)?;

    match (kind, used) {
        (BitmapKind::Block, true) => {
            bg.dec_free_blocks()?;
            sb.dec_free_blocks()?;
        }
        (BitmapKind::Block, false) => {
            bg.inc_free_blocks();
            sb.inc_free_blocks();
        }
        (BitmapKind::Inode, true) => {
            bg.dec_free_inodes()?;
            sb.dec_free_inodes()?;
        }
        (BitmapKind::Inode, false) => {
            bg.inc_free_inodes();
            sb.inc_free_inodes();
        }
    }

    assign_bit(image.block_mut(bitmap_block)?, bit, used)?;
    bg.write(image)?;
    sb.write(image)?;

    log::debug!(
        "[bitmap] {:?} {} -> {} (bit {})",
        kind,
        number,
        if used { "used" } else { "free" },
        bit
    );

    Ok(true)
}
