//! 位图基础操作
//!
//! 位图中每一位对应一个资源（块或 inode），1 表示已使用。
//! 位 `index` 位于字节 `index / 8` 的第 `index % 8` 位（低位在前）。

use crate::error::{Error, ErrorKind, Result};

/// 测试位图中某一位是否被设置
///
/// 越界的位视为未设置
pub fn test_bit(bitmap: &[u8], index: u32) -> bool {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    match bitmap.get(byte_index) {
        Some(byte) => (byte & (1 << bit_offset)) != 0,
        None => false,
    }
}

/// 将位图中的某一位设为指定状态
///
/// # 返回
///
/// 位发生了变化返回 `true`，原本就是目标状态返回 `false`；
/// 索引超出位图范围返回 `InvalidInput`
pub fn assign_bit(bitmap: &mut [u8], index: u32, used: bool) -> Result<bool> {
    let byte_index = (index / 8) as usize;
    let mask = 1u8 << (index % 8);

    let byte = bitmap.get_mut(byte_index).ok_or(Error::new(
        ErrorKind::InvalidInput,
        "Bitmap index out of range",
    ))?;

    let was_used = (*byte & mask) != 0;
    if was_used == used {
        return Ok(false);
    }

    if used {
        *byte |= mask;
    } else {
        *byte &= !mask;
    }
    Ok(true)
}

/// 在 `[start, end)` 中查找第一个空闲位（值为 0 的位）
///
/// `end` 会被截断到位图的实际长度
pub fn find_first_zero(bitmap: &[u8], start: u32, end: u32) -> Option<u32> {
    let max_bits = (bitmap.len() * 8) as u32;
    let end = end.min(max_bits);

    let mut i = start;
    while i < end {
        // 整字节都被占用时直接跳到下一个字节
        if i % 8 == 0 && i + 8 <= end && bitmap[(i / 8) as usize] == 0xFF {
            i += 8;
            continue;
        }
        if !test_bit(bitmap, i) {
            return Some(i);
        }
        i += 1;
    }

    None
}

/// 统计 `[start, end)` 中被设置的位数
pub fn count_ones(bitmap: &[u8], start: u32, end: u32) -> u32 {
    let max_bits = (bitmap.len() * 8) as u32;
    let end = end.min(max_bits);

    (start..end).filter(|&i| test_bit(bitmap, i)).count() as u32
}
