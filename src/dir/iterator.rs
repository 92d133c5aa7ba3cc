//! 目录迭代器
//!
//! 按块顺序、块内按偏移顺序惰性遍历目录的全部目录项（包括 inode 为 0
//! 的已删除项）。每次创建时重新计算目录的块列表，因此可以在任意修改
//! 之后重新开始，但不能在修改过程中继续使用旧的迭代器。
//!
//! ## 格式检查
//!
//! 每读取一项都检查：头部完整位于块内、`rec_len` 至少 8 且 4 字节对齐、
//! 不越过块尾、`name_len` 不超过 `rec_len - 8`。任何一项不满足都返回
//! `Corrupted` 并结束迭代。

use alloc::vec::Vec;

use crate::{
    block::Image,
    consts::*,
    error::{Error, ErrorKind, Result},
    indirect::IndirectBlockMapper,
    inode::Inode,
    types::ext2_dir_entry,
};

use super::entry::{DirEntry, DirRecord};

/// 目录迭代器
///
/// 只借用镜像，产出 `Result<DirRecord>`。
pub struct DirIterator<'a, B> {
    image: &'a Image<B>,
    blocks: Vec<u32>,
    /// 当前块在 `blocks` 中的下标
    block_idx: usize,
    /// 当前块内的偏移
    offset: usize,
    prev_offset: Option<usize>,
    done: bool,
}

impl<'a, B: AsRef<[u8]> + AsMut<[u8]>> DirIterator<'a, B> {
    /// 创建新的目录迭代器
    ///
    /// # 参数
    ///
    /// * `image` - 镜像句柄
    /// * `dir` - 目录 inode
    pub fn new(image: &'a Image<B>, dir: &Inode) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::new(
                ErrorKind::NotADirectory,
                "Inode is not a directory",
            ));
        }

        let blocks = IndirectBlockMapper::new(image.layout()).blocks_of(image, dir)?;

        Ok(Self {
            image,
            blocks,
            block_idx: 0,
            offset: 0,
            prev_offset: None,
            done: false,
        })
    }

    /// 读取当前位置的目录项
    fn read_current(&self) -> Result<DirRecord> {
        let block_size = self.image.block_size() as usize;
        let block = self.blocks[self.block_idx];
        let data = self.image.block(block)?;

        if self.offset + EXT2_DIR_ENTRY_HEADER_LEN > block_size {
            return Err(corrupted(block, self.offset, "Directory entry header extends beyond block"));
        }

        let header = ext2_dir_entry::parse(&data[self.offset..]);
        let rec_len = header.rec_len as usize;

        if rec_len < EXT2_DIR_ENTRY_HEADER_LEN || rec_len % EXT2_DIR_ENTRY_ALIGN != 0 {
            return Err(corrupted(block, self.offset, "Directory entry rec_len invalid"));
        }
        if self.offset + rec_len > block_size {
            return Err(corrupted(block, self.offset, "Directory entry rec_len extends beyond block"));
        }

        let name_len = header.name_len as usize;
        if name_len > rec_len - EXT2_DIR_ENTRY_HEADER_LEN {
            return Err(corrupted(block, self.offset, "Directory entry name_len too large"));
        }

        let name_start = self.offset + EXT2_DIR_ENTRY_HEADER_LEN;
        let name = data[name_start..name_start + name_len].to_vec();

        Ok(DirRecord {
            logical_block: self.block_idx as u32,
            block,
            offset: self.offset,
            prev_offset: self.prev_offset,
            header,
            name,
        })
    }
}

fn corrupted(block: u32, offset: usize, message: &'static str) -> Error {
    log::error!("[dir] block {} offset {}: {}", block, offset, message);
    Error::new(ErrorKind::Corrupted, message)
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Iterator for DirIterator<'_, B> {
    type Item = Result<DirRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let block_size = self.image.block_size() as usize;
        if self.offset >= block_size {
            self.block_idx += 1;
            self.offset = 0;
            self.prev_offset = None;
        }
        if self.block_idx >= self.blocks.len() {
            self.done = true;
            return None;
        }

        match self.read_current() {
            Ok(record) => {
                log::trace!(
                    "[dir] block {} offset {} inode {} rec_len {}",
                    record.block,
                    record.offset,
                    record.header.inode,
                    record.header.rec_len
                );
                self.prev_offset = Some(self.offset);
                self.offset += record.header.rec_len as usize;
                Some(Ok(record))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// 遍历目录，返回第一个让 `visit` 返回 `true` 的目录项
///
/// 所有目录搜索都建立在这个函数之上。没有匹配项时返回 `Ok(None)`。
pub fn walk<B, F>(image: &Image<B>, dir: &Inode, mut visit: F) -> Result<Option<DirRecord>>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    F: FnMut(&DirRecord) -> bool,
{
    for record in DirIterator::new(image, dir)? {
        let record = record?;
        if visit(&record) {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

/// 便捷函数：读取目录中的所有有效条目（跳过已删除项）
///
/// # 参数
///
/// * `image` - 镜像句柄
/// * `dir` - 目录 inode
///
/// # 返回
///
/// 目录项列表，按磁盘顺序
pub fn read_dir<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>, dir: &Inode) -> Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for record in DirIterator::new(image, dir)? {
        let record = record?;
        if record.is_live() {
            entries.push(record.to_entry());
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkfs::{self, MkfsOptions};
    use alloc::vec;

    fn fresh() -> Image<Vec<u8>> {
        let mut buf = vec![0u8; 128 * 1024];
        mkfs::format(&mut buf, &MkfsOptions::default()).unwrap();
        Image::open(buf).unwrap()
    }

    #[test]
    fn test_root_listing() {
        let image = fresh();
        let root = Inode::load(&image, EXT2_ROOT_INODE).unwrap();
        let names: Vec<_> = read_dir(&image, &root)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec![".", "..", "lost+found"]);
    }

    #[test]
    fn test_rec_len_spans_block() {
        let image = fresh();
        let root = Inode::load(&image, EXT2_ROOT_INODE).unwrap();
        let total: usize = DirIterator::new(&image, &root)
            .unwrap()
            .map(|r| r.unwrap().header.rec_len as usize)
            .sum();
        assert_eq!(total, 1024);
    }

    #[test]
    fn test_prev_offset_chain() {
        let image = fresh();
        let root = Inode::load(&image, EXT2_ROOT_INODE).unwrap();
        let records: Vec<_> = DirIterator::new(&image, &root)
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(records[0].prev_offset, None);
        assert_eq!(records[1].prev_offset, Some(0));
        assert_eq!(records[2].prev_offset, Some(records[1].offset));
    }

    #[test]
    fn test_walk_stops_at_match() {
        let image = fresh();
        let root = Inode::load(&image, EXT2_ROOT_INODE).unwrap();
        let hit = walk(&image, &root, |r| r.name == b"..").unwrap().unwrap();
        assert_eq!(hit.header.inode, EXT2_ROOT_INODE);
        assert!(walk(&image, &root, |_| false).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_rec_len_is_reported() {
        let mut image = fresh();
        let root = Inode::load(&image, EXT2_ROOT_INODE).unwrap();
        let block = root.block_ptr(0).unwrap();
        // "." 的 rec_len 改成 6
        image.block_mut(block).unwrap()[4] = 6;

        let mut iter = DirIterator::new(&image, &root).unwrap();
        assert_eq!(iter.next().unwrap().unwrap_err().kind(), ErrorKind::Corrupted);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_regular_file_is_not_iterable() {
        let image = fresh();
        let mut inode = Inode::load(&image, 12).unwrap();
        inode.set_mode(EXT2_INODE_MODE_FILE, 0o644);
        assert_eq!(
            DirIterator::new(&image, &inode).err().unwrap().kind(),
            ErrorKind::NotADirectory
        );
    }
}
