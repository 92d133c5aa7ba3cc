//! 目录写操作
//!
//! 提供目录项的添加、删除等写操作功能
//!
//! ## 功能
//!
//! - 首次适配插入：在第一个剩余空间足够的目录项之后切分 `rec_len`
//! - 复用已删除（inode 为 0）的目录项
//! - 所有块都放不下时为目录追加一个新块
//! - 删除时把空间并入前一项；块内第一项被删除时把下一项前移；
//!   块内不再有有效项时释放整块并压缩块指针
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use ext2img_core::dir::write::*;
//!
//! // 新建目录项并分配 inode
//! let ino = insert(&mut image, &mut dir, "newfile.txt", InodeType::RegularFile)?;
//!
//! // 删除目录项
//! remove(&mut image, &mut dir, b"oldfile.txt")?;
//! ```

use crate::{
    block::Image,
    consts::*,
    error::{Error, ErrorKind, Result},
    fs::InodeType,
    ialloc::{alloc_inode, free_inode},
    indirect::IndirectBlockMapper,
    inode::Inode,
    types::ext2_dir_entry,
};

use super::{
    entry::{padded_size, validate_name, write_entry, DirEntry},
    iterator::walk,
    lookup::find_record,
};

/// 向目录添加新条目并为其分配新 inode
///
/// # 参数
///
/// * `image` - 镜像句柄
/// * `dir` - 目录 inode（块指针和大小可能变化，函数内已写回）
/// * `name` - 条目名称
/// * `inode_type` - 条目类型
///
/// # 返回
///
/// 新分配的 inode 编号（记录已清零，由调用者初始化）
///
/// # 错误
///
/// 插入失败时新分配的 inode 会被释放
pub fn insert<B: AsRef<[u8]> + AsMut<[u8]>>(
    image: &mut Image<B>,
    dir: &mut Inode,
    name: &str,
    inode_type: InodeType,
) -> Result<u32> {
    validate_name(name)?;

    let is_dir = inode_type.is_dir();
    let child = alloc_inode(image, is_dir)?;

    if let Err(e) = insert_with_inode(image, dir, name, inode_type, child) {
        free_inode(image, child, is_dir)?;
        return Err(e);
    }

    Ok(child)
}

/// 向目录添加指向已有 inode 的条目
///
/// 硬链接和 `.`/`..` 使用这个函数，不分配新 inode。
///
/// # 错误
///
/// - `ErrorKind::InvalidInput` - 名称为空、过长或包含 `/`
/// - `ErrorKind::AlreadyExists` - 同名条目已存在
/// - `ErrorKind::NoSpace` - 需要新块但没有空闲块，或目录已达最大块数
pub fn insert_with_inode<B: AsRef<[u8]> + AsMut<[u8]>>(
    image: &mut Image<B>,
    dir: &mut Inode,
    name: &str,
    inode_type: InodeType,
    child: u32,
) -> Result<()> {
    validate_name(name)?;

    if find_record(image, dir, name.as_bytes())?.is_some() {
        return Err(Error::new(
            ErrorKind::AlreadyExists,
            "Directory entry already exists",
        ));
    }

    let required = padded_size(name.len());
    let file_type = inode_type.to_de_type();

    match walk(image, dir, |record| record.slack() >= required)? {
        Some(record) if !record.is_live() => {
            let data = image.block_mut(record.block)?;
            write_entry(
                data,
                record.offset,
                child,
                record.header.rec_len,
                name.as_bytes(),
                file_type,
            );
        }
        Some(record) => {
            let used = record.used_len();
            let data = image.block_mut(record.block)?;

            let mut shrunk = record.header;
            shrunk.rec_len = used as u16;
            shrunk.write_to(&mut data[record.offset..record.offset + EXT2_DIR_ENTRY_HEADER_LEN]);

            write_entry(
                data,
                record.offset + used,
                child,
                record.header.rec_len - used as u16,
                name.as_bytes(),
                file_type,
            );
        }
        None => {
            let mapper = IndirectBlockMapper::new(image.layout());
            let block = mapper.grow_by_one_block(image, dir)?;
            let block_size = image.block_size();
            dir.set_size(dir.size() + block_size);
            dir.write(image)?;

            let data = image.block_mut(block)?;
            write_entry(data, 0, child, block_size as u16, name.as_bytes(), file_type);
        }
    }

    log::debug!(
        "[dir] inode {}: added '{}' -> {}",
        dir.inode_num(),
        name,
        child
    );
    Ok(())
}

/// 删除目录条目
///
/// 只修改目录本身，被引用的 inode 不做任何处理。
/// 名称按原始字节匹配，不要求是合法 UTF-8。
///
/// # 返回
///
/// 被删除的目录项
///
/// # 错误
///
/// 条目不存在返回 `ErrorKind::NotFound`
pub fn remove<B: AsRef<[u8]> + AsMut<[u8]>>(
    image: &mut Image<B>,
    dir: &mut Inode,
    name: &[u8],
) -> Result<DirEntry> {
    let record = find_record(image, dir, name)?.ok_or(Error::new(
        ErrorKind::NotFound,
        "Directory entry not found",
    ))?;
    let entry = record.to_entry();

    let has_neighbours = walk(image, dir, |r| {
        r.logical_block == record.logical_block && r.offset != record.offset && r.is_live()
    })?
    .is_some();

    if !has_neighbours {
        // 块内唯一的有效项：整块释放
        let mapper = IndirectBlockMapper::new(image.layout());
        mapper.remove_block_at(image, dir, record.logical_block)?;
        dir.set_size(dir.size().saturating_sub(image.block_size()));
        dir.write(image)?;
    } else if let Some(prev_offset) = record.prev_offset {
        let data = image.block_mut(record.block)?;

        let mut prev = ext2_dir_entry::parse(&data[prev_offset..]);
        prev.rec_len += record.header.rec_len;
        prev.write_to(&mut data[prev_offset..prev_offset + EXT2_DIR_ENTRY_HEADER_LEN]);

        let mut dead = record.header;
        dead.inode = 0;
        dead.file_type = EXT2_DE_UNKNOWN;
        dead.write_to(&mut data[record.offset..record.offset + EXT2_DIR_ENTRY_HEADER_LEN]);
    } else {
        // 块内第一项：把下一项移到块首并吸收本项的空间
        let data = image.block_mut(record.block)?;
        let next_offset = record.offset + record.header.rec_len as usize;
        if next_offset + EXT2_DIR_ENTRY_HEADER_LEN > data.len() {
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Directory entry chain ends early",
            ));
        }

        let next = ext2_dir_entry::parse(&data[next_offset..]);
        let next_len = EXT2_DIR_ENTRY_HEADER_LEN + next.name_len as usize;
        data.copy_within(next_offset..next_offset + next_len, record.offset);

        let mut moved = next;
        moved.rec_len += record.header.rec_len;
        moved.write_to(&mut data[record.offset..record.offset + EXT2_DIR_ENTRY_HEADER_LEN]);

        // 旧位置的头部如果没有被新名字覆盖，标记为空
        if next_offset >= record.offset + next_len {
            data[next_offset..next_offset + 4].fill(0);
        }
    }

    log::debug!(
        "[dir] inode {}: removed '{}' (inode {})",
        dir.inode_num(),
        entry.name,
        entry.inode
    );
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bitmap::{is_used, BitmapKind},
        check::check_image,
        dir::{find, read_dir, DirIterator},
        mkfs::{self, MkfsOptions},
    };
    use alloc::format;
    use alloc::vec;
    use alloc::vec::Vec;

    fn fresh() -> (Image<Vec<u8>>, Inode) {
        let mut buf = vec![0u8; 128 * 1024];
        mkfs::format(&mut buf, &MkfsOptions::default()).unwrap();
        let image = Image::open(buf).unwrap();
        let root = Inode::load(&image, EXT2_ROOT_INODE).unwrap();
        (image, root)
    }

    /// 每个目录块内 rec_len 之和
    fn block_spans(image: &Image<Vec<u8>>, dir: &Inode) -> Vec<usize> {
        let mut spans: Vec<usize> = Vec::new();
        for record in DirIterator::new(image, dir).unwrap() {
            let record = record.unwrap();
            let idx = record.logical_block as usize;
            if spans.len() <= idx {
                spans.resize(idx + 1, 0);
            }
            spans[idx] += record.header.rec_len as usize;
        }
        spans
    }

    fn names(image: &Image<Vec<u8>>, dir: &Inode) -> Vec<alloc::string::String> {
        read_dir(image, dir).unwrap().into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn test_insert_then_find() {
        let (mut image, mut root) = fresh();
        let ino = insert(&mut image, &mut root, "foo", InodeType::RegularFile).unwrap();
        assert!(is_used(&image, BitmapKind::Inode, ino).unwrap());

        let entry = find(&image, &root, "foo").unwrap().unwrap();
        assert_eq!(entry.inode, ino);
        assert!(entry.is_file());
        assert_eq!(block_spans(&image, &root), vec![1024]);
    }

    #[test]
    fn test_insert_duplicate_is_rejected() {
        let (mut image, mut root) = fresh();
        let err = insert(&mut image, &mut root, "lost+found", InodeType::Directory).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        // 失败时不泄漏 inode
        assert!(!is_used(&image, BitmapKind::Inode, 12).unwrap());
    }

    #[test]
    fn test_insert_appends_block_when_full() {
        let (mut image, mut root) = fresh();
        let mut count = 0;
        while root.sectors() == 2 {
            let name = format!("file_{:02}", count);
            insert_with_inode(&mut image, &mut root, &name, InodeType::RegularFile, 12).unwrap();
            count += 1;
            assert!(count < 100);
        }

        assert_eq!(root.size(), 2048);
        assert_eq!(block_spans(&image, &root), vec![1024, 1024]);
        let on_disk = Inode::load(&image, EXT2_ROOT_INODE).unwrap();
        assert_eq!(on_disk.sectors(), 4);

        // 第二块里只有最后插入的一项，删除它会释放整块
        let last = format!("file_{:02}", count - 1);
        let block = root.block_ptr(1).unwrap();
        remove(&mut image, &mut root, last.as_bytes()).unwrap();
        assert_eq!(root.size(), 1024);
        assert_eq!(root.sectors(), 2);
        assert!(!is_used(&image, BitmapKind::Block, block).unwrap());
        assert_eq!(block_spans(&image, &root), vec![1024]);
    }

    #[test]
    fn test_remove_merges_into_previous() {
        let (mut image, mut root) = fresh();
        for name in ["a", "b", "c"] {
            insert_with_inode(&mut image, &mut root, name, InodeType::RegularFile, 12).unwrap();
        }

        let removed = remove(&mut image, &mut root, b"b").unwrap();
        assert_eq!(removed.inode, 12);
        assert_eq!(names(&image, &root), vec![".", "..", "lost+found", "a", "c"]);
        assert_eq!(block_spans(&image, &root), vec![1024]);

        assert_eq!(
            remove(&mut image, &mut root, b"b").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_remove_first_entry_shifts_next() {
        let (mut image, mut root) = fresh();
        remove(&mut image, &mut root, b".").unwrap();
        assert_eq!(names(&image, &root), vec!["..", "lost+found"]);
        assert_eq!(block_spans(&image, &root), vec![1024]);

        let first = DirIterator::new(&image, &root).unwrap().next().unwrap().unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(first.name, b"..");
        assert_eq!(first.header.rec_len, 24);
    }

    #[test]
    fn test_tombstone_is_reused() {
        let (mut image, mut root) = fresh();
        // 把 lost+found 项改成空记录（inode 0，rec_len 1000）
        let block = root.block_ptr(0).unwrap();
        image.block_mut(block).unwrap()[24..28].fill(0);
        assert_eq!(names(&image, &root), vec![".", ".."]);

        insert_with_inode(&mut image, &mut root, "y", InodeType::RegularFile, 12).unwrap();
        let record = find_record(&image, &root, b"y").unwrap().unwrap();
        assert_eq!(record.offset, 24);
        assert_eq!(record.header.rec_len, 1000);
        assert_eq!(block_spans(&image, &root), vec![1024]);
    }

    /// 目录增长到第 14 个块（间接块第二个槽位），再删除条目触发压缩
    #[test]
    fn test_directory_grows_into_indirect_block() {
        let (mut image, mut root) = fresh();
        let target = insert(&mut image, &mut root, "target", InodeType::RegularFile).unwrap();
        let mut file = Inode::load(&image, target).unwrap();
        file.set_mode(EXT2_INODE_MODE_FILE, 0o644);

        let mut names_added: Vec<alloc::string::String> = Vec::new();
        while root.size() < 14 * 1024 {
            let name = format!("f{:04}", names_added.len());
            insert_with_inode(&mut image, &mut root, &name, InodeType::RegularFile, target)
                .unwrap();
            names_added.push(name);
            // 第 13 个块起经由间接块
            assert!(root.size() <= 12 * 1024 || root.indirect_block() != 0);
        }

        let indirect = root.indirect_block();
        assert_ne!(indirect, 0);
        assert!(is_used(&image, BitmapKind::Block, indirect).unwrap());
        assert_eq!(root.size(), 14 * 1024);
        assert_eq!(block_spans(&image, &root), vec![1024; 14]);
        assert_eq!(Inode::load(&image, EXT2_ROOT_INODE).unwrap().sectors(), 15 * 2);

        let mut links = names_added.len() + 1;
        file.set_links_count(links as u16);
        file.write(&mut image).unwrap();
        assert!(check_image(&image).unwrap().is_clean());

        // 清空第 4 个块，后面的块指针前移，间接块里只剩一个槽位
        let in_block_3: Vec<Vec<u8>> = DirIterator::new(&image, &root)
            .unwrap()
            .map(|r| r.unwrap())
            .filter(|r| r.logical_block == 3 && r.is_live())
            .map(|r| r.name)
            .collect();
        assert!(!in_block_3.is_empty());
        for name in &in_block_3 {
            remove(&mut image, &mut root, name).unwrap();
        }
        links -= in_block_3.len();
        assert_eq!(root.size(), 13 * 1024);
        assert_eq!(root.indirect_block(), indirect);
        assert_eq!(block_spans(&image, &root), vec![1024; 13]);

        // 最后一块只有最后插入的一项，删除后间接块也被释放
        let last = names_added.last().unwrap();
        remove(&mut image, &mut root, last.as_bytes()).unwrap();
        links -= 1;
        assert_eq!(root.size(), 12 * 1024);
        assert_eq!(root.indirect_block(), 0);
        assert!(!is_used(&image, BitmapKind::Block, indirect).unwrap());
        assert_eq!(block_spans(&image, &root), vec![1024; 12]);

        let mut file = Inode::load(&image, target).unwrap();
        file.set_links_count(links as u16);
        file.write(&mut image).unwrap();
        let report = check_image(&image).unwrap();
        assert!(report.is_clean(), "{:?}", report.problems);
    }

    #[test]
    fn test_bad_names() {
        let (mut image, mut root) = fresh();
        for bad in ["", "a/b"] {
            assert_eq!(
                insert(&mut image, &mut root, bad, InodeType::RegularFile)
                    .unwrap_err()
                    .kind(),
                ErrorKind::InvalidInput
            );
        }
    }
}
