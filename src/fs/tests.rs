//! 端到端场景测试
//!
//! 每个场景都在新格式化的 128 KiB 镜像上运行，结束时用
//! [`check_image`](crate::check::check_image) 确认镜像仍然一致。

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use super::*;
use crate::{
    bitmap::{is_used, BitmapKind},
    check::check_image,
    consts::*,
    dir::{find_record, read_dir},
    error::ErrorKind,
    indirect::IndirectBlockMapper,
    inode::Inode,
    mkfs::{self, MkfsOptions},
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fresh() -> Ext2FileSystem<Vec<u8>> {
    init_logger();
    let mut buf = vec![0u8; 128 * 1024];
    mkfs::format(&mut buf, &MkfsOptions::default()).unwrap();
    Ext2FileSystem::open(buf).unwrap()
}

fn assert_consistent(fs: &Ext2FileSystem<Vec<u8>>) {
    let report = check_image(fs.image()).unwrap();
    assert!(report.is_clean(), "{:?}", report.problems);
}

fn inode_of(fs: &Ext2FileSystem<Vec<u8>>, path: &str) -> Inode {
    let entry = fs.navigate(path).unwrap();
    Inode::load(fs.image(), entry.inode).unwrap()
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// /a 下放一个 3000 字节的 file.txt
fn with_file() -> (Ext2FileSystem<Vec<u8>>, Vec<u8>) {
    let mut fs = fresh();
    fs.mkdir("/a").unwrap();
    let data = pattern(3000);
    fs.copy_in("file.txt", &data, "/a/file.txt").unwrap();
    (fs, data)
}

#[test]
fn scenario_mkdir_creates_dot_entries() {
    let mut fs = fresh();
    let ino = fs.mkdir("/a").unwrap();

    let entry = fs.navigate("/a").unwrap();
    assert_eq!(entry.inode, ino);
    assert!(entry.is_dir());

    let dir = inode_of(&fs, "/a");
    assert_eq!(dir.links_count(), 2);
    assert_eq!(dir.size(), 1024);

    let entries = read_dir(fs.image(), &dir).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec![".", ".."]);
    assert_eq!(entries[0].inode, ino);
    assert_eq!(entries[1].inode, EXT2_ROOT_INODE);

    assert_eq!(inode_of(&fs, "/").links_count(), 4);
    assert_eq!(fs.stat_fs().unwrap().used_dirs_count, 3);
    assert_consistent(&fs);
}

#[test]
fn scenario_copy_in_uses_three_direct_blocks() {
    let (fs, data) = with_file();

    let inode = inode_of(&fs, "/a/file.txt");
    assert!(inode.is_file());
    assert_eq!(inode.size(), 3000);
    assert_eq!(inode.sectors(), 6);

    let mapper = IndirectBlockMapper::new(fs.image().layout());
    let blocks = mapper.blocks_of(fs.image(), &inode).unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(inode.indirect_block(), 0);

    assert!(fs.list("/a", false).unwrap().contains(&"file.txt".into()));
    assert_eq!(fs.read_file("/a/file.txt").unwrap(), data);
    assert_consistent(&fs);
}

#[test]
fn scenario_hard_link_survives_unlink() {
    let (mut fs, data) = with_file();
    let free_inodes = fs.stat_fs().unwrap().free_inodes_count;
    let original = fs.navigate("/a/file.txt").unwrap().inode;

    fs.ln("/a/file.txt", "/a/hard.txt", false).unwrap();
    assert_eq!(fs.navigate("/a/hard.txt").unwrap().inode, original);
    assert_eq!(inode_of(&fs, "/a/hard.txt").links_count(), 2);
    assert_eq!(fs.stat_fs().unwrap().free_inodes_count, free_inodes);
    assert_consistent(&fs);

    fs.remove("/a/file.txt", false).unwrap();
    assert_eq!(
        fs.navigate("/a/file.txt").unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let hard = inode_of(&fs, "/a/hard.txt");
    assert_eq!(hard.inode_num(), original);
    assert_eq!(hard.links_count(), 1);
    assert_eq!(hard.size(), 3000);
    assert_eq!(fs.read_file("/a/hard.txt").unwrap(), data);
    assert!(is_used(fs.image(), BitmapKind::Inode, original).unwrap());
    assert_consistent(&fs);
}

#[test]
fn scenario_symlink_stores_stripped_target() {
    let (mut fs, _) = with_file();
    let target = fs.navigate("/a/file.txt").unwrap().inode;

    fs.ln("/a/file.txt", "/a/soft.txt", true).unwrap();

    let entry = fs.navigate("/a/soft.txt").unwrap();
    assert!(entry.is_symlink());
    assert_ne!(entry.inode, target);

    let link = inode_of(&fs, "/a/soft.txt");
    assert!(link.is_symlink());
    assert_eq!(link.size(), 10);
    assert_eq!(link.permissions(), 0o777);

    let block = link.block_ptr(0).unwrap();
    assert_eq!(&fs.image().block(block).unwrap()[..10], b"a/file.txt");
    assert_eq!(fs.read_link("/a/soft.txt").unwrap(), "a/file.txt");

    // 目标文件不受影响
    assert_eq!(inode_of(&fs, "/a/file.txt").links_count(), 1);
    assert_eq!(
        fs.read_file("/a/soft.txt").unwrap_err().kind(),
        ErrorKind::InvalidInput
    );
    assert_consistent(&fs);
}

#[test]
fn scenario_recursive_remove_releases_everything() {
    let mut fs = fresh();
    let before = fs.stat_fs().unwrap();

    fs.mkdir("/a").unwrap();
    fs.mkdir("/a/sub").unwrap();
    fs.mkdir("/a/sub/deeper").unwrap();
    fs.copy_in("one", &pattern(3000), "/a/one").unwrap();
    fs.copy_in("two", &pattern(20 * 1024), "/a/sub/two").unwrap();
    fs.ln("/a/one", "/a/sub/one-again", false).unwrap();
    fs.ln("/a/sub/two", "/a/sub/deeper/two-link", true).unwrap();
    assert_eq!(inode_of(&fs, "/a").links_count(), 3);
    assert_eq!(inode_of(&fs, "/a/sub").links_count(), 3);
    assert_consistent(&fs);

    let used: Vec<u32> = ["/a", "/a/sub", "/a/sub/deeper", "/a/one", "/a/sub/two"]
        .iter()
        .map(|p| fs.navigate(p).unwrap().inode)
        .collect();

    assert_eq!(fs.remove("/a", false).unwrap_err().kind(), ErrorKind::IsADirectory);
    fs.remove("/a", true).unwrap();

    assert_eq!(fs.navigate("/a").unwrap_err().kind(), ErrorKind::NotFound);
    for ino in used {
        assert!(!is_used(fs.image(), BitmapKind::Inode, ino).unwrap());
    }
    assert_eq!(fs.stat_fs().unwrap(), before);
    assert_eq!(inode_of(&fs, "/").links_count(), 3);
    assert_consistent(&fs);
}

#[test]
fn link_count_tracks_every_name() {
    let (mut fs, _) = with_file();
    let free_blocks = fs.stat_fs().unwrap().free_blocks_count;
    let ino = fs.navigate("/a/file.txt").unwrap().inode;

    fs.link("/a/file.txt", "/a/b.txt").unwrap();
    fs.link("/a/file.txt", "/c.txt").unwrap();
    assert_eq!(inode_of(&fs, "/c.txt").links_count(), 3);

    fs.remove("/a/b.txt", false).unwrap();
    fs.remove("/a/file.txt", false).unwrap();
    assert_eq!(inode_of(&fs, "/c.txt").links_count(), 1);
    assert_eq!(fs.stat_fs().unwrap().free_blocks_count, free_blocks);

    fs.remove("/c.txt", false).unwrap();
    assert!(!is_used(fs.image(), BitmapKind::Inode, ino).unwrap());
    assert_eq!(fs.stat_fs().unwrap().free_blocks_count, free_blocks + 3);

    let dead = Inode::load(fs.image(), ino).unwrap();
    assert_eq!(dead.links_count(), 0);
    assert_eq!(dead.sectors(), 0);
    assert_consistent(&fs);
}

#[test]
fn listing_is_idempotent() {
    let (mut fs, _) = with_file();
    fs.ln("/a/file.txt", "/a/soft.txt", true).unwrap();

    let first = fs.list("/a", true).unwrap();
    let second = fs.list("/a", true).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, vec![".", "..", "file.txt", "soft.txt"]);

    let entries = fs.list_entries("/a", false).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].is_file());
    assert!(entries[1].is_symlink());
}

#[test]
fn large_file_switches_to_indirect_block() {
    let mut fs = fresh();
    let data = pattern(20 * 1024 + 17);
    fs.copy_in("big.bin", &data, "/").unwrap();

    let inode = inode_of(&fs, "/big.bin");
    assert_ne!(inode.indirect_block(), 0);
    // 21 个数据块加一个间接块
    assert_eq!(inode.sectors(), 22 * 2);
    assert_eq!(fs.read_file("/big.bin").unwrap(), data);
    assert_consistent(&fs);

    fs.remove("/big.bin", false).unwrap();
    assert_eq!(fs.stat_fs().unwrap().free_blocks_count, 117);
    assert_consistent(&fs);
}

#[test]
fn out_of_space_keeps_image_consistent() {
    let mut fs = fresh();
    let data = pattern(200 * 1024);

    let err = fs.copy_in("huge", &data, "/").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoSpace);
    assert_eq!(fs.stat_fs().unwrap().free_blocks_count, 0);

    // 117 块中 1 块是间接块
    let inode = inode_of(&fs, "/huge");
    assert_eq!(inode.size(), 116 * 1024);
    assert_eq!(fs.read_file("/huge").unwrap(), data[..116 * 1024]);
    assert_consistent(&fs);

    assert_eq!(fs.mkdir("/d").unwrap_err().kind(), ErrorKind::NoSpace);
    assert_consistent(&fs);

    fs.remove("/huge", false).unwrap();
    assert_eq!(fs.stat_fs().unwrap().free_blocks_count, 117);
    assert_consistent(&fs);
}

#[test]
fn directory_grows_and_shrinks() {
    let (mut fs, _) = with_file();
    let names: Vec<_> = (0..60).map(|i| format!("link_name_number_{:03}", i)).collect();

    for name in &names {
        fs.link("/a/file.txt", &format!("/a/{}", name)).unwrap();
    }
    let dir = inode_of(&fs, "/a");
    assert_eq!(dir.size(), 2048);
    assert_eq!(inode_of(&fs, "/a/file.txt").links_count(), 61);
    assert_consistent(&fs);

    for name in &names {
        fs.remove(&format!("/a/{}", name), false).unwrap();
    }
    let dir = inode_of(&fs, "/a");
    assert_eq!(dir.size(), 1024);
    assert_eq!(dir.sectors(), 2);
    assert_eq!(fs.list("/a", false).unwrap(), vec!["file.txt"]);
    assert_consistent(&fs);
}

#[test]
fn copy_into_directory_uses_source_name() {
    let mut fs = fresh();
    fs.mkdir("/docs").unwrap();

    let ino = fs.copy_in("/home/user/readme.md", b"# hi\n", "/docs").unwrap();
    assert_eq!(fs.navigate("/docs/readme.md").unwrap().inode, ino);

    // 覆盖同名文件，inode 不变
    let again = fs.copy_in("readme.md", b"updated", "/docs/").unwrap();
    assert_eq!(again, ino);
    assert_eq!(fs.read_file("/docs/readme.md").unwrap(), b"updated");
    assert_consistent(&fs);
}

#[test]
fn metadata_reports_file_fields() {
    let (fs, _) = with_file();
    let meta = fs.metadata("/a/file.txt").unwrap();
    assert!(meta.is_file());
    assert_eq!(meta.size, 3000);
    assert_eq!(meta.links_count, 1);
    assert_eq!(meta.permissions, 0o644);
    assert_eq!(meta.blocks_count, 6);
}

#[test]
fn buffer_round_trips_through_into_inner() {
    let (fs, data) = with_file();
    let buf = fs.into_inner();

    let fs = Ext2FileSystem::open(buf).unwrap();
    assert_eq!(fs.read_file("/a/file.txt").unwrap(), data);
}

#[test]
fn recursive_remove_handles_non_utf8_names() {
    let mut fs = fresh();
    let before = fs.stat_fs().unwrap();
    fs.mkdir("/a").unwrap();
    fs.copy_in("xy", b"payload", "/a/xy").unwrap();
    fs.copy_in("plain", b"other", "/a/plain").unwrap();

    // 把 "xy" 的名称改成非法 UTF-8 的 [0xFF, 'y']
    let dir = inode_of(&fs, "/a");
    let record = find_record(fs.image(), &dir, b"xy").unwrap().unwrap();
    let at = record.block as usize * 1024 + record.offset + EXT2_DIR_ENTRY_HEADER_LEN;
    let mut buf = fs.into_inner();
    buf[at] = 0xFF;
    let mut fs = Ext2FileSystem::open(buf).unwrap();

    let entries = fs.list_entries("/a", false).unwrap();
    assert!(entries.iter().any(|e| e.raw_name == [0xFF, b'y']));

    fs.remove("/a", true).unwrap();
    assert_eq!(fs.navigate("/a").unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(fs.stat_fs().unwrap(), before);
    assert_consistent(&fs);
}
