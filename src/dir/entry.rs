//! 目录项编码
//!
//! 目录块由变长目录项首尾相接组成，每项 4 字节对齐，
//! `rec_len` 指向下一项（或块尾），同一块内所有 `rec_len` 之和等于块大小。

use alloc::string::String;
use alloc::vec::Vec;

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
    fs::InodeType,
    types::ext2_dir_entry,
};

/// 容纳给定长度名称所需的目录项长度
///
/// `round_up_4(8 + name_len)`
pub const fn padded_size(name_len: usize) -> usize {
    (EXT2_DIR_ENTRY_HEADER_LEN + name_len + EXT2_DIR_ENTRY_ALIGN - 1) & !(EXT2_DIR_ENTRY_ALIGN - 1)
}

/// 检查名称能否写入目录项
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > EXT2_NAME_MAX {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Directory entry name too long or empty",
        ));
    }
    if name.bytes().any(|b| b == b'/' || b == 0) {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Directory entry name contains '/' or NUL",
        ));
    }
    Ok(())
}

/// 目录项
///
/// 表示一个目录中的条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode 编号
    pub inode: u32,
    /// 文件名（非 UTF-8 字节按 lossy 方式显示）
    pub name: String,
    /// 磁盘上的原始名称字节，查找和删除按它匹配
    pub raw_name: Vec<u8>,
    /// 文件类型（`EXT2_DE_*`）
    pub file_type: u8,
}

impl DirEntry {
    /// 目录项记录的类型
    pub fn inode_type(&self) -> InodeType {
        InodeType::from_de_type(self.file_type)
    }

    /// 检查是否是目录
    pub fn is_dir(&self) -> bool {
        self.file_type == EXT2_DE_DIR
    }

    /// 检查是否是普通文件
    pub fn is_file(&self) -> bool {
        self.file_type == EXT2_DE_REG_FILE
    }

    /// 检查是否是符号链接
    pub fn is_symlink(&self) -> bool {
        self.file_type == EXT2_DE_SYMLINK
    }

    /// `.` 或 `..`
    pub fn is_dot(&self) -> bool {
        self.raw_name == b"." || self.raw_name == b".."
    }
}

/// 目录项在镜像中的完整记录
///
/// 除了解析出的字段外还记录所在位置，删除和插入时据此原地修改。
#[derive(Debug, Clone)]
pub struct DirRecord {
    /// 目录内的逻辑块号
    pub logical_block: u32,
    /// 物理块号
    pub block: u32,
    /// 块内偏移
    pub offset: usize,
    /// 同一块内前一项的偏移（块内第一项为 `None`）
    pub prev_offset: Option<usize>,
    /// 头部
    pub header: ext2_dir_entry,
    /// 原始名称字节
    pub name: Vec<u8>,
}

impl DirRecord {
    /// 是否指向有效 inode
    pub fn is_live(&self) -> bool {
        self.header.inode != 0
    }

    /// 本项实际占用的长度
    pub fn used_len(&self) -> usize {
        padded_size(self.name.len())
    }

    /// 可供新目录项使用的空闲长度
    ///
    /// 已删除的项（inode 为 0）整个 `rec_len` 都可复用。
    pub fn slack(&self) -> usize {
        let rec_len = self.header.rec_len as usize;
        if self.is_live() {
            rec_len.saturating_sub(self.used_len())
        } else {
            rec_len
        }
    }

    /// 转换为 [`DirEntry`]
    pub fn to_entry(&self) -> DirEntry {
        DirEntry {
            inode: self.header.inode,
            name: String::from_utf8_lossy(&self.name).into_owned(),
            raw_name: self.name.clone(),
            file_type: self.header.file_type,
        }
    }
}

/// 在块内 `offset` 处写入一个完整目录项
///
/// 名称之后到 `padded_size` 的填充字节清零。
pub(crate) fn write_entry(
    data: &mut [u8],
    offset: usize,
    inode: u32,
    rec_len: u16,
    name: &[u8],
    file_type: u8,
) {
    let header = ext2_dir_entry {
        inode,
        rec_len,
        name_len: name.len() as u8,
        file_type,
    };
    header.write_to(&mut data[offset..offset + EXT2_DIR_ENTRY_HEADER_LEN]);

    let name_start = offset + EXT2_DIR_ENTRY_HEADER_LEN;
    data[name_start..name_start + name.len()].copy_from_slice(name);
    data[name_start + name.len()..offset + padded_size(name.len())].fill(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_size() {
        assert_eq!(padded_size(0), 8);
        assert_eq!(padded_size(1), 12);
        assert_eq!(padded_size(2), 12);
        assert_eq!(padded_size(4), 12);
        assert_eq!(padded_size(5), 16);
        assert_eq!(padded_size(255), 264);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("file.txt").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("a/b").is_err());
        let long = "x".repeat(256);
        assert_eq!(validate_name(&long).unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_dir_entry_type_checks() {
        let mut entry = DirEntry {
            inode: 2,
            name: "test".into(),
            raw_name: b"test".to_vec(),
            file_type: EXT2_DE_DIR,
        };

        assert!(entry.is_dir());
        assert!(!entry.is_file());
        assert!(!entry.is_symlink());
        assert_eq!(entry.inode_type(), InodeType::Directory);

        entry.file_type = EXT2_DE_SYMLINK;
        assert!(entry.is_symlink());
        assert!(!entry.is_dot());
    }

    #[test]
    fn test_slack_of_live_and_deleted_records() {
        let mut record = DirRecord {
            logical_block: 0,
            block: 0,
            offset: 12,
            prev_offset: Some(0),
            header: ext2_dir_entry {
                inode: 12,
                rec_len: 100,
                name_len: 3,
                file_type: EXT2_DE_REG_FILE,
            },
            name: b"abc".to_vec(),
        };
        assert_eq!(record.slack(), 88);
        record.header.inode = 0;
        assert_eq!(record.slack(), 100);
    }

    #[test]
    fn test_write_entry_pads_with_zero() {
        let mut data = [0xFFu8; 32];
        write_entry(&mut data, 4, 7, 28, b"ab", EXT2_DE_REG_FILE);
        assert_eq!(&data[4..14], &[7, 0, 0, 0, 28, 0, 2, 1, b'a', b'b']);
        assert_eq!(&data[14..16], &[0, 0]);
        assert_eq!(data[16], 0xFF);
    }
}
