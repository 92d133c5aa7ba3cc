//! ext2 数据结构定义
//!
//! 这个模块包含了直接对应磁盘格式的数据结构。
//!
//! ## 设计原则
//!
//! 1. **磁盘格式结构** - 保留 C 风格命名（便于对照 ext2 规范）
//! 2. **显式编解码** - 不做指针强转，字段按小端序逐个读出 (`parse`) 和写回 (`write_to`)
//! 3. **辅助方法** - 提供 Rust 风格的访问器和工具函数
//!
//! 所有 `parse` / `write_to` 都要求调用方传入足够长的切片，
//! 这一点由 [`crate::block::Image`] 的带边界检查访问器保证。

#![allow(non_camel_case_types)] // 允许C风格命名

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::*;

//=============================================================================
// Superblock
//=============================================================================

/// Superblock 结构（只解析本库关心的前 136 字节）
///
/// 对应 ext2 磁盘格式中的 `ext2_super_block`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ext2_sblock {
    /// 0: 总 inode 数
    pub inodes_count: u32,
    /// 4: 总块数
    pub blocks_count: u32,
    /// 8: 保留块数
    pub r_blocks_count: u32,
    /// 12: 空闲块数
    pub free_blocks_count: u32,
    /// 16: 空闲 inode 数
    pub free_inodes_count: u32,
    /// 20: 第一个数据块
    pub first_data_block: u32,
    /// 24: 块大小（1024 << log_block_size）
    pub log_block_size: u32,
    /// 28: 片段大小
    pub log_frag_size: u32,
    /// 32: 每组块数
    pub blocks_per_group: u32,
    /// 36: 每组片段数
    pub frags_per_group: u32,
    /// 40: 每组 inode 数
    pub inodes_per_group: u32,
    /// 44: 挂载时间
    pub mtime: u32,
    /// 48: 写入时间
    pub wtime: u32,
    /// 52: 挂载次数
    pub mnt_count: u16,
    /// 54: 最大挂载次数
    pub max_mnt_count: u16,
    /// 56: 魔数 (0xEF53)
    pub magic: u16,
    /// 58: 文件系统状态
    pub state: u16,
    /// 60: 错误处理方式
    pub errors: u16,
    /// 62: 次版本号
    pub minor_rev_level: u16,
    /// 64: 最后检查时间
    pub lastcheck: u32,
    /// 68: 检查间隔
    pub checkinterval: u32,
    /// 72: 创建者操作系统
    pub creator_os: u32,
    /// 76: 版本级别
    pub rev_level: u32,
    /// 80: 默认保留 uid
    pub def_resuid: u16,
    /// 82: 默认保留 gid
    pub def_resgid: u16,
    /// 84: 第一个非保留 inode
    pub first_ino: u32,
    /// 88: inode 大小
    pub inode_size: u16,
    /// 90: 本超级块所在的块组号
    pub block_group_nr: u16,
    /// 92: 兼容特性
    pub feature_compat: u32,
    /// 96: 不兼容特性
    pub feature_incompat: u32,
    /// 100: 只读兼容特性
    pub feature_ro_compat: u32,
    /// 104: 128位UUID
    pub uuid: [u8; 16],
    /// 120: 卷名称
    pub volume_name: [u8; 16],
}

impl ext2_sblock {
    /// 解析/写回所需的字节数
    pub const ENCODED_LEN: usize = 136;

    /// 从字节解析 superblock
    pub fn parse(buf: &[u8]) -> Self {
        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&buf[104..120]);
        let mut volume_name = [0u8; 16];
        volume_name.copy_from_slice(&buf[120..136]);

        Self {
            inodes_count: LittleEndian::read_u32(&buf[0..]),
            blocks_count: LittleEndian::read_u32(&buf[4..]),
            r_blocks_count: LittleEndian::read_u32(&buf[8..]),
            free_blocks_count: LittleEndian::read_u32(&buf[12..]),
            free_inodes_count: LittleEndian::read_u32(&buf[16..]),
            first_data_block: LittleEndian::read_u32(&buf[20..]),
            log_block_size: LittleEndian::read_u32(&buf[24..]),
            log_frag_size: LittleEndian::read_u32(&buf[28..]),
            blocks_per_group: LittleEndian::read_u32(&buf[32..]),
            frags_per_group: LittleEndian::read_u32(&buf[36..]),
            inodes_per_group: LittleEndian::read_u32(&buf[40..]),
            mtime: LittleEndian::read_u32(&buf[44..]),
            wtime: LittleEndian::read_u32(&buf[48..]),
            mnt_count: LittleEndian::read_u16(&buf[52..]),
            max_mnt_count: LittleEndian::read_u16(&buf[54..]),
            magic: LittleEndian::read_u16(&buf[56..]),
            state: LittleEndian::read_u16(&buf[58..]),
            errors: LittleEndian::read_u16(&buf[60..]),
            minor_rev_level: LittleEndian::read_u16(&buf[62..]),
            lastcheck: LittleEndian::read_u32(&buf[64..]),
            checkinterval: LittleEndian::read_u32(&buf[68..]),
            creator_os: LittleEndian::read_u32(&buf[72..]),
            rev_level: LittleEndian::read_u32(&buf[76..]),
            def_resuid: LittleEndian::read_u16(&buf[80..]),
            def_resgid: LittleEndian::read_u16(&buf[82..]),
            first_ino: LittleEndian::read_u32(&buf[84..]),
            inode_size: LittleEndian::read_u16(&buf[88..]),
            block_group_nr: LittleEndian::read_u16(&buf[90..]),
            feature_compat: LittleEndian::read_u32(&buf[92..]),
            feature_incompat: LittleEndian::read_u32(&buf[96..]),
            feature_ro_compat: LittleEndian::read_u32(&buf[100..]),
            uuid,
            volume_name,
        }
    }

    /// 写回到字节缓冲区（只覆盖已解析的字段）
    pub fn write_to(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..], self.inodes_count);
        LittleEndian::write_u32(&mut buf[4..], self.blocks_count);
        LittleEndian::write_u32(&mut buf[8..], self.r_blocks_count);
        LittleEndian::write_u32(&mut buf[12..], self.free_blocks_count);
        LittleEndian::write_u32(&mut buf[16..], self.free_inodes_count);
        LittleEndian::write_u32(&mut buf[20..], self.first_data_block);
        LittleEndian::write_u32(&mut buf[24..], self.log_block_size);
        LittleEndian::write_u32(&mut buf[28..], self.log_frag_size);
        LittleEndian::write_u32(&mut buf[32..], self.blocks_per_group);
        LittleEndian::write_u32(&mut buf[36..], self.frags_per_group);
        LittleEndian::write_u32(&mut buf[40..], self.inodes_per_group);
        LittleEndian::write_u32(&mut buf[44..], self.mtime);
        LittleEndian::write_u32(&mut buf[48..], self.wtime);
        LittleEndian::write_u16(&mut buf[52..], self.mnt_count);
        LittleEndian::write_u16(&mut buf[54..], self.max_mnt_count);
        LittleEndian::write_u16(&mut buf[56..], self.magic);
        LittleEndian::write_u16(&mut buf[58..], self.state);
        LittleEndian::write_u16(&mut buf[60..], self.errors);
        LittleEndian::write_u16(&mut buf[62..], self.minor_rev_level);
        LittleEndian::write_u32(&mut buf[64..], self.lastcheck);
        LittleEndian::write_u32(&mut buf[68..], self.checkinterval);
        LittleEndian::write_u32(&mut buf[72..], self.creator_os);
        LittleEndian::write_u32(&mut buf[76..], self.rev_level);
        LittleEndian::write_u16(&mut buf[80..], self.def_resuid);
        LittleEndian::write_u16(&mut buf[82..], self.def_resgid);
        LittleEndian::write_u32(&mut buf[84..], self.first_ino);
        LittleEndian::write_u16(&mut buf[88..], self.inode_size);
        LittleEndian::write_u16(&mut buf[90..], self.block_group_nr);
        LittleEndian::write_u32(&mut buf[92..], self.feature_compat);
        LittleEndian::write_u32(&mut buf[96..], self.feature_incompat);
        LittleEndian::write_u32(&mut buf[100..], self.feature_ro_compat);
        buf[104..120].copy_from_slice(&self.uuid);
        buf[120..136].copy_from_slice(&self.volume_name);
    }

    /// 获取块大小（字节）
    ///
    /// `log_block_size` 异常时返回 0，由调用方拒绝
    pub fn block_size(&self) -> u32 {
        if self.log_block_size > 6 {
            return 0;
        }
        EXT2_MIN_BLOCK_SIZE << self.log_block_size
    }

    /// 获取 inode 大小
    pub fn inode_size(&self) -> u16 {
        if self.rev_level == EXT2_GOOD_OLD_REV || self.inode_size == 0 {
            EXT2_GOOD_OLD_INODE_SIZE
        } else {
            self.inode_size
        }
    }

    /// 第一个可分配给普通文件的 inode
    pub fn first_ino(&self) -> u32 {
        if self.rev_level == EXT2_GOOD_OLD_REV {
            EXT2_GOOD_OLD_FIRST_INO
        } else {
            self.first_ino
        }
    }

    /// 验证魔数
    pub fn is_valid(&self) -> bool {
        self.magic == EXT2_SUPERBLOCK_MAGIC
    }
}

//=============================================================================
// 块组描述符
//=============================================================================

/// 块组描述符
///
/// 对应 ext2 磁盘格式中的 `ext2_group_desc`（32 字节，只解析前 18 字节）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ext2_group_desc {
    /// 0: 块位图所在块
    pub block_bitmap: u32,
    /// 4: inode 位图所在块
    pub inode_bitmap: u32,
    /// 8: inode 表起始块
    pub inode_table: u32,
    /// 12: 本组空闲块数
    pub free_blocks_count: u16,
    /// 14: 本组空闲 inode 数
    pub free_inodes_count: u16,
    /// 16: 本组目录数
    pub used_dirs_count: u16,
}

impl ext2_group_desc {
    /// 解析/写回所需的字节数
    pub const ENCODED_LEN: usize = 18;

    /// 从字节解析
    pub fn parse(buf: &[u8]) -> Self {
        Self {
            block_bitmap: LittleEndian::read_u32(&buf[0..]),
            inode_bitmap: LittleEndian::read_u32(&buf[4..]),
            inode_table: LittleEndian::read_u32(&buf[8..]),
            free_blocks_count: LittleEndian::read_u16(&buf[12..]),
            free_inodes_count: LittleEndian::read_u16(&buf[14..]),
            used_dirs_count: LittleEndian::read_u16(&buf[16..]),
        }
    }

    /// 写回到字节缓冲区
    pub fn write_to(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..], self.block_bitmap);
        LittleEndian::write_u32(&mut buf[4..], self.inode_bitmap);
        LittleEndian::write_u32(&mut buf[8..], self.inode_table);
        LittleEndian::write_u16(&mut buf[12..], self.free_blocks_count);
        LittleEndian::write_u16(&mut buf[14..], self.free_inodes_count);
        LittleEndian::write_u16(&mut buf[16..], self.used_dirs_count);
    }
}

//=============================================================================
// Inode
//=============================================================================

/// Inode 结构（修订版本 0 的 128 字节部分）
///
/// 对应 ext2 磁盘格式中的 `ext2_inode`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ext2_inode {
    /// 0: 文件模式
    pub mode: u16,
    /// 2: 所有者 uid
    pub uid: u16,
    /// 4: 文件大小
    pub size: u32,
    /// 8: 访问时间
    pub atime: u32,
    /// 12: 创建时间
    pub ctime: u32,
    /// 16: 修改时间
    pub mtime: u32,
    /// 20: 删除时间
    pub dtime: u32,
    /// 24: 组 gid
    pub gid: u16,
    /// 26: 硬链接数
    pub links_count: u16,
    /// 28: 512B 扇区数
    pub blocks: u32,
    /// 32: 标志
    pub flags: u32,
    /// 36: OS相关1
    pub osd1: u32,
    /// 40: 块指针数组（15个）
    pub block: [u32; EXT2_INODE_BLOCKS],
    /// 100: 文件版本
    pub generation: u32,
    /// 104: 文件 ACL
    pub file_acl: u32,
    /// 108: 目录 ACL / 大小高32位
    pub dir_acl: u32,
    /// 112: 片段地址
    pub faddr: u32,
    /// 116: OS相关2
    pub osd2: [u8; 12],
}

impl ext2_inode {
    /// 解析/写回所需的字节数
    pub const ENCODED_LEN: usize = 128;

    /// 从字节解析
    pub fn parse(buf: &[u8]) -> Self {
        let mut block = [0u32; EXT2_INODE_BLOCKS];
        LittleEndian::read_u32_into(&buf[40..100], &mut block);
        let mut osd2 = [0u8; 12];
        osd2.copy_from_slice(&buf[116..128]);

        Self {
            mode: LittleEndian::read_u16(&buf[0..]),
            uid: LittleEndian::read_u16(&buf[2..]),
            size: LittleEndian::read_u32(&buf[4..]),
            atime: LittleEndian::read_u32(&buf[8..]),
            ctime: LittleEndian::read_u32(&buf[12..]),
            mtime: LittleEndian::read_u32(&buf[16..]),
            dtime: LittleEndian::read_u32(&buf[20..]),
            gid: LittleEndian::read_u16(&buf[24..]),
            links_count: LittleEndian::read_u16(&buf[26..]),
            blocks: LittleEndian::read_u32(&buf[28..]),
            flags: LittleEndian::read_u32(&buf[32..]),
            osd1: LittleEndian::read_u32(&buf[36..]),
            block,
            generation: LittleEndian::read_u32(&buf[100..]),
            file_acl: LittleEndian::read_u32(&buf[104..]),
            dir_acl: LittleEndian::read_u32(&buf[108..]),
            faddr: LittleEndian::read_u32(&buf[112..]),
            osd2,
        }
    }

    /// 写回到字节缓冲区
    pub fn write_to(&self, buf: &mut [u8]) {
        LittleEndian::write_u16(&mut buf[0..], self.mode);
        LittleEndian::write_u16(&mut buf[2..], self.uid);
        LittleEndian::write_u32(&mut buf[4..], self.size);
        LittleEndian::write_u32(&mut buf[8..], self.atime);
        LittleEndian::write_u32(&mut buf[12..], self.ctime);
        LittleEndian::write_u32(&mut buf[16..], self.mtime);
        LittleEndian::write_u32(&mut buf[20..], self.dtime);
        LittleEndian::write_u16(&mut buf[24..], self.gid);
        LittleEndian::write_u16(&mut buf[26..], self.links_count);
        LittleEndian::write_u32(&mut buf[28..], self.blocks);
        LittleEndian::write_u32(&mut buf[32..], self.flags);
        LittleEndian::write_u32(&mut buf[36..], self.osd1);
        LittleEndian::write_u32_into(&self.block, &mut buf[40..100]);
        LittleEndian::write_u32(&mut buf[100..], self.generation);
        LittleEndian::write_u32(&mut buf[104..], self.file_acl);
        LittleEndian::write_u32(&mut buf[108..], self.dir_acl);
        LittleEndian::write_u32(&mut buf[112..], self.faddr);
        buf[116..128].copy_from_slice(&self.osd2);
    }

    /// 是否是目录
    pub fn is_dir(&self) -> bool {
        (self.mode & EXT2_INODE_MODE_TYPE_MASK) == EXT2_INODE_MODE_DIRECTORY
    }

    /// 是否是普通文件
    pub fn is_file(&self) -> bool {
        (self.mode & EXT2_INODE_MODE_TYPE_MASK) == EXT2_INODE_MODE_FILE
    }

    /// 是否是符号链接
    pub fn is_symlink(&self) -> bool {
        (self.mode & EXT2_INODE_MODE_TYPE_MASK) == EXT2_INODE_MODE_SOFTLINK
    }
}

//=============================================================================
// 目录项
//=============================================================================

/// 目录项头部
///
/// 对应 ext2 磁盘格式中的 `ext2_dir_entry_2`，后面跟着 `name_len` 字节的名称
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ext2_dir_entry {
    /// inode 编号（0 表示未使用）
    pub inode: u32,
    /// 记录长度（到下一个目录项或块尾）
    pub rec_len: u16,
    /// 名称长度
    pub name_len: u8,
    /// 文件类型
    pub file_type: u8,
}

impl ext2_dir_entry {
    /// 从字节解析头部
    pub fn parse(buf: &[u8]) -> Self {
        Self {
            inode: LittleEndian::read_u32(&buf[0..]),
            rec_len: LittleEndian::read_u16(&buf[4..]),
            name_len: buf[6],
            file_type: buf[7],
        }
    }

    /// 写回头部
    pub fn write_to(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..], self.inode);
        LittleEndian::write_u16(&mut buf[4..], self.rec_len);
        buf[6] = self.name_len;
        buf[7] = self.file_type;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inode_encoding_is_lossless() {
        let mut raw = [0u8; 128];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = i as u8;
        }
        let inode = ext2_inode::parse(&raw);
        assert_eq!(inode.mode, 0x0100);
        assert_eq!(inode.block[0], u32::from_le_bytes([40, 41, 42, 43]));

        let mut out = [0u8; 128];
        inode.write_to(&mut out);
        assert_eq!(raw, out);
    }

    #[test]
    fn test_sblock_block_size() {
        let mut sb = ext2_sblock::default();
        assert_eq!(sb.block_size(), 1024);
        sb.log_block_size = 2;
        assert_eq!(sb.block_size(), 4096);
        sb.log_block_size = 31;
        assert_eq!(sb.block_size(), 0);
    }

    #[test]
    fn test_sblock_revision_defaults() {
        let mut sb = ext2_sblock::default();
        sb.inode_size = 256;
        sb.first_ino = 20;
        assert_eq!(sb.inode_size(), 128);
        assert_eq!(sb.first_ino(), 11);

        sb.rev_level = EXT2_DYNAMIC_REV;
        assert_eq!(sb.inode_size(), 256);
        assert_eq!(sb.first_ino(), 20);
    }

    #[test]
    fn test_dir_entry_header() {
        let mut buf = [0u8; 8];
        let de = ext2_dir_entry {
            inode: 12,
            rec_len: 1012,
            name_len: 2,
            file_type: EXT2_DE_DIR,
        };
        de.write_to(&mut buf);
        assert_eq!(buf, [12, 0, 0, 0, 0xF4, 0x03, 2, 2]);
        assert_eq!(ext2_dir_entry::parse(&buf), de);
    }
}
