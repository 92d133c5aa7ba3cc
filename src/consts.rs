//! ext2 文件系统常量定义
//!
//! 这个模块包含了 ext2 文件系统的常量定义，包括：
//! - 磁盘布局相关常量
//! - 文件类型和权限位
//! - 目录项类型
//! - 错误码

//=============================================================================
// 基础常量
//=============================================================================

/// 扇区大小（i_blocks 的计数单位，512 字节）
pub const EXT2_SECTOR_SIZE: u32 = 512;

/// 最小块大小（1024 字节）
pub const EXT2_MIN_BLOCK_SIZE: u32 = 1024;

/// 支持的最大块大小（4096 字节）
pub const EXT2_MAX_BLOCK_SIZE: u32 = 4096;

//=============================================================================
// Superblock 相关
//=============================================================================

/// Superblock 在镜像中的字节偏移
pub const EXT2_SUPERBLOCK_OFFSET: usize = 1024;

/// Superblock 大小（字节）
pub const EXT2_SUPERBLOCK_SIZE: usize = 1024;

/// ext2 魔数 (0xEF53)
pub const EXT2_SUPERBLOCK_MAGIC: u16 = 0xEF53;

/// Root inode 编号（固定，不需要动态查找）
pub const EXT2_ROOT_INODE: u32 = 2;

/// lost+found 在新格式化镜像中的 inode 编号
pub const EXT2_LOST_FOUND_INODE: u32 = 11;

/// 修订版本 0 的第一个非保留 inode
pub const EXT2_GOOD_OLD_FIRST_INO: u32 = 11;

/// 修订版本 0
pub const EXT2_GOOD_OLD_REV: u32 = 0;

/// 动态修订版本
pub const EXT2_DYNAMIC_REV: u32 = 1;

/// 块组描述符大小
pub const EXT2_GROUP_DESC_SIZE: usize = 32;

/// Superblock 状态：干净卸载
pub const EXT2_VALID_FS: u16 = 0x0001;

/// 出错时继续
pub const EXT2_ERRORS_CONTINUE: u16 = 1;

/// 不兼容特性：目录项包含文件类型
pub const EXT2_FEATURE_INCOMPAT_FILETYPE: u32 = 0x0002;

//=============================================================================
// Inode 相关
//=============================================================================

/// Inode 中的块指针总数（15个）
/// - 12个直接块
/// - 1个一级间接块
/// - 1个二级间接块（不支持）
/// - 1个三级间接块（不支持）
pub const EXT2_INODE_BLOCKS: usize = 15;

/// 直接块指针数量
pub const EXT2_INODE_DIRECT_BLOCKS: usize = 12;

/// 一级间接块索引
pub const EXT2_INODE_INDIRECT_BLOCK: usize = 12;

/// 修订版本 0 的 inode 大小
pub const EXT2_GOOD_OLD_INODE_SIZE: u16 = 128;

//=============================================================================
// Inode 模式位（文件类型和权限）
//=============================================================================

/// 文件类型掩码
pub const EXT2_INODE_MODE_TYPE_MASK: u16 = 0xF000;

/// FIFO
pub const EXT2_INODE_MODE_FIFO: u16 = 0x1000;

/// 字符设备
pub const EXT2_INODE_MODE_CHARDEV: u16 = 0x2000;

/// 目录
pub const EXT2_INODE_MODE_DIRECTORY: u16 = 0x4000;

/// 块设备
pub const EXT2_INODE_MODE_BLOCKDEV: u16 = 0x6000;

/// 普通文件
pub const EXT2_INODE_MODE_FILE: u16 = 0x8000;

/// 符号链接
pub const EXT2_INODE_MODE_SOFTLINK: u16 = 0xA000;

/// Socket
pub const EXT2_INODE_MODE_SOCKET: u16 = 0xC000;

/// 权限位掩码
pub const EXT2_INODE_MODE_PERM_MASK: u16 = 0x0FFF;

//=============================================================================
// 目录项类型
//=============================================================================

/// 未知类型
pub const EXT2_DE_UNKNOWN: u8 = 0;

/// 普通文件
pub const EXT2_DE_REG_FILE: u8 = 1;

/// 目录
pub const EXT2_DE_DIR: u8 = 2;

/// 字符设备
pub const EXT2_DE_CHRDEV: u8 = 3;

/// 块设备
pub const EXT2_DE_BLKDEV: u8 = 4;

/// FIFO
pub const EXT2_DE_FIFO: u8 = 5;

/// Socket
pub const EXT2_DE_SOCK: u8 = 6;

/// 符号链接
pub const EXT2_DE_SYMLINK: u8 = 7;

/// 目录项固定头部长度（inode + rec_len + name_len + file_type）
pub const EXT2_DIR_ENTRY_HEADER_LEN: usize = 8;

/// 目录项对齐边界
pub const EXT2_DIR_ENTRY_ALIGN: usize = 4;

/// 最大文件名长度（受 name_len 字段限制）
pub const EXT2_NAME_MAX: usize = 255;

//=============================================================================
// 错误码（与 POSIX errno 兼容）
//=============================================================================

/// 成功
pub const EOK: i32 = 0;

/// 没有此文件或目录
pub const ENOENT: i32 = 2;

/// I/O 错误
pub const EIO: i32 = 5;

/// 文件已存在
pub const EEXIST: i32 = 17;

/// 不是目录
pub const ENOTDIR: i32 = 20;

/// 是一个目录
pub const EISDIR: i32 = 21;

/// 无效参数
pub const EINVAL: i32 = 22;

/// 设备上没有空间
pub const ENOSPC: i32 = 28;

/// 不支持的操作
pub const ENOTSUP: i32 = 95;
