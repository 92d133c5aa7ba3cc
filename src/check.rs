//! 镜像一致性检查
//!
//! 只读地扫描整个镜像，收集元数据之间的不一致，不做任何修复。
//!
//! 检查项目：
//! 1. superblock、块组描述符和位图三处的空闲块数一致
//! 2. 同上，空闲 inode 数一致
//! 3. 每个目录块内 `rec_len` 链恰好覆盖整块
//! 4. inode 拥有的数据块数与文件大小相符
//! 5. 被引用的块和 inode 在位图中已标记，没有被两个 inode 同时引用
//! 6. 位图中已标记的块和 inode 都能从根目录到达（否则视为泄漏）
//! 7. 链接数等于指向该 inode 的目录项个数
//! 8. 块组描述符中的目录数等于可达目录数

use alloc::vec;
use alloc::vec::Vec;

use crate::{
    bitmap::{count_ones, test_bit},
    block::Image,
    block_group::BlockGroup,
    consts::*,
    dir::DirIterator,
    error::Result,
    indirect::IndirectBlockMapper,
    inode::Inode,
    superblock::Superblock,
    types::ext2_dir_entry,
};

/// 检查发现的问题
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckProblem {
    /// 空闲块计数不一致
    FreeBlocksMismatch {
        /// superblock 记录的值
        superblock: u32,
        /// 块组描述符记录的值
        group: u32,
        /// 位图中实际的空闲位数
        bitmap: u32,
    },
    /// 空闲 inode 计数不一致
    FreeInodesMismatch {
        /// superblock 记录的值
        superblock: u32,
        /// 块组描述符记录的值
        group: u32,
        /// 位图中实际的空闲位数
        bitmap: u32,
    },
    /// 块组描述符记录的目录数与实际不符
    UsedDirsMismatch {
        /// 块组描述符记录的值
        group: u32,
        /// 已分配的目录 inode 数
        counted: u32,
    },
    /// 目录块内 rec_len 链没有恰好覆盖整块
    DirectorySpan {
        /// 目录 inode
        inode: u32,
        /// 目录内的逻辑块号
        logical_block: u32,
        /// rec_len 之和
        span: u32,
    },
    /// 数据块数与文件大小不符
    BlockCountMismatch {
        /// inode 编号
        inode: u32,
        /// 块指针给出的数据块数
        recorded: u32,
        /// 按 i_size 算出的块数
        expected: u32,
    },
    /// 块号超出镜像或落在元数据区
    BlockOutOfRange {
        /// 引用该块的 inode
        inode: u32,
        /// 块号
        block: u32,
    },
    /// 同一块被多个 inode 引用
    DuplicateBlock {
        /// 块号
        block: u32,
        /// 先引用的 inode
        first: u32,
        /// 后引用的 inode
        second: u32,
    },
    /// 块被引用但位图中未标记（`inode` 为 0 表示元数据块）
    BlockNotMarked {
        /// 引用该块的 inode
        inode: u32,
        /// 块号
        block: u32,
    },
    /// inode 可达但位图中未标记
    InodeNotMarked {
        /// inode 编号
        inode: u32,
    },
    /// 块已标记但没有任何引用
    LeakedBlock {
        /// 块号
        block: u32,
    },
    /// inode 已标记但不可达
    LeakedInode {
        /// inode 编号
        inode: u32,
    },
    /// 链接数与目录项引用数不符
    LinkCountMismatch {
        /// inode 编号
        inode: u32,
        /// i_links_count
        recorded: u16,
        /// 实际引用数（含 `.` 和 `..`）
        counted: u32,
    },
    /// 目录项指向不存在的 inode 编号
    BadEntry {
        /// 所在目录
        dir: u32,
        /// 目录项中的 inode 编号
        inode: u32,
    },
    /// inode 记录无法解析（块指针损坏、目录格式错误等）
    InodeCorrupted {
        /// inode 编号
        inode: u32,
    },
}

impl CheckProblem {
    /// 获取问题描述
    pub fn message(&self) -> &'static str {
        match self {
            Self::FreeBlocksMismatch { .. } => "free block counts disagree",
            Self::FreeInodesMismatch { .. } => "free inode counts disagree",
            Self::UsedDirsMismatch { .. } => "used directory count wrong",
            Self::DirectorySpan { .. } => "directory entries do not span block",
            Self::BlockCountMismatch { .. } => "block count does not match size",
            Self::BlockOutOfRange { .. } => "block pointer out of range",
            Self::DuplicateBlock { .. } => "block claimed twice",
            Self::BlockNotMarked { .. } => "block in use but free in bitmap",
            Self::InodeNotMarked { .. } => "inode in use but free in bitmap",
            Self::LeakedBlock { .. } => "block marked but unreferenced",
            Self::LeakedInode { .. } => "inode marked but unreachable",
            Self::LinkCountMismatch { .. } => "link count wrong",
            Self::BadEntry { .. } => "entry points to invalid inode",
            Self::InodeCorrupted { .. } => "inode unreadable",
        }
    }
}

/// 检查结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// 发现的问题，按检查顺序排列
    pub problems: Vec<CheckProblem>,
}

impl CheckReport {
    /// 没有发现任何问题
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// 扫描过程中的状态
struct Checker<'a, B> {
    image: &'a Image<B>,
    mapper: IndirectBlockMapper,
    /// 每个块的所有者 inode（0 表示无）
    owner: Vec<u32>,
    /// 每个 inode 被目录项引用的次数
    refs: Vec<u32>,
    reachable: Vec<bool>,
    dirs: u32,
    problems: Vec<CheckProblem>,
}

impl<'a, B: AsRef<[u8]> + AsMut<[u8]>> Checker<'a, B> {
    fn new(image: &'a Image<B>) -> Self {
        let layout = image.layout();
        Self {
            image,
            mapper: IndirectBlockMapper::new(layout),
            owner: vec![0; layout.blocks_count as usize],
            refs: vec![0; layout.inodes_count as usize + 1],
            reachable: vec![false; layout.inodes_count as usize + 1],
            dirs: 0,
            problems: Vec::new(),
        }
    }

    fn report(&mut self, problem: CheckProblem) {
        log::warn!("[check] {}: {:?}", problem.message(), problem);
        self.problems.push(problem);
    }

    fn inode_in_range(&self, ino: u32) -> bool {
        ino != 0 && ino <= self.image.layout().inodes_count
    }

    /// 块号是否可以作为数据块
    fn is_data_block(&self, block: u32) -> bool {
        let layout = self.image.layout();
        block < layout.blocks_count && !self.is_metadata(block)
    }

    fn is_metadata(&self, block: u32) -> bool {
        let layout = self.image.layout();
        let table_blocks =
            (layout.inodes_count * layout.inode_size as u32).div_ceil(layout.block_size);
        block <= layout.first_data_block
            || block == layout.group_desc_block()
            || block == layout.block_bitmap
            || block == layout.inode_bitmap
            || (layout.inode_table..layout.inode_table + table_blocks).contains(&block)
    }

    fn claim(&mut self, ino: u32, block: u32) {
        if !self.is_data_block(block) {
            self.report(CheckProblem::BlockOutOfRange { inode: ino, block });
            return;
        }
        let first = self.owner[block as usize];
        if first != 0 {
            self.report(CheckProblem::DuplicateBlock { block, first, second: ino });
            return;
        }
        self.owner[block as usize] = ino;
    }

    /// 登记 inode 的全部块并检查块数，返回数据块列表
    fn account_blocks(&mut self, inode: &Inode) -> Option<Vec<u32>> {
        let ino = inode.inode_num();
        let blocks = match self.mapper.blocks_of(self.image, inode) {
            Ok(blocks) => blocks,
            Err(_) => {
                self.report(CheckProblem::InodeCorrupted { inode: ino });
                return None;
            }
        };

        if blocks.len() > EXT2_INODE_DIRECT_BLOCKS {
            self.claim(ino, inode.indirect_block());
        }
        for &block in &blocks {
            self.claim(ino, block);
        }

        let expected = inode.size().div_ceil(self.image.block_size());
        if blocks.len() as u32 != expected {
            self.report(CheckProblem::BlockCountMismatch {
                inode: ino,
                recorded: blocks.len() as u32,
                expected,
            });
        }
        Some(blocks)
    }

    /// 检查每个目录块的 rec_len 链，全部完好时返回 true
    fn check_spans(&mut self, ino: u32, blocks: &[u32]) -> bool {
        let image = self.image;
        let block_size = image.block_size() as usize;
        let mut intact = true;

        for (logical, &block) in blocks.iter().enumerate() {
            let data = match image.block(block) {
                Ok(data) => data,
                Err(_) => {
                    intact = false;
                    continue;
                }
            };

            let mut offset = 0;
            while offset + EXT2_DIR_ENTRY_HEADER_LEN <= block_size {
                let rec_len = ext2_dir_entry::parse(&data[offset..]).rec_len as usize;
                if rec_len < EXT2_DIR_ENTRY_HEADER_LEN
                    || rec_len % EXT2_DIR_ENTRY_ALIGN != 0
                    || offset + rec_len > block_size
                {
                    break;
                }
                offset += rec_len;
            }

            if offset != block_size {
                intact = false;
                self.report(CheckProblem::DirectorySpan {
                    inode: ino,
                    logical_block: logical as u32,
                    span: offset as u32,
                });
            }
        }
        intact
    }

    /// 从根目录出发遍历整棵目录树
    fn walk_tree(&mut self) {
        let mut pending = vec![EXT2_ROOT_INODE];
        self.reachable[EXT2_ROOT_INODE as usize] = true;

        while let Some(ino) = pending.pop() {
            let inode = match Inode::load(self.image, ino) {
                Ok(inode) => inode,
                Err(_) => {
                    self.report(CheckProblem::InodeCorrupted { inode: ino });
                    continue;
                }
            };

            let blocks = match self.account_blocks(&inode) {
                Some(blocks) => blocks,
                None => continue,
            };
            if !inode.is_dir() {
                continue;
            }
            self.dirs += 1;

            if !self.check_spans(ino, &blocks) {
                continue;
            }

            let records = match DirIterator::new(self.image, &inode) {
                Ok(iter) => iter,
                Err(_) => {
                    self.report(CheckProblem::InodeCorrupted { inode: ino });
                    continue;
                }
            };
            for record in records {
                let record = match record {
                    Ok(record) => record,
                    Err(_) => {
                        self.report(CheckProblem::InodeCorrupted { inode: ino });
                        break;
                    }
                };
                if !record.is_live() {
                    continue;
                }

                let child = record.header.inode;
                if !self.inode_in_range(child) {
                    self.report(CheckProblem::BadEntry { dir: ino, inode: child });
                    continue;
                }
                self.refs[child as usize] += 1;

                let is_dot = record.name == b"." || record.name == b"..";
                if !is_dot && !self.reachable[child as usize] {
                    self.reachable[child as usize] = true;
                    pending.push(child);
                }
            }
        }
    }

    fn check_inodes(&mut self) -> Result<()> {
        let image = self.image;
        let layout = *image.layout();
        let bitmap = image.block(layout.inode_bitmap)?;

        for ino in 1..=layout.inodes_count {
            let marked = test_bit(bitmap, ino - 1);
            let reachable = self.reachable[ino as usize];

            if reachable && !marked {
                self.report(CheckProblem::InodeNotMarked { inode: ino });
            }
            if marked && !reachable && ino >= layout.first_ino {
                self.report(CheckProblem::LeakedInode { inode: ino });
            }
            if reachable {
                let inode = Inode::load(image, ino)?;
                let counted = self.refs[ino as usize];
                if inode.links_count() as u32 != counted {
                    self.report(CheckProblem::LinkCountMismatch {
                        inode: ino,
                        recorded: inode.links_count(),
                        counted,
                    });
                }
            }
        }
        Ok(())
    }

    fn check_blocks(&mut self) -> Result<()> {
        let image = self.image;
        let layout = *image.layout();
        let bitmap = image.block(layout.block_bitmap)?;

        for block in layout.first_data_block..layout.blocks_count {
            let marked = test_bit(bitmap, block - layout.first_data_block);
            let owner = self.owner[block as usize];
            let referenced = owner != 0 || self.is_metadata(block);

            if referenced && !marked {
                self.report(CheckProblem::BlockNotMarked { inode: owner, block });
            }
            if marked && !referenced {
                self.report(CheckProblem::LeakedBlock { block });
            }
        }
        Ok(())
    }

    fn check_counters(&mut self) -> Result<()> {
        let layout = *self.image.layout();
        let sb = Superblock::load(self.image)?;
        let bg = BlockGroup::load(self.image)?;

        let block_bits = layout.blocks_count - layout.first_data_block;
        let free_blocks =
            block_bits - count_ones(self.image.block(layout.block_bitmap)?, 0, block_bits);
        if sb.free_blocks_count() != free_blocks || bg.free_blocks_count() != free_blocks {
            self.report(CheckProblem::FreeBlocksMismatch {
                superblock: sb.free_blocks_count(),
                group: bg.free_blocks_count(),
                bitmap: free_blocks,
            });
        }

        let free_inodes = layout.inodes_count
            - count_ones(self.image.block(layout.inode_bitmap)?, 0, layout.inodes_count);
        if sb.free_inodes_count() != free_inodes || bg.free_inodes_count() != free_inodes {
            self.report(CheckProblem::FreeInodesMismatch {
                superblock: sb.free_inodes_count(),
                group: bg.free_inodes_count(),
                bitmap: free_inodes,
            });
        }

        if bg.used_dirs_count() != self.dirs {
            self.report(CheckProblem::UsedDirsMismatch {
                group: bg.used_dirs_count(),
                counted: self.dirs,
            });
        }
        Ok(())
    }
}

/// 检查镜像一致性
///
/// # 参数
///
/// * `image` - 镜像句柄（只读）
///
/// # 返回
///
/// 检查报告；只有 superblock、块组描述符或位图本身无法读取时才返回错误
pub fn check_image<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>) -> Result<CheckReport> {
    let mut checker = Checker::new(image);

    checker.walk_tree();
    checker.check_counters()?;
    checker.check_inodes()?;
    checker.check_blocks()?;

    log::debug!("[check] {} problem(s) found", checker.problems.len());
    Ok(CheckReport {
        problems: checker.problems,
    })
}
