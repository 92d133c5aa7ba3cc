//! Ext2 镜像文件系统核心结构

use alloc::{string::String, vec::Vec};
use core::marker::PhantomData;

use crate::{
    block::Image,
    block_group::BlockGroup,
    dir::{self, basename, entry_is_dir, parent_of, read_dir, resolve, DirEntry},
    error::{Error, ErrorKind, Result},
    ialloc::free_inode,
    indirect::IndirectBlockMapper,
    inode::Inode,
    superblock::Superblock,
};

use super::{
    metadata::FileMetadata,
    types::{timestamp, FileMode, FsConfig, InodeType, NoClockHal, StatFs, SystemHal},
};

/// Ext2 镜像文件系统
///
/// 持有镜像缓冲区，所有操作都直接读写其中的磁盘结构。
/// `H` 提供写入时间戳用的时钟。
///
/// # 示例
///
/// ```rust,ignore
/// use ext2img_core::{Ext2FileSystem, mkfs::{self, MkfsOptions}};
///
/// let mut buf = vec![0u8; 128 * 1024];
/// mkfs::format(&mut buf, &MkfsOptions::default())?;
/// let mut fs = Ext2FileSystem::open(buf)?;
///
/// fs.mkdir("/a")?;
/// fs.copy_in("file.txt", b"hello", "/a")?;
/// fs.ln("/a/file.txt", "/a/soft.txt", true)?;
///
/// for name in fs.list("/a", false)? {
///     println!("{}", name);
/// }
///
/// fs.remove("/a", true)?;
/// let buf = fs.into_inner();
/// ```
pub struct Ext2FileSystem<B, H: SystemHal = NoClockHal> {
    image: Image<B>,
    config: FsConfig,
    _hal: PhantomData<H>,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Ext2FileSystem<B> {
    /// 使用默认配置打开镜像，时间戳写 0
    ///
    /// # 错误
    ///
    /// 同 [`Image::open`]
    pub fn open(buf: B) -> Result<Self> {
        Self::with_config(buf, FsConfig::default())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>, H: SystemHal> Ext2FileSystem<B, H> {
    /// 使用指定配置打开镜像
    ///
    /// # 参数
    ///
    /// * `buf` - 镜像缓冲区
    /// * `config` - 新建 inode 使用的权限和所有者
    pub fn with_config(buf: B, config: FsConfig) -> Result<Self> {
        let image = Image::open(buf)?;
        Ok(Self {
            image,
            config,
            _hal: PhantomData,
        })
    }

    /// 取回镜像缓冲区
    pub fn into_inner(self) -> B {
        self.image.into_inner()
    }

    /// 获取镜像句柄
    pub fn image(&self) -> &Image<B> {
        &self.image
    }

    /// 获取配置
    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    fn mapper(&self) -> IndirectBlockMapper {
        IndirectBlockMapper::new(self.image.layout())
    }

    //=========================================================================
    // 查询
    //=========================================================================

    /// 根据路径查找目录项
    ///
    /// # 错误
    ///
    /// 路径不存在返回 `ErrorKind::NotFound`
    pub fn navigate(&self, path: &str) -> Result<DirEntry> {
        dir::navigate(&self.image, path)
    }

    /// 获取文件系统统计信息
    pub fn stat_fs(&self) -> Result<StatFs> {
        let sb = Superblock::load(&self.image)?;
        let bg = BlockGroup::load(&self.image)?;

        Ok(StatFs {
            inodes_count: sb.inodes_count(),
            free_inodes_count: sb.free_inodes_count(),
            blocks_count: sb.blocks_count(),
            free_blocks_count: sb.free_blocks_count(),
            block_size: sb.block_size(),
            used_dirs_count: bg.used_dirs_count(),
        })
    }

    /// 获取文件元数据
    ///
    /// 符号链接不会被跟随，返回的是链接本身的元数据。
    pub fn metadata(&self, path: &str) -> Result<FileMetadata> {
        let entry = self.navigate(path)?;
        let inode = Inode::load(&self.image, entry.inode)?;
        Ok(FileMetadata::from_inode(&inode))
    }

    /// 读取普通文件的全部内容
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NotFound` - 路径不存在
    /// - `ErrorKind::IsADirectory` - 路径是目录
    /// - `ErrorKind::InvalidInput` - 路径是符号链接或特殊文件
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self.navigate(path)?;
        let inode = Inode::load(&self.image, entry.inode)?;

        if inode.is_dir() {
            return Err(Error::new(ErrorKind::IsADirectory, "Cannot read a directory"));
        }
        if !inode.is_file() {
            return Err(Error::new(ErrorKind::InvalidInput, "Not a regular file"));
        }
        self.read_content(&inode)
    }

    /// 读取符号链接保存的目标路径
    ///
    /// # 错误
    ///
    /// 路径不是符号链接返回 `ErrorKind::InvalidInput`
    pub fn read_link(&self, path: &str) -> Result<String> {
        let entry = self.navigate(path)?;
        let inode = Inode::load(&self.image, entry.inode)?;

        if !inode.is_symlink() {
            return Err(Error::new(ErrorKind::InvalidInput, "Not a symbolic link"));
        }
        let content = self.read_content(&inode)?;
        Ok(String::from_utf8_lossy(&content).into_owned())
    }

    /// inode 数据块中前 `i_size` 字节
    fn read_content(&self, inode: &Inode) -> Result<Vec<u8>> {
        let block_size = self.image.block_size() as usize;
        let blocks = self.mapper().blocks_of(&self.image, inode)?;
        let size = inode.size() as usize;

        if size > blocks.len() * block_size {
            log::error!(
                "[fs] inode {} size {} exceeds its {} blocks",
                inode.inode_num(),
                size,
                blocks.len()
            );
            return Err(Error::new(ErrorKind::Corrupted, "File size exceeds allocated blocks"));
        }

        let mut content = Vec::with_capacity(size);
        for block in blocks {
            let remaining = size - content.len();
            if remaining == 0 {
                break;
            }
            let data = self.image.block(block)?;
            content.extend_from_slice(&data[..remaining.min(block_size)]);
        }
        Ok(content)
    }

    /// 列出目录项
    ///
    /// # 参数
    ///
    /// * `path` - 目录或文件路径
    /// * `show_dotfiles` - 是否包含 `.` 和 `..`
    ///
    /// # 返回
    ///
    /// 目录按磁盘顺序返回各条目；非目录只返回它自己的目录项
    pub fn list_entries(&self, path: &str, show_dotfiles: bool) -> Result<Vec<DirEntry>> {
        let entry = self.navigate(path)?;
        if !entry_is_dir(&self.image, &entry)? {
            return Ok(alloc::vec![entry]);
        }

        let dir = Inode::load(&self.image, entry.inode)?;
        let entries = read_dir(&self.image, &dir)?
            .into_iter()
            .filter(|e| show_dotfiles || !e.is_dot())
            .collect();
        Ok(entries)
    }

    /// 列出名称
    ///
    /// 同 [`list_entries`](Self::list_entries)，只保留名称。
    pub fn list(&self, path: &str, show_dotfiles: bool) -> Result<Vec<String>> {
        Ok(self
            .list_entries(path, show_dotfiles)?
            .into_iter()
            .map(|e| e.name)
            .collect())
    }

    //=========================================================================
    // 内部辅助
    //=========================================================================

    /// 加载路径指向的目录
    fn load_dir(&self, path: &str) -> Result<Inode> {
        let entry = self.navigate(path)?;
        if !entry_is_dir(&self.image, &entry)? {
            return Err(Error::new(ErrorKind::NotADirectory, "Parent is not a directory"));
        }
        Inode::load(&self.image, entry.inode)
    }

    /// 检查新条目的路径并加载其父目录
    ///
    /// # 返回
    ///
    /// (父目录 inode, 新条目名称)
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 路径没有最后一个组件
    /// - `ErrorKind::AlreadyExists` - 路径已存在
    /// - `ErrorKind::NotFound` / `ErrorKind::NotADirectory` - 父目录不存在或不是目录
    fn creation_target<'p>(&self, path: &'p str) -> Result<(Inode, &'p str)> {
        let name = basename(path);
        if name.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "Path has no final component"));
        }
        if resolve(&self.image, path)?.is_some() {
            return Err(Error::new(ErrorKind::AlreadyExists, "File or directory already exists"));
        }
        let parent = self.load_dir(parent_of(path))?;
        Ok((parent, name))
    }

    /// 初始化 dir::insert 刚分配的 inode
    fn init_inode(&mut self, inode_num: u32, inode_type: InodeType, perm: FileMode) -> Result<Inode> {
        let mut inode = Inode::load(&self.image, inode_num)?;
        inode.set_mode(inode_type.to_mode_bits(), perm.bits());
        inode.set_owner(self.config.uid, self.config.gid);
        inode.set_links_count(if inode_type.is_dir() { 2 } else { 1 });
        inode.touch(timestamp::<H>());
        inode.write(&mut self.image)?;
        Ok(inode)
    }

    /// 按块写入内容，inode 中原有的块必须已经释放
    ///
    /// 中途空间不足时，已写入的部分保留，`i_size` 记录实际写入的字节数。
    fn write_content(&mut self, inode: &mut Inode, data: &[u8]) -> Result<()> {
        let mapper = self.mapper();
        let block_size = self.image.block_size() as usize;

        let mut written = 0;
        for chunk in data.chunks(block_size) {
            let block = match mapper.grow_by_one_block(&mut self.image, inode) {
                Ok(block) => block,
                Err(e) => {
                    log::warn!(
                        "[fs] inode {}: stopped after {} of {} bytes",
                        inode.inode_num(),
                        written,
                        data.len()
                    );
                    inode.set_size(written as u32);
                    inode.write(&mut self.image)?;
                    return Err(e);
                }
            };
            self.image.block_mut(block)?[..chunk.len()].copy_from_slice(chunk);
            written += chunk.len();
        }

        inode.set_size(data.len() as u32);
        inode.set_mtime(timestamp::<H>());
        inode.write(&mut self.image)
    }

    /// 回收 inode：释放全部块、记录删除时间并清除位图
    fn release_inode(&mut self, inode: &mut Inode) -> Result<()> {
        self.mapper().release_all_blocks(&mut self.image, inode)?;
        inode.set_size(0);
        inode.set_links_count(0);
        inode.set_dtime(timestamp::<H>());
        inode.write(&mut self.image)?;
        free_inode(&mut self.image, inode.inode_num(), inode.is_dir())
    }

    /// 撤销刚创建但没能填充的条目
    fn discard_new(&mut self, parent: &mut Inode, name: &str, inode: &mut Inode) -> Result<()> {
        log::warn!("[fs] discarding half-created '{}' (inode {})", name, inode.inode_num());
        dir::remove(&mut self.image, parent, name.as_bytes())?;
        self.release_inode(inode)
    }

    /// 写入新目录的 `.` 和 `..`
    fn add_dot_entries(&mut self, dir: &mut Inode, parent: u32) -> Result<()> {
        let self_num = dir.inode_num();
        dir::insert_with_inode(&mut self.image, dir, ".", InodeType::Directory, self_num)?;
        dir::insert_with_inode(&mut self.image, dir, "..", InodeType::Directory, parent)?;
        dir.write(&mut self.image)
    }

    fn touch_dir(&mut self, dir: &mut Inode) -> Result<()> {
        dir.set_mtime(timestamp::<H>());
        dir.write(&mut self.image)
    }

    //=========================================================================
    // 修改操作
    //=========================================================================

    /// 把外部内容写入镜像
    ///
    /// # 参数
    ///
    /// * `src_name` - 源文件名（目标是目录时取其最后一个组件作为新名称）
    /// * `data` - 文件内容
    /// * `dest` - 目标路径：已有目录、已有普通文件，或父目录存在的新路径
    ///
    /// # 返回
    ///
    /// 写入的 inode 编号
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NoSpace` - 内容超过单个 inode 的容量，或块/inode 用尽
    /// - `ErrorKind::NotFound` - 目标的父目录不存在
    /// - `ErrorKind::IsADirectory` - 要覆盖的条目是目录
    /// - `ErrorKind::InvalidInput` - 要覆盖的条目不是普通文件，或无法确定新名称
    pub fn copy_in(&mut self, src_name: &str, data: &[u8], dest: &str) -> Result<u32> {
        let capacity = self.mapper().max_data_blocks() as usize * self.image.block_size() as usize;
        if data.len() > capacity {
            return Err(Error::new(ErrorKind::NoSpace, "File exceeds single indirect capacity"));
        }

        let inode_num = match resolve(&self.image, dest)? {
            Some(entry) if entry_is_dir(&self.image, &entry)? => {
                let name = basename(src_name);
                if name.is_empty() {
                    return Err(Error::new(ErrorKind::InvalidInput, "Source has no file name"));
                }
                let mut dir = Inode::load(&self.image, entry.inode)?;
                match dir::find(&self.image, &dir, name)? {
                    Some(existing) => self.overwrite(&existing, data)?,
                    None => self.create_file(&mut dir, name, data)?,
                }
            }
            Some(entry) => self.overwrite(&entry, data)?,
            None => {
                let name = basename(dest);
                if name.is_empty() {
                    return Err(Error::new(ErrorKind::InvalidInput, "Destination has no file name"));
                }
                let mut parent = self.load_dir(parent_of(dest))?;
                self.create_file(&mut parent, name, data)?
            }
        };

        log::info!(
            "[fs] copied {} bytes to '{}' (inode {})",
            data.len(),
            dest,
            inode_num
        );
        Ok(inode_num)
    }

    fn create_file(&mut self, parent: &mut Inode, name: &str, data: &[u8]) -> Result<u32> {
        let inode_num = dir::insert(&mut self.image, parent, name, InodeType::RegularFile)?;
        let mut inode = self.init_inode(inode_num, InodeType::RegularFile, self.config.file_mode)?;
        self.write_content(&mut inode, data)?;
        self.touch_dir(parent)?;
        Ok(inode_num)
    }

    fn overwrite(&mut self, entry: &DirEntry, data: &[u8]) -> Result<u32> {
        let mut inode = Inode::load(&self.image, entry.inode)?;
        if inode.is_dir() {
            return Err(Error::new(ErrorKind::IsADirectory, "Destination is a directory"));
        }
        if !inode.is_file() {
            return Err(Error::new(ErrorKind::InvalidInput, "Destination is not a regular file"));
        }

        self.mapper().release_all_blocks(&mut self.image, &mut inode)?;
        inode.set_size(0);
        self.write_content(&mut inode, data)?;
        Ok(entry.inode)
    }

    /// 创建硬链接
    ///
    /// # 参数
    ///
    /// * `existing` - 已有文件
    /// * `new_path` - 新名称
    ///
    /// # 错误
    ///
    /// - `ErrorKind::AlreadyExists` - 新名称已存在
    /// - `ErrorKind::NotFound` - 新名称的父目录或已有文件不存在
    /// - `ErrorKind::IsADirectory` - 已有文件是目录
    pub fn link(&mut self, existing: &str, new_path: &str) -> Result<()> {
        let (mut parent, name) = self.creation_target(new_path)?;
        let target = self.navigate(existing)?;

        let mut inode = Inode::load(&self.image, target.inode)?;
        if inode.is_dir() {
            return Err(Error::new(ErrorKind::IsADirectory, "Cannot hard link a directory"));
        }

        dir::insert_with_inode(&mut self.image, &mut parent, name, inode.inode_type(), target.inode)?;
        inode.inc_links();
        inode.write(&mut self.image)?;
        self.touch_dir(&mut parent)?;

        log::info!(
            "[fs] linked '{}' -> inode {} (links={})",
            new_path,
            target.inode,
            inode.links_count()
        );
        Ok(())
    }

    /// 创建符号链接
    ///
    /// 目标路径去掉首尾的 `/` 后写入新 inode 的唯一数据块。
    /// 目标必须存在，但不会被跟随。
    ///
    /// # 返回
    ///
    /// 符号链接的 inode 编号
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 目标文本为空或超过一个块
    /// - 其余同 [`link`](Self::link)，但允许指向目录
    pub fn symlink(&mut self, existing: &str, new_path: &str) -> Result<u32> {
        let text = existing.trim_matches('/');
        if text.is_empty() || text.len() > self.image.block_size() as usize {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Symlink target empty or longer than a block",
            ));
        }

        let (mut parent, name) = self.creation_target(new_path)?;
        self.navigate(existing)?;

        let inode_num = dir::insert(&mut self.image, &mut parent, name, InodeType::Symlink)?;
        let mut inode = self.init_inode(inode_num, InodeType::Symlink, self.config.symlink_mode)?;
        if let Err(e) = self.write_content(&mut inode, text.as_bytes()) {
            self.discard_new(&mut parent, name, &mut inode)?;
            return Err(e);
        }
        self.touch_dir(&mut parent)?;

        log::info!("[fs] symlink '{}' -> '{}' (inode {})", new_path, text, inode_num);
        Ok(inode_num)
    }

    /// `ln` 风格入口
    pub fn ln(&mut self, existing: &str, new_path: &str, symbolic: bool) -> Result<()> {
        if symbolic {
            self.symlink(existing, new_path).map(|_| ())
        } else {
            self.link(existing, new_path)
        }
    }

    /// 删除文件或目录
    ///
    /// 文件和符号链接：删除目录项并减少链接数，链接数归零时回收 inode。
    /// 目录：只有 `recursive` 时才删除，先删除全部子项。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 删除根目录或 `.`/`..`
    /// - `ErrorKind::NotFound` - 路径不存在
    /// - `ErrorKind::IsADirectory` - 目录但没有指定 `recursive`
    ///
    /// # 注意
    ///
    /// 递归删除中途失败时已删除的部分不会恢复
    pub fn remove(&mut self, path: &str, recursive: bool) -> Result<()> {
        let name = basename(path);
        if name.is_empty() || name == "." || name == ".." {
            return Err(Error::new(ErrorKind::InvalidInput, "Cannot remove this path"));
        }

        let entry = self.navigate(path)?;
        let mut parent = self.load_dir(parent_of(path))?;

        if entry_is_dir(&self.image, &entry)? {
            if !recursive {
                return Err(Error::new(ErrorKind::IsADirectory, "Is a directory"));
            }
            self.remove_tree(&mut parent, &entry)?;
        } else {
            self.remove_file(&mut parent, &entry)?;
        }
        self.touch_dir(&mut parent)?;

        log::info!("[fs] removed '{}' (inode {})", path, entry.inode);
        Ok(())
    }

    fn remove_file(&mut self, parent: &mut Inode, entry: &DirEntry) -> Result<()> {
        dir::remove(&mut self.image, parent, &entry.raw_name)?;

        let mut inode = Inode::load(&self.image, entry.inode)?;
        if inode.dec_links() == 0 {
            self.release_inode(&mut inode)
        } else {
            inode.write(&mut self.image)
        }
    }

    fn remove_tree(&mut self, parent: &mut Inode, entry: &DirEntry) -> Result<()> {
        let mut dir = Inode::load(&self.image, entry.inode)?;

        let children: Vec<DirEntry> = read_dir(&self.image, &dir)?
            .into_iter()
            .filter(|e| !e.is_dot())
            .collect();
        for child in &children {
            if entry_is_dir(&self.image, child)? {
                self.remove_tree(&mut dir, child)?;
            } else {
                self.remove_file(&mut dir, child)?;
            }
        }

        // 子目录的 ".." 指向父目录
        parent.dec_links();
        self.release_inode(&mut dir)?;
        dir::remove(&mut self.image, parent, &entry.raw_name)?;
        parent.write(&mut self.image)?;

        log::debug!(
            "[fs] removed directory '{}' with {} children",
            entry.name,
            children.len()
        );
        Ok(())
    }

    /// 创建目录
    ///
    /// 新目录包含 `.` 和 `..` 两项，链接数为 2，父目录链接数加一。
    ///
    /// # 返回
    ///
    /// 新目录的 inode 编号
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 路径为 `/` 或以 `/` 结尾
    /// - `ErrorKind::AlreadyExists` - 路径已存在
    /// - `ErrorKind::NotFound` / `ErrorKind::NotADirectory` - 父目录不存在或不是目录
    pub fn mkdir(&mut self, path: &str) -> Result<u32> {
        if path.is_empty() || path.ends_with('/') {
            return Err(Error::new(ErrorKind::InvalidInput, "Directory name required"));
        }

        let (mut parent, name) = self.creation_target(path)?;

        let inode_num = dir::insert(&mut self.image, &mut parent, name, InodeType::Directory)?;
        let mut child = self.init_inode(inode_num, InodeType::Directory, self.config.dir_mode)?;
        if let Err(e) = self.add_dot_entries(&mut child, parent.inode_num()) {
            self.discard_new(&mut parent, name, &mut child)?;
            return Err(e);
        }

        parent.inc_links();
        self.touch_dir(&mut parent)?;

        log::info!("[fs] created directory '{}' (inode {})", path, inode_num);
        Ok(inode_num)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>, H: SystemHal> core::fmt::Debug for Ext2FileSystem<B, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ext2FileSystem")
            .field("layout", self.image.layout())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkfs::{self, MkfsOptions};
    use alloc::string::ToString;
    use alloc::vec;

    fn fresh() -> Ext2FileSystem<Vec<u8>> {
        let mut buf = vec![0u8; 128 * 1024];
        mkfs::format(&mut buf, &MkfsOptions::default()).unwrap();
        Ext2FileSystem::open(buf).unwrap()
    }

    #[test]
    fn test_stat_fs() {
        let fs = fresh();
        let stat = fs.stat_fs().unwrap();
        assert_eq!(stat.block_size, 1024);
        assert_eq!(stat.blocks_count, 128);
        assert_eq!(stat.free_blocks_count, 117);
        assert_eq!(stat.inodes_count, 32);
        assert_eq!(stat.free_inodes_count, 21);
        assert_eq!(stat.used_dirs_count, 2);
    }

    #[test]
    fn test_metadata_of_root() {
        let fs = fresh();
        let meta = fs.metadata("/").unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.inode_num, 2);
        assert_eq!(meta.links_count, 3);
        assert_eq!(meta.permissions, 0o755);
    }

    #[test]
    fn test_list_file_returns_own_name() {
        let mut fs = fresh();
        fs.copy_in("notes.txt", b"abc", "/").unwrap();
        assert_eq!(fs.list("/notes.txt", true).unwrap(), vec!["notes.txt"]);
        assert_eq!(
            fs.list("/", false).unwrap(),
            vec!["lost+found", "notes.txt"]
        );
    }

    #[test]
    fn test_new_inode_uses_config() {
        let mut buf = vec![0u8; 128 * 1024];
        mkfs::format(&mut buf, &MkfsOptions::default()).unwrap();
        let config = FsConfig {
            file_mode: FileMode::U_READ | FileMode::U_WRITE,
            uid: 1000,
            gid: 1000,
            ..FsConfig::default()
        };
        let mut fs: Ext2FileSystem<Vec<u8>> = Ext2FileSystem::with_config(buf, config).unwrap();

        fs.copy_in("secret", b"x", "/secret").unwrap();
        let meta = fs.metadata("/secret").unwrap();
        assert_eq!(meta.permissions, 0o600);
        assert_eq!((meta.uid, meta.gid), (1000, 1000));
    }

    #[test]
    fn test_copy_in_overwrite_releases_old_blocks() {
        let mut fs = fresh();
        let ino = fs.copy_in("f", &[1u8; 5000], "/f").unwrap();
        let free_after_first = fs.stat_fs().unwrap().free_blocks_count;

        let again = fs.copy_in("f", &[2u8; 100], "/").unwrap();
        assert_eq!(again, ino);
        assert_eq!(fs.read_file("/f").unwrap(), vec![2u8; 100]);
        assert_eq!(fs.stat_fs().unwrap().free_blocks_count, free_after_first + 4);
    }

    #[test]
    fn test_copy_in_too_large() {
        let mut fs = fresh();
        let too_big = vec![0u8; (12 + 256) * 1024 + 1];
        let err = fs.copy_in("big", &too_big, "/").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSpace);
        assert!(fs.list("/", false).unwrap().iter().all(|n| n != "big"));
    }

    #[test]
    fn test_copy_in_errors() {
        let mut fs = fresh();
        assert_eq!(
            fs.copy_in("f", b"x", "/missing/f").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            fs.copy_in("lost+found", b"x", "/").unwrap_err().kind(),
            ErrorKind::IsADirectory
        );
        fs.copy_in("f", b"x", "/f").unwrap();
        assert_eq!(
            fs.copy_in("g", b"x", "/f/g").unwrap_err().kind(),
            ErrorKind::NotADirectory
        );
    }

    #[test]
    fn test_read_file_on_directory() {
        let fs = fresh();
        assert_eq!(
            fs.read_file("/lost+found").unwrap_err().kind(),
            ErrorKind::IsADirectory
        );
    }

    #[test]
    fn test_mkdir_rejects_bad_paths() {
        let mut fs = fresh();
        assert_eq!(fs.mkdir("/").unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(fs.mkdir("/a/").unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(
            fs.mkdir("/lost+found").unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(fs.mkdir("/x/y").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_remove_rejects_root_and_dirs() {
        let mut fs = fresh();
        assert_eq!(fs.remove("/", true).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(
            fs.remove("/lost+found/..", true).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            fs.remove("/lost+found", false).unwrap_err().kind(),
            ErrorKind::IsADirectory
        );
        assert_eq!(fs.remove("/nope", false).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_symlink_rejects_missing_or_empty_target() {
        let mut fs = fresh();
        assert_eq!(
            fs.symlink("/nope", "/l").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(fs.symlink("/", "/l").unwrap_err().kind(), ErrorKind::InvalidInput);
        // 失败后没有残留
        assert_eq!(fs.stat_fs().unwrap().free_inodes_count, 21);
    }

    #[test]
    fn test_hard_link_errors() {
        let mut fs = fresh();
        fs.copy_in("f", b"x", "/f").unwrap();
        assert_eq!(
            fs.link("/f", "/lost+found").unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(fs.link("/f", "/no/g").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(fs.link("/nope", "/g").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            fs.link("/lost+found", "/g").unwrap_err().kind(),
            ErrorKind::IsADirectory
        );
        assert_eq!(
            fs.link("/f", "/f/g").unwrap_err().kind(),
            ErrorKind::NotADirectory
        );
    }

    #[test]
    fn test_error_leaves_to_string() {
        let mut fs = fresh();
        let err = fs.mkdir("/lost+found").unwrap_err();
        assert_eq!(err.to_string(), "AlreadyExists: File or directory already exists");
    }
}
