//! 路径查找
//!
//! 从根 inode 出发，按 `/` 切分路径逐级查找。空组件被忽略，
//! 因此开头、结尾和连续的 `/` 都等价于单个分隔符。
//! 符号链接不会被跟随，`.` 和 `..` 只按字面名称查找。

use crate::{
    block::Image,
    consts::*,
    error::{Error, ErrorKind, Result},
    inode::Inode,
};

use super::{entry::DirEntry, lookup::find};

/// 目录项是否指向目录
///
/// 优先使用目录项中的类型；类型未知时读取 inode 的 mode。
pub fn entry_is_dir<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>, entry: &DirEntry) -> Result<bool> {
    if entry.file_type != EXT2_DE_UNKNOWN {
        return Ok(entry.is_dir());
    }
    Ok(Inode::load(image, entry.inode)?.is_dir())
}

/// 解析路径
///
/// # 参数
///
/// * `image` - 镜像句柄
/// * `path` - 绝对路径
///
/// # 返回
///
/// - `Ok(Some(entry))` - 路径最后一个组件对应的目录项；`/` 返回根目录的 `.` 项
/// - `Ok(None)` - 某个组件不存在，或需要穿过非目录
pub fn resolve<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>, path: &str) -> Result<Option<DirEntry>> {
    if path.is_empty() {
        return Err(Error::new(ErrorKind::InvalidInput, "Empty path"));
    }

    let mut components = path.split('/').filter(|s| !s.is_empty()).peekable();

    if components.peek().is_none() {
        let root = Inode::load(image, EXT2_ROOT_INODE)?;
        return match find(image, &root, ".")? {
            Some(entry) => Ok(Some(entry)),
            None => Err(Error::new(
                ErrorKind::Corrupted,
                "Root directory has no '.' entry",
            )),
        };
    }

    let mut current = EXT2_ROOT_INODE;
    while let Some(component) = components.next() {
        let dir = Inode::load(image, current)?;
        let entry = match find(image, &dir, component)? {
            Some(entry) => entry,
            None => {
                log::trace!("[path] '{}' not found in inode {}", component, current);
                return Ok(None);
            }
        };

        if components.peek().is_none() {
            return Ok(Some(entry));
        }

        if !entry_is_dir(image, &entry)? {
            log::trace!("[path] '{}' is not a directory", component);
            return Ok(None);
        }
        current = entry.inode;
    }

    Ok(None)
}

/// 根据路径查找目录项
///
/// # 错误
///
/// 路径不存在返回 `ErrorKind::NotFound`
///
/// # 示例
///
/// ```ignore
/// let entry = navigate(&image, "/a/file.txt")?;
/// let inode = Inode::load(&image, entry.inode)?;
/// ```
pub fn navigate<B: AsRef<[u8]> + AsMut<[u8]>>(image: &Image<B>, path: &str) -> Result<DirEntry> {
    resolve(image, path)?.ok_or(Error::new(ErrorKind::NotFound, "Path not found"))
}

fn trim_trailing(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// 去掉最后一个组件后的路径
///
/// `/a/b` → `/a`，`/a` → `/`，`/` → `/`
pub fn parent_of(path: &str) -> &str {
    let path = trim_trailing(path);
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => trim_trailing(&path[..i]),
    }
}

/// 路径的最后一个组件
///
/// `/a/b/` → `b`，`/` → 空字符串
pub fn basename(path: &str) -> &str {
    let path = trim_trailing(path);
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}
