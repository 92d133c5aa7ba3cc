//! 目录内按名称查找

use crate::{block::Image, error::Result, inode::Inode};

use super::{
    entry::{DirEntry, DirRecord},
    iterator::walk,
};

/// 在目录中查找名称完全相同的有效目录项（按字节比较）
///
/// # 参数
///
/// * `image` - 镜像句柄
/// * `dir` - 目录 inode
/// * `name` - 要查找的文件名（原始字节）
///
/// # 返回
///
/// 找到的目录项记录（带位置信息），不存在返回 `None`
pub fn find_record<B: AsRef<[u8]> + AsMut<[u8]>>(
    image: &Image<B>,
    dir: &Inode,
    name: &[u8],
) -> Result<Option<DirRecord>> {
    walk(image, dir, |record| record.is_live() && record.name == name)
}

/// 在目录中查找指定名称的条目
pub fn find<B: AsRef<[u8]> + AsMut<[u8]>>(
    image: &Image<B>,
    dir: &Inode,
    name: &str,
) -> Result<Option<DirEntry>> {
    Ok(find_record(image, dir, name.as_bytes())?.map(|record| record.to_entry()))
}
