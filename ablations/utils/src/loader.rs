//! 对 `ct-nav::dataset` 的更一层封装. 提供更直接的数据集加载器.

use ct_nav::dataset::{self, RawVolumeLoader};
use std::env;
use std::io;
use std::path::{Path, PathBuf};

/// 获取原始体数据目录.
///
/// 1. 若环境变量 `$CT_NAV_VOLUME_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/ct-nav`;
/// 3. 连主目录都无法确定时返回 `None`.
pub fn volume_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var("CT_NAV_VOLUME_DIR") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dataset::home_dataset_dir_with(["ct-nav"]),
    }
}

/// 获取原始体数据加载器.
#[inline]
pub fn volume_loader<P: AsRef<Path>>(path: P) -> io::Result<RawVolumeLoader> {
    dataset::raw_loader(path)
}

/// 预览图输出目录. 仅当环境变量 `$CT_NAV_PREVIEW_DIR` 非空时才输出预览.
pub fn preview_dir_from_env() -> Option<PathBuf> {
    env::var("CT_NAV_PREVIEW_DIR")
        .ok()
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
}
