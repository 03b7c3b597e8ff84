//! 数据集操作.
//!
//! 提供迭代器风格的原始体数据获取模式.

use crate::consts::STANDARD_SHAPE;
use crate::{CtScan, LoadResult, Shape3d};
use std::io;
use std::path::{Path, PathBuf};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 文件名是否为原始体数据 (`*.raw` 或 `*.raw.gz`).
pub fn is_raw_volume(name: &str) -> bool {
    name.ends_with(".raw") || name.ends_with(".raw.gz")
}

/// 扫描目录 `path`, 创建标准形状的原始体数据加载器. 见 [`raw_loader_with_shape`].
#[inline]
pub fn raw_loader<P: AsRef<Path>>(path: P) -> io::Result<RawVolumeLoader> {
    raw_loader_with_shape(path, STANDARD_SHAPE)
}

/// 扫描目录 `path`, 创建原始体数据加载器.
///
/// 只收集 `path` 下 (不递归) 文件名形如 `*.raw` 或 `*.raw.gz` 的文件, 按文件名升序加载.
/// 目录本身无法读取时返回 `Err`; 单个文件加载失败时, 加载器在迭代时返回对应的 `Err`.
pub fn raw_loader_with_shape<P: AsRef<Path>>(
    path: P,
    shape: Shape3d,
) -> io::Result<RawVolumeLoader> {
    let path = path.as_ref().to_owned();
    let mut names = Vec::new();
    for entry in std::fs::read_dir(&path)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str().filter(|n| is_raw_volume(n)) {
            names.push(name.to_owned());
        }
    }
    names.sort_unstable_by(|a, b| b.cmp(a));

    Ok(RawVolumeLoader {
        path,
        names_rev: names,
        shape,
    })
}

/// 原始体数据加载器. 每次迭代产出 `(文件名, 加载结果)`.
#[derive(Debug)]
pub struct RawVolumeLoader {
    path: PathBuf,
    names_rev: Vec<String>,
    shape: Shape3d,
}

impl Iterator for RawVolumeLoader {
    type Item = (String, LoadResult<CtScan>);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names_rev.pop()?;

        self.path.push(&name);
        let data = CtScan::open_with_shape(self.path.as_path(), self.shape);
        self.path.pop();

        Some((name, data))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl ExactSizeIterator for RawVolumeLoader {
    #[inline]
    fn len(&self) -> usize {
        self.names_rev.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{is_raw_volume, raw_loader_with_shape};
    use crate::LoadError;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn bytes(n: usize, v: i16) -> Vec<u8> {
        (0..n).flat_map(|_| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_is_raw_volume() {
        assert!(is_raw_volume("a.raw"));
        assert!(is_raw_volume("b.raw.gz"));
        assert!(!is_raw_volume("c.gz"));
        assert!(!is_raw_volume("d.nii"));
    }

    #[test]
    fn test_raw_loader_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let shape = (2, 3, 4);
        std::fs::write(dir.path().join("b.raw"), bytes(24, 7)).unwrap();
        std::fs::write(dir.path().join("a.raw"), bytes(20, 7)).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        std::fs::create_dir(dir.path().join("sub.raw")).unwrap();

        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(&bytes(24, -5)).unwrap();
        std::fs::write(dir.path().join("c.raw.gz"), gz.finish().unwrap()).unwrap();

        let loader = raw_loader_with_shape(dir.path(), shape).unwrap();
        assert_eq!(loader.len(), 3);
        let items: Vec<_> = loader.collect();
        let names: Vec<&str> = items.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a.raw", "b.raw", "c.raw.gz"]);

        assert!(matches!(
            items[0].1,
            Err(LoadError::SizeMismatch {
                expected: 48,
                actual: 40
            })
        ));
        let b = items[1].1.as_ref().unwrap();
        assert_eq!(b.shape(), shape);
        let c = items[2].1.as_ref().unwrap();
        assert!(c.data().iter().all(|&v| v == -5));
    }

    #[test]
    fn test_raw_loader_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(raw_loader_with_shape(dir.path().join("nope"), (1, 1, 1)).is_err());
    }
}
