use std::fs::File;
use std::io::{self, BufReader, Read};
use std::ops::{Index, IndexMut};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use flate2::read::GzDecoder;
use log::info;
use ndarray::{Array3, ArrayView3, ArrayViewMut3, Axis};
use thiserror::Error;

use crate::consts::{BACKGROUND_HU, STANDARD_SHAPE};
use crate::{Idx3d, Shape3d};

pub mod slice;
pub mod window;

pub use slice::{CrossSection, ImgWriteRaw, ImgWriteVis, ScanSlice};
pub use window::{windowing, CtWindow, WindowError, WindowResult};

/// 单个体素样本的字节数 (`i16`).
const SAMPLE_BYTES: usize = 2;

/// 体数据加载错误.
#[derive(Debug, Error)]
pub enum LoadError {
    /// 无法打开文件.
    #[error("无法打开文件 `{0}`")]
    FileNotFound(PathBuf),

    /// 读取的字节数与期望不一致.
    #[error("体数据大小不符: 期望 {expected} 字节, 实际 {actual} 字节")]
    SizeMismatch {
        /// 期望的字节数.
        expected: usize,
        /// 实际读取的字节数. 文件过长时最多读取 `expected + 1` 字节.
        actual: usize,
    },

    /// 读取过程中的其它 IO 错误.
    #[error("读取体数据失败: {0}")]
    Io(#[from] io::Error),
}

/// 体数据加载结果.
pub type LoadResult<T> = Result<T, LoadError>;

/// 有符号整数体素坐标 `(x, y, z)`.
///
/// 作为区域生长种子时允许出现负数 (会被报告为越界).
/// 作为区域成员或质心时, 各分量总在网格范围内.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Voxel {
    /// 列, 宽方向.
    pub x: i32,
    /// 行, 高方向.
    pub y: i32,
    /// 层.
    pub z: i32,
}

impl Voxel {
    /// 直接构建.
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// 由 `(z, y, x)` 索引构建. 索引分量必须能放进 `i32`, 否则行为未定义.
    #[inline]
    pub const fn from_idx((z, y, x): Idx3d) -> Self {
        Self::new(x as i32, y as i32, z as i32)
    }

    /// 转换为 `(z, y, x)` 索引. 若任一分量为负或超出 `shape`, 返回 `None`.
    pub fn to_idx(&self, (layers, height, width): Shape3d) -> Option<Idx3d> {
        let z = usize::try_from(self.z).ok().filter(|z| *z < layers)?;
        let y = usize::try_from(self.y).ok().filter(|y| *y < height)?;
        let x = usize::try_from(self.x).ok().filter(|x| *x < width)?;
        Some((z, y, x))
    }

    /// 是否有任一分量为负.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.x < 0 || self.y < 0 || self.z < 0
    }
}

/// 无文件头的原始 3D CT 扫描. HU 值以 `i16` 保存, 按 `(z, y, x)` 行优先存储.
///
/// 加载时已完成每层 180° 的平面旋转, 之后所有操作都基于旋转后的数据.
#[derive(Debug, Clone)]
pub struct CtScan {
    data: Array3<i16>,
}

impl Index<Idx3d> for CtScan {
    type Output = i16;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for CtScan {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl CtScan {
    /// 打开标准形状 (400 x 400 x 400) 的原始 CT 扫描. `path` 为本地路径.
    ///
    /// 以 `.gz` 结尾的文件会先按 gzip 解压. 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    #[inline]
    pub fn open<P: AsRef<Path>>(path: P) -> LoadResult<Self> {
        Self::open_with_shape(path, STANDARD_SHAPE)
    }

    /// 以给定形状 `(层数, 高, 宽)` 打开原始 CT 扫描.
    ///
    /// 文件字节数 (解压后) 必须恰好等于 `层数 * 高 * 宽 * 2`,
    /// 否则返回 [`LoadError::SizeMismatch`].
    pub fn open_with_shape<P: AsRef<Path>>(path: P, shape: Shape3d) -> LoadResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|_| LoadError::FileNotFound(path.to_owned()))?;

        let (z, h, w) = shape;
        let expected = z * h * w * SAMPLE_BYTES;
        // 多读一个字节即可判断文件是否过长.
        let limit = expected as u64 + 1;
        let mut bytes = Vec::with_capacity(expected + 1);
        if is_gzip(path) {
            GzDecoder::new(BufReader::new(file))
                .take(limit)
                .read_to_end(&mut bytes)?;
        } else {
            BufReader::new(file).take(limit).read_to_end(&mut bytes)?;
        }
        if bytes.len() != expected {
            return Err(LoadError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let mut raw = vec![0i16; z * h * w];
        LittleEndian::read_i16_into(&bytes, &mut raw);
        let scan = Self::from_raw(shape, raw)?;
        info!("已加载体数据 `{}`, 形状 {shape:?}", path.display());
        Ok(scan)
    }

    /// 由采集顺序的原始样本创建扫描. 该操作会对每层做一次 180° 旋转.
    ///
    /// `raw` 的长度必须等于 `层数 * 高 * 宽`, 否则返回 [`LoadError::SizeMismatch`].
    pub fn from_raw(shape: Shape3d, mut raw: Vec<i16>) -> LoadResult<Self> {
        let (z, h, w) = shape;
        let mismatch = |actual: usize| LoadError::SizeMismatch {
            expected: z * h * w * SAMPLE_BYTES,
            actual: actual * SAMPLE_BYTES,
        };
        if raw.len() != z * h * w {
            return Err(mismatch(raw.len()));
        }

        // 同时镜像一层的两个平面轴, 等价于把该层的行优先序列整体反转.
        if h * w != 0 {
            raw.chunks_exact_mut(h * w).for_each(<[i16]>::reverse);
        }

        let len = raw.len();
        let data = Array3::from_shape_vec(shape, raw).map_err(|_| mismatch(len))?;
        Ok(Self { data })
    }

    /// 直接由 (已经旋转过的) 数据创建扫描. 不会再做旋转.
    pub fn new(data: Array3<i16>) -> Self {
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().to_owned()
        };
        debug_assert!(data.is_standard_layout());
        Self { data }
    }

    /// 数据形状 `(层数, 高, 宽)`.
    #[inline]
    pub fn shape(&self) -> Shape3d {
        self.data.dim()
    }

    /// 层数.
    #[inline]
    pub fn layers(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// 高 (y 方向体素个数).
    #[inline]
    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// 宽 (x 方向体素个数).
    #[inline]
    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// 体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 获取给定 `(z, y, x)` 位置的 HU 值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx3d) -> Option<i16> {
        self.data.get(pos).copied()
    }

    /// 以采集坐标系 (旋转前) 读取体素. 等价于读取 `(z, H - 1 - y, W - 1 - x)`.
    ///
    /// 越界时 panic.
    #[inline]
    pub fn at_acquisition(&self, (z, y, x): Idx3d) -> i16 {
        let (_, h, w) = self.shape();
        self.data[(z, h - 1 - y, w - 1 - x)]
    }

    /// 获取第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, i16> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, i16> {
        self.data.view_mut()
    }
}

/// 与 [`CtScan`] 平行的 "区域" 网格, 由区域生长和标记点定位写入.
///
/// 创建或 [`RegionGrid::reset`] 之后全部为背景值 -1024.
#[derive(Debug, Clone)]
pub struct RegionGrid {
    data: Array3<i16>,
}

impl Index<Idx3d> for RegionGrid {
    type Output = i16;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for RegionGrid {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl RegionGrid {
    /// 创建形状为 `shape` 的全背景网格.
    #[inline]
    pub fn new(shape: Shape3d) -> Self {
        Self {
            data: Array3::from_elem(shape, BACKGROUND_HU),
        }
    }

    /// 创建与 `scan` 同形状的全背景网格.
    #[inline]
    pub fn like(scan: &CtScan) -> Self {
        Self::new(scan.shape())
    }

    /// 数据形状 `(层数, 高, 宽)`.
    #[inline]
    pub fn shape(&self) -> Shape3d {
        self.data.dim()
    }

    /// 全部填充为背景值.
    #[inline]
    pub fn reset(&mut self) {
        self.data.fill(BACKGROUND_HU);
    }

    /// 非背景体素个数.
    #[inline]
    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|&&v| v != BACKGROUND_HU).count()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, i16> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, i16> {
        self.data.view_mut()
    }
}

/// 是否按 gzip 压缩文件处理.
#[inline]
fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}
