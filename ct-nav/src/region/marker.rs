use super::{Region, RegionGrower, VisitedMask};
use crate::consts::{MARKER_SEED_STRIDE, MARKER_THRESHOLD, MARKER_VOXELS, MARKER_WIDTH};
use crate::{CtScan, RegionGrid, Voxel};
use itertools::{Itertools, MinMaxResult};
use log::{debug, info};

/// 标记区域筛选条件.
///
/// 体素个数与 x 方向宽度都使用开区间.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerFilter {
    /// 区域生长阈值 (HU).
    pub threshold: i16,
    /// 种子网格步长.
    pub stride: usize,
    /// 体素个数的开区间 `(下限, 上限)`.
    pub voxels: (usize, usize),
    /// x 方向包围盒宽度的开区间 `(下限, 上限)`.
    pub width: (i32, i32),
}

impl Default for MarkerFilter {
    fn default() -> Self {
        Self {
            threshold: MARKER_THRESHOLD,
            stride: MARKER_SEED_STRIDE,
            voxels: MARKER_VOXELS,
            width: MARKER_WIDTH,
        }
    }
}

impl MarkerFilter {
    /// 修改阈值, 其余条件不变.
    #[inline]
    pub fn with_threshold(self, threshold: i16) -> Self {
        Self { threshold, ..self }
    }

    /// 判断区域是否符合标记点的尺寸特征.
    pub fn accepts(&self, region: &[Voxel]) -> bool {
        let n = region.len();
        if n <= self.voxels.0 || n >= self.voxels.1 {
            return false;
        }
        let w = x_extent(region);
        self.width.0 < w && w < self.width.1
    }
}

/// 区域在 x 方向上的包围盒宽度 `max(x) - min(x)`. 空区域为 0.
pub fn x_extent(region: &[Voxel]) -> i32 {
    match region.iter().map(|v| v.x).minmax() {
        MinMaxResult::NoElements | MinMaxResult::OneElement(_) => 0,
        MinMaxResult::MinMax(lo, hi) => hi - lo,
    }
}

/// 区域质心, 各分量为截断取整的平均值. 空区域返回 `None`.
pub fn centroid(region: &[Voxel]) -> Option<Voxel> {
    if region.is_empty() {
        return None;
    }
    let n = region.len() as i64;
    let (sx, sy, sz) = region.iter().fold((0i64, 0i64, 0i64), |(sx, sy, sz), v| {
        (sx + i64::from(v.x), sy + i64::from(v.y), sz + i64::from(v.z))
    });
    Some(Voxel::new((sx / n) as i32, (sy / n) as i32, (sz / n) as i32))
}

/// 一个被接受的标记点.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    /// 质心 (体素坐标).
    pub centroid: Voxel,
    /// 区域体素个数.
    pub voxels: usize,
    /// 区域 x 方向宽度.
    pub width: i32,
}

/// 标记点定位器.
///
/// 在体数据中按步长网格播种, 对每个种子做区域生长, 保留尺寸符合条件的区域并返回质心.
#[derive(Copy, Clone, Debug, Default)]
pub struct MarkerLocator {
    filter: MarkerFilter,
}

impl MarkerLocator {
    /// 以给定筛选条件构建.
    #[inline]
    pub fn new(filter: MarkerFilter) -> Self {
        Self { filter }
    }

    /// 筛选条件.
    #[inline]
    pub fn filter(&self) -> &MarkerFilter {
        &self.filter
    }

    /// 扫描整个体数据, 返回按发现顺序 (z, y, x 递增) 排列的标记点.
    ///
    /// 开始前清空 `visited`; 结束后重置 `grid`, 只重新绘制被接受区域的体素.
    /// 被接受区域包含边界体素时, 这些体素也会被绘制.
    pub fn locate(
        &self,
        scan: &CtScan,
        visited: &mut VisitedMask,
        grid: &mut RegionGrid,
    ) -> Vec<Marker> {
        let f = &self.filter;
        let stride = f.stride.max(1);
        let (layers, height, width) = scan.shape();
        visited.clear();

        let mut markers = Vec::new();
        let mut kept: Vec<Region> = Vec::new();
        {
            let mut grower = RegionGrower::new(scan, visited, grid);
            for z in (0..layers).step_by(stride) {
                for y in (0..height).step_by(stride) {
                    for x in (0..width).step_by(stride) {
                        let seed = Voxel::from_idx((z, y, x));
                        let Ok(region) = grower.grow(seed, f.threshold) else {
                            continue;
                        };
                        if !f.accepts(&region) {
                            continue;
                        }
                        let Some(c) = centroid(&region) else {
                            continue;
                        };
                        let marker = Marker {
                            centroid: c,
                            voxels: region.len(),
                            width: x_extent(&region),
                        };
                        debug!("标记点 #{}: {:?}", markers.len(), marker);
                        markers.push(marker);
                        kept.push(region);
                    }
                }
            }
        }

        grid.reset();
        let shape = scan.shape();
        for pos in kept.iter().flatten().filter_map(|v| v.to_idx(shape)) {
            grid[pos] = scan[pos];
        }
        info!(
            "标记点扫描完成: 阈值 {}, 找到 {} 个标记",
            f.threshold,
            markers.len()
        );
        markers
    }
}
