//! 三维区域生长 (6-邻接洪水填充) 与标记点定位.
//!
//! 访问标记 [`VisitedMask`] 与区域网格 [`RegionGrid`] 都是显式传入的状态对象.
//! 同一时刻只能有一个生长/扫描过程持有它们; 每次独立扫描前, 调用者负责清空访问标记.

use crate::{CtScan, Idx3d, RegionGrid, Shape3d, Voxel};
use ndarray::{Array3, ArrayView3};
use thiserror::Error;

mod marker;

pub use marker::{centroid, x_extent, Marker, MarkerFilter, MarkerLocator};

/// 一次区域生长得到的体素序列, 按出栈顺序排列, 无重复.
pub type Region = Vec<Voxel>;

/// 区域生长错误.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum GrowError {
    /// 种子坐标为负, 或超出体数据范围.
    #[error("种子 {0:?} 越界")]
    SeedOutOfBounds(Voxel),

    /// 种子本身的 HU 值低于阈值.
    #[error("种子 {seed:?} 的 HU 值 {value} 低于阈值 {threshold}")]
    SeedBelowThreshold {
        /// 种子.
        seed: Voxel,
        /// 种子处的 HU 值.
        value: i16,
        /// 阈值.
        threshold: i16,
    },
}

/// 区域生长结果.
pub type GrowResult<T> = Result<T, GrowError>;

/// 与体数据平行的访问标记.
#[derive(Clone, Debug)]
pub struct VisitedMask {
    data: Array3<bool>,
}

impl VisitedMask {
    /// 创建形状为 `shape` 的全未访问标记.
    #[inline]
    pub fn new(shape: Shape3d) -> Self {
        Self {
            data: Array3::from_elem(shape, false),
        }
    }

    /// 创建与 `scan` 同形状的全未访问标记.
    #[inline]
    pub fn like(scan: &CtScan) -> Self {
        Self::new(scan.shape())
    }

    /// 数据形状 `(层数, 高, 宽)`.
    #[inline]
    pub fn shape(&self) -> Shape3d {
        self.data.dim()
    }

    /// 清空全部访问标记. 每次独立扫描前必须调用.
    #[inline]
    pub fn clear(&mut self) {
        self.data.fill(false);
    }

    /// 记录当前位置已被访问过.
    #[inline]
    pub fn set_visited(&mut self, pos: Idx3d) {
        self.data[pos] = true;
    }

    /// 判断某个位置是否已被访问过. 越界时 panic.
    #[inline]
    pub fn is_visited(&self, pos: Idx3d) -> bool {
        self.data[pos]
    }

    /// 已访问的体素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, bool> {
        self.data.view()
    }
}

/// 实现区域生长所需要维护的相关数据结构.
///
/// 生长过程会写入 `visited` 和 `grid`, 但从不修改 `scan`.
pub struct RegionGrower<'a> {
    scan: &'a CtScan,
    visited: &'a mut VisitedMask,
    grid: &'a mut RegionGrid,
}

impl<'a> RegionGrower<'a> {
    /// 三者形状必须一致, 否则程序 panic.
    pub fn new(scan: &'a CtScan, visited: &'a mut VisitedMask, grid: &'a mut RegionGrid) -> Self {
        assert_eq!(scan.shape(), visited.shape(), "扫描与访问标记形状不一致");
        assert_eq!(scan.shape(), grid.shape(), "扫描与区域网格形状不一致");
        Self {
            scan,
            visited,
            grid,
        }
    }

    /// 从 `seed` 出发, 以 `>= threshold` 为成员条件做 6-邻接洪水填充.
    ///
    /// # 算法
    ///
    /// 使用显式栈 (后进先出), 不使用递归. 每弹出一个体素, 就将其加入结果并标记为已访问;
    /// 只有严格位于内部 (每个轴都不在最外层) 的体素才会把 HU 值写入区域网格,
    /// 并把未访问且不低于阈值的 6 个邻居压栈. 边界体素只记录, 不扩展.
    ///
    /// 访问检查发生在压栈时, 因此同一体素可能从两个方向各被压栈一次.
    /// 第二次出栈时它已被标记, 直接跳过, 所以结果中不会出现重复体素.
    /// 同理, 若种子本身已被访问过, 返回空区域.
    ///
    /// # 错误
    ///
    /// 1. 种子坐标为负或超出范围: [`GrowError::SeedOutOfBounds`];
    /// 2. 种子 HU 值低于阈值: [`GrowError::SeedBelowThreshold`].
    pub fn grow(&mut self, seed: Voxel, threshold: i16) -> GrowResult<Region> {
        let shape = self.scan.shape();
        let Some(seed_pos) = seed.to_idx(shape) else {
            return Err(GrowError::SeedOutOfBounds(seed));
        };
        let value = self.scan[seed_pos];
        if value < threshold {
            return Err(GrowError::SeedBelowThreshold {
                seed,
                value,
                threshold,
            });
        }

        let mut stack: Vec<Idx3d> = Vec::with_capacity(64);
        let mut ans = Region::new();
        stack.push(seed_pos);

        while let Some(pos) = stack.pop() {
            if self.visited.is_visited(pos) {
                continue;
            }
            self.visited.set_visited(pos);
            ans.push(Voxel::from_idx(pos));

            if !is_interior(pos, shape) {
                continue;
            }
            self.grid[pos] = self.scan[pos];
            for neigh in diamond_neighbours(pos) {
                if !self.visited.is_visited(neigh) && self.scan[neigh] >= threshold {
                    stack.push(neigh);
                }
            }
        }
        Ok(ans)
    }
}

/// 从 `seed` 出发做一次区域生长. 见 [`RegionGrower::grow`].
///
/// 该函数不会清空 `visited`; 独立的生长之间是否复用访问标记由调用者决定.
#[inline]
pub fn grow_region(
    scan: &CtScan,
    visited: &mut VisitedMask,
    grid: &mut RegionGrid,
    seed: Voxel,
    threshold: i16,
) -> GrowResult<Region> {
    RegionGrower::new(scan, visited, grid).grow(seed, threshold)
}

/// 体素是否严格位于内部, 即每个轴上都不在最外层.
#[inline]
fn is_interior((z, y, x): Idx3d, (layers, height, width): Shape3d) -> bool {
    0 < z && z + 1 < layers && 0 < y && y + 1 < height && 0 < x && x + 1 < width
}

/// 获取 `pos` 前后上下左右六个点的坐标. 顺序为 `x+1, x-1, y+1, y-1, z+1, z-1`.
///
/// 不检查越界, 调用者须保证 `pos` 位于内部.
#[inline]
fn diamond_neighbours((z, y, x): Idx3d) -> [Idx3d; 6] {
    [
        (z, y, x + 1),
        (z, y, x - 1),
        (z, y + 1, x),
        (z, y - 1, x),
        (z + 1, y, x),
        (z - 1, y, x),
    ]
}
