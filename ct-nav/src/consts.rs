//! 通用常量.
//!
//! 这些值都是采集设备和标定体模决定的固定策略, 而非可调参数.

use crate::Shape3d;

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;
}

/// 标准体数据宽度 (x 方向体素个数).
pub const WIDTH: usize = 400;

/// 标准体数据高度 (y 方向体素个数).
pub const HEIGHT: usize = 400;

/// 标准体数据层数 (z 方向体素个数).
pub const LAYERS: usize = 400;

/// 标准体数据形状 `(层数, 高, 宽)`.
pub const STANDARD_SHAPE: Shape3d = (LAYERS, HEIGHT, WIDTH);

/// 合法 HU 值下限.
pub const HU_MIN: i32 = -1024;

/// 合法 HU 值上限 (12-bit).
pub const HU_MAX: i32 = 3071;

/// 窗口起点检查使用的下限.
///
/// 注意它比 [`HU_MIN`] 更宽松 (-1042 而非 -1024). 这是既有行为, 需原样保留.
pub const WINDOW_START_MIN: i32 = -1042;

/// 窗宽下限.
pub const WINDOW_WIDTH_MIN: i32 = 1;

/// 窗宽上限.
pub const WINDOW_WIDTH_MAX: i32 = 4095;

/// 背景 (空气) 的 HU 值. 重建越界与区域网格清空都使用该值.
pub const BACKGROUND_HU: i16 = -1024;

/// 体素物理尺寸, 以毫米为单位, 按 `[x, y, z]` 排列.
pub const VOXEL_SPACING: [f64; 3] = [0.3625, 0.325, 0.35];

/// 标记点检测阈值 (HU).
pub const MARKER_THRESHOLD: i16 = 1500;

/// 标记点扫描种子步长.
pub const MARKER_SEED_STRIDE: usize = 2;

/// 标记区域体素个数的开区间 `(下限, 上限)`.
pub const MARKER_VOXELS: (usize, usize) = (250, 1000);

/// 标记区域 x 方向包围盒宽度的开区间 `(下限, 上限)`.
pub const MARKER_WIDTH: (i32, i32) = (5, 20);

/// ICP 迭代次数. 不做收敛判断, 固定迭代.
pub const ICP_ITERATIONS: usize = 10;

/// 配准所需的最少标记点个数 (四点预配准).
pub const MIN_REGISTRATION_POINTS: usize = 4;
