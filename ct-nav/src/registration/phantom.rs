//! 标定体模上 16 个金属球的参考坐标 (毫米).

use nalgebra::Point3;

/// 体模参考点. 顺序与体模图纸一致.
pub const REFERENCE_POINTS: [[f64; 3]; 16] = [
    [19.918, 2.107, 50.457],
    [-31.981, -2.392, 45.372],
    [25.889, 0.092, 40.441],
    [-25.965, 0.068, 35.431],
    [31.856, -2.281, 30.458],
    [-19.957, 2.024, 25.449],
    [25.850, 0.255, 8.199],
    [-19.910, 2.065, 3.090],
    [19.874, 2.171, -1.821],
    [-25.897, 0.274, -6.923],
    [-19.909, 2.140, -24.177],
    [31.837, -2.273, -29.132],
    [-25.896, 0.280, -34.239],
    [25.963, 0.285, -39.131],
    [-31.826, -2.096, -44.269],
    [20.046, 2.158, -49.122],
];

/// 预配准目标: z 方向最外侧的四个参考球, 按 z 递增排列,
/// 与按 z 排序后源点集的前两个和后两个一一对应.
pub const PREREGISTRATION_TARGET: [[f64; 3]; 4] = [
    [20.046, 2.158, -49.122],
    [-31.826, -2.096, -44.269],
    [-31.981, -2.392, 45.372],
    [19.918, 2.107, 50.457],
];

/// 参考点, 转为 [`Point3`].
pub fn reference_points() -> Vec<Point3<f64>> {
    REFERENCE_POINTS.iter().map(|&p| Point3::from(p)).collect()
}

/// 预配准目标, 转为 [`Point3`].
pub fn preregistration_target() -> Vec<Point3<f64>> {
    PREREGISTRATION_TARGET.iter().map(|&p| Point3::from(p)).collect()
}
