use super::phantom::{preregistration_target, reference_points};
use super::{estimate_rigid_transform, RegistrationError, RegistrationResult, RigidTransform};
use crate::consts::{ICP_ITERATIONS, MIN_REGISTRATION_POINTS, VOXEL_SPACING};
use crate::{Shape3d, Voxel};
use log::{debug, info, warn};
use nalgebra::Point3;
use ordered_float::OrderedFloat;

/// 把 (旋转后存储的) 体素坐标换算为采集坐标系下的物理坐标 (毫米).
///
/// 存储坐标 `(x, y, z)` 对应采集体素 `(W - 1 - x, H - 1 - y, z)`, 再逐轴乘以体素尺寸.
pub fn voxel_to_physical(voxel: Voxel, (_, height, width): Shape3d) -> Point3<f64> {
    let ax = (width as i64 - 1 - i64::from(voxel.x)) as f64;
    let ay = (height as i64 - 1 - i64::from(voxel.y)) as f64;
    let az = f64::from(voxel.z);
    Point3::new(
        ax * VOXEL_SPACING[0],
        ay * VOXEL_SPACING[1],
        az * VOXEL_SPACING[2],
    )
}

/// 一次配准的完整结果.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registration {
    /// 从扫描坐标系 (毫米) 到体模坐标系的累积变换.
    pub transform: RigidTransform,
    /// 预配准后四个最外侧点的残差.
    pub prereg_residual: f64,
    /// 每轮迭代后的残差, 长度等于迭代次数.
    pub residuals: Vec<f64>,
    /// 最终对齐后的源点 (已按 z 排序).
    pub aligned: Vec<Point3<f64>>,
    /// 与 `aligned` 一一对应的最近参考点.
    pub matched: Vec<Point3<f64>>,
}

impl Registration {
    /// 最后一轮迭代的残差. 迭代次数为 0 时返回预配准残差.
    #[inline]
    pub fn final_residual(&self) -> f64 {
        self.residuals.last().copied().unwrap_or(self.prereg_residual)
    }
}

/// 基于四点预配准的 ICP 配准器.
#[derive(Clone, Debug)]
pub struct IcpRegistrar {
    reference: Vec<Point3<f64>>,
    prereg_target: Vec<Point3<f64>>,
}

impl Default for IcpRegistrar {
    fn default() -> Self {
        Self {
            reference: reference_points(),
            prereg_target: preregistration_target(),
        }
    }
}

impl IcpRegistrar {
    /// 以体模参考点构建.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 以体素坐标的标记点质心做配准. 见 [`Self::register`].
    pub fn register_voxels(
        &self,
        markers: &[Voxel],
        shape: Shape3d,
    ) -> RegistrationResult<Registration> {
        let points = markers.iter().map(|&v| voxel_to_physical(v, shape)).collect();
        self.register(points)
    }

    /// 把 `source` (毫米) 配准到体模参考点.
    ///
    /// 1. 按 z 递增排序;
    /// 2. 用前两个和后两个点对预配准目标求刚体变换, 作用于全部源点;
    /// 3. 固定迭代 [`ICP_ITERATIONS`] 轮: 为每个源点寻找最近参考点,
    ///    求增量变换并作用于全部源点,
    ///    累积变换左乘增量变换.
    ///
    /// 少于 4 个点时返回 [`RegistrationError::InsufficientPoints`].
    pub fn register(&self, mut source: Vec<Point3<f64>>) -> RegistrationResult<Registration> {
        let n = source.len();
        if n < MIN_REGISTRATION_POINTS {
            return Err(RegistrationError::InsufficientPoints {
                required: MIN_REGISTRATION_POINTS,
                provided: n,
            });
        }
        if n == MIN_REGISTRATION_POINTS {
            warn!("只有 {n} 个标记点, 预配准之外没有冗余约束");
        }
        source.sort_by_key(|p| OrderedFloat(p.z));

        let prereg_source = [source[0], source[1], source[n - 2], source[n - 1]];
        let mut total = estimate_rigid_transform(&prereg_source, &self.prereg_target)?;
        let moved: Vec<_> = prereg_source.iter().map(|p| total.transform_point(p)).collect();
        let prereg_residual = residual(&moved, &self.prereg_target);
        debug!("预配准残差: {prereg_residual:.6}");

        let mut aligned: Vec<_> = source.iter().map(|p| total.transform_point(p)).collect();
        let mut matched = Vec::with_capacity(n);
        let mut residuals = Vec::with_capacity(ICP_ITERATIONS);
        for i in 0..ICP_ITERATIONS {
            matched = aligned.iter().map(|p| self.nearest(p)).collect();
            let step = estimate_rigid_transform(&aligned, &matched)?;
            aligned.iter_mut().for_each(|p| *p = step.transform_point(p));
            total = step * total;

            let r = residual(&aligned, &matched);
            debug!("ICP 第 {i} 轮残差: {r:.6}");
            residuals.push(r);
        }

        let reg = Registration {
            transform: total,
            prereg_residual,
            residuals,
            aligned,
            matched,
        };
        info!("配准完成: {} 个标记点, 残差 {:.6}", n, reg.final_residual());
        Ok(reg)
    }

    /// 最近参考点. 距离相同时取先出现者.
    fn nearest(&self, p: &Point3<f64>) -> Point3<f64> {
        let mut best = self.reference[0];
        let mut best_d = nalgebra::distance_squared(&best, p);
        for q in &self.reference[1..] {
            let d = nalgebra::distance_squared(q, p);
            if d < best_d {
                best = *q;
                best_d = d;
            }
        }
        best
    }
}

/// 残差: 对应点差的平方和开方后再除以点数.
///
/// 注意这并不是均方根误差, 但历史数据都按此口径记录.
pub fn residual(source: &[Point3<f64>], target: &[Point3<f64>]) -> f64 {
    if source.is_empty() {
        return 0.0;
    }
    let sum: f64 = source
        .iter()
        .zip(target)
        .map(|(s, t)| (s - t).norm_squared())
        .sum();
    sum.sqrt() / source.len() as f64
}

#[cfg(test)]
mod tests {
    use super::{residual, voxel_to_physical, IcpRegistrar};
    use crate::consts::{ICP_ITERATIONS, STANDARD_SHAPE, VOXEL_SPACING};
    use crate::registration::{RegistrationError, RigidTransform, REFERENCE_POINTS};
    use crate::Voxel;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

    fn reference() -> Vec<Point3<f64>> {
        REFERENCE_POINTS.iter().map(|&p| Point3::from(p)).collect()
    }

    #[test]
    fn test_recovers_known_transform() {
        let r = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.35);
        let known = RigidTransform::from_parts(*r.matrix(), Vector3::new(60.0, 80.0, 70.0));
        let source: Vec<_> = reference().iter().map(|p| known.transform_point(p)).collect();

        let reg = IcpRegistrar::new().register(source).unwrap();
        assert_eq!(reg.residuals.len(), ICP_ITERATIONS);
        assert_relative_eq!(*reg.transform.inverse().matrix(), *known.matrix(), epsilon = 1e-6);
        assert_relative_eq!(reg.transform.rotation().determinant(), 1.0, epsilon = 1e-9);
        assert!(reg.final_residual() < 1e-9);
        for (a, m) in reg.aligned.iter().zip(&reg.matched) {
            assert_relative_eq!(a, m, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_insufficient_points() {
        let three = reference()[..3].to_vec();
        assert_eq!(
            IcpRegistrar::new().register(three).unwrap_err(),
            RegistrationError::InsufficientPoints {
                required: 4,
                provided: 3
            }
        );
    }

    #[test]
    fn test_voxel_to_physical_mirrors_in_plane() {
        let (_, h, w) = STANDARD_SHAPE;
        let p = voxel_to_physical(Voxel::new(w as i32 - 1, h as i32 - 1, 10), STANDARD_SHAPE);
        assert_relative_eq!(p, Point3::new(0.0, 0.0, 10.0 * VOXEL_SPACING[2]));
        let p = voxel_to_physical(Voxel::new(0, 0, 0), STANDARD_SHAPE);
        assert_relative_eq!(p.x, (w - 1) as f64 * VOXEL_SPACING[0]);
        assert_relative_eq!(p.y, (h - 1) as f64 * VOXEL_SPACING[1]);
    }

    #[test]
    fn test_register_voxel_centroids() {
        let (_, h, w) = STANDARD_SHAPE;
        let offset = Vector3::new(72.5, 65.0, 70.0);
        // 体模摆放在扫描中心附近, 质心量化到体素网格.
        let markers: Vec<Voxel> = reference()
            .iter()
            .map(|p| {
                let mm = p.coords + offset;
                let ax = (mm.x / VOXEL_SPACING[0]).round() as i32;
                let ay = (mm.y / VOXEL_SPACING[1]).round() as i32;
                let az = (mm.z / VOXEL_SPACING[2]).round() as i32;
                Voxel::new(w as i32 - 1 - ax, h as i32 - 1 - ay, az)
            })
            .collect();

        let reg = IcpRegistrar::new().register_voxels(&markers, STANDARD_SHAPE).unwrap();
        assert!(reg.final_residual() < 0.1, "residual {}", reg.final_residual());
        assert_relative_eq!(reg.transform.rotation(), Matrix3::identity(), epsilon = 0.02);
        assert_relative_eq!(reg.transform.translation(), -offset, epsilon = 0.5);
    }

    #[test]
    fn test_residual_definition() {
        let a = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)];
        let b = [Point3::new(3.0, 0.0, 0.0), Point3::new(1.0, 1.0, 5.0)];
        // sqrt(9 + 16) / 2
        assert_relative_eq!(residual(&a, &b), 2.5);
        assert_eq!(residual(&[], &[]), 0.0);
    }
}
