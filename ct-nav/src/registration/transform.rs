use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::ops::Mul;

/// 齐次刚体变换 (旋转 + 平移), 以 4x4 矩阵保存, 并缓存其逆矩阵与旋转部分的逆.
///
/// 配准得到的变换把 "扫描坐标系" (毫米) 中的点映射到 "体模坐标系".
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidTransform {
    matrix: Matrix4<f64>,
    inverse: Matrix4<f64>,
    rotation_inverse: Matrix3<f64>,
}

impl Default for RigidTransform {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// 恒等变换.
    #[inline]
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
            rotation_inverse: Matrix3::identity(),
        }
    }

    /// 由旋转矩阵和平移向量构建. 不检查 `rotation` 是否正交.
    ///
    /// 逆变换按 `(R^T, -R^T t)` 直接构造.
    pub fn from_parts(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let rotation_inverse = rotation.transpose();
        Self {
            matrix: homogeneous(&rotation, &translation),
            inverse: homogeneous(&rotation_inverse, &-(rotation_inverse * translation)),
            rotation_inverse,
        }
    }

    /// 齐次矩阵.
    #[inline]
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// 齐次矩阵的逆.
    #[inline]
    pub fn inverse_matrix(&self) -> &Matrix4<f64> {
        &self.inverse
    }

    /// 旋转部分.
    #[inline]
    pub fn rotation(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// 平移部分.
    #[inline]
    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// 逆变换.
    #[inline]
    pub fn inverse(&self) -> Self {
        Self {
            matrix: self.inverse,
            inverse: self.matrix,
            rotation_inverse: self.rotation(),
        }
    }

    /// 旋转部分的逆, 即 `R^T`. 用于变换方向向量.
    #[inline]
    pub fn rotation_inverse(&self) -> &Matrix3<f64> {
        &self.rotation_inverse
    }

    /// 先做 `first`, 再做 `self`.
    pub fn after(&self, first: &RigidTransform) -> Self {
        let rotation = self.rotation() * first.rotation();
        let translation = self.rotation() * first.translation() + self.translation();
        Self::from_parts(rotation, translation)
    }

    /// 变换一个点 (含齐次除法).
    #[inline]
    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.matrix.transform_point(p)
    }

    /// 以逆变换变换一个点.
    #[inline]
    pub fn inverse_transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.inverse.transform_point(p)
    }

    /// 只做旋转, 变换一个方向向量.
    #[inline]
    pub fn transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation() * v
    }

    /// 以逆旋转变换一个方向向量.
    #[inline]
    pub fn inverse_transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation_inverse * v
    }
}

fn homogeneous(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    m
}

impl Mul for RigidTransform {
    type Output = RigidTransform;

    #[inline]
    fn mul(self, rhs: RigidTransform) -> Self::Output {
        self.after(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::RigidTransform;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Point3, Rotation3, Vector3};

    fn sample() -> RigidTransform {
        let r = Rotation3::from_euler_angles(0.3, -0.2, 1.1);
        RigidTransform::from_parts(*r.matrix(), Vector3::new(4.0, -2.5, 10.0))
    }

    #[test]
    fn test_inverse_closed_form() {
        let t = sample();
        let prod = t * t.inverse();
        assert_relative_eq!(*prod.matrix(), Matrix4::identity(), epsilon = 1e-12);
        let general = t.matrix().try_inverse().unwrap();
        assert_relative_eq!(*t.inverse().matrix(), general, epsilon = 1e-12);
        assert_relative_eq!(*t.inverse_matrix(), general, epsilon = 1e-12);
        let r_inv = t.rotation().try_inverse().unwrap();
        assert_relative_eq!(*t.rotation_inverse(), r_inv, epsilon = 1e-12);
    }

    #[test]
    fn test_point_round_trip() {
        let t = sample();
        let p = Point3::new(1.0, 2.0, 3.0);
        let q = t.transform_point(&p);
        assert_relative_eq!(t.inverse_transform_point(&q), p, epsilon = 1e-12);

        let v = Vector3::new(0.0, 1.0, 0.0);
        let back = t.inverse_transform_vector(&t.transform_vector(&v));
        assert_relative_eq!(back, v, epsilon = 1e-12);
    }

    #[test]
    fn test_composition_order() {
        let shift =
            RigidTransform::from_parts(nalgebra::Matrix3::identity(), Vector3::new(1.0, 0.0, 0.0));
        let rot = RigidTransform::from_parts(
            *Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2).matrix(),
            Vector3::zeros(),
        );
        // 先平移再旋转: (0,0,0) -> (1,0,0) -> (0,1,0)
        let p = rot.after(&shift).transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_eq!(RigidTransform::default(), RigidTransform::identity());
    }
}
