use super::{RegistrationError, RegistrationResult, RigidTransform};
use nalgebra::{Matrix3, Point3, Vector3};

/// 确定一个刚体变换所需的最少对应点个数.
const MIN_CORRESPONDENCES: usize = 3;

/// 最小二乘意义下的刚体变换估计 (Kabsch 算法).
///
/// `source[i]` 与 `target[i]` 一一对应, 返回的变换把 `source` 映射到 `target`.
/// 至少需要 3 对对应点.
///
/// 1. 两组点分别减去质心;
/// 2. 交叉协方差 `H = sum(s * t^T)`, 对其做 SVD: `H = U S V^T`;
/// 3. `R = V U^T`. 若 `det(R) < 0`, 将 V 中最小奇异值对应的列取反后重算, 保证结果为正常旋转;
/// 4. `t = c_target - R c_source`.
pub fn estimate_rigid_transform(
    source: &[Point3<f64>],
    target: &[Point3<f64>],
) -> RegistrationResult<RigidTransform> {
    if source.len() != target.len() {
        return Err(RegistrationError::LengthMismatch {
            source_len: source.len(),
            target_len: target.len(),
        });
    }
    if source.len() < MIN_CORRESPONDENCES {
        return Err(RegistrationError::InsufficientPoints {
            required: MIN_CORRESPONDENCES,
            provided: source.len(),
        });
    }

    let cs = centroid(source);
    let ct = centroid(target);

    let mut h = Matrix3::zeros();
    for (s, t) in source.iter().zip(target) {
        h += (s.coords - cs) * (t.coords - ct).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(RegistrationError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(RegistrationError::SvdFailed)?;

    let mut v = v_t.transpose();
    let mut rotation = v * u.transpose();
    if rotation.determinant() < 0.0 {
        let weakest = svd.singular_values.imin();
        let mut col = v.column_mut(weakest);
        col *= -1.0;
        rotation = v * u.transpose();
    }

    let translation = ct - rotation * cs;
    Ok(RigidTransform::from_parts(rotation, translation))
}

fn centroid(points: &[Point3<f64>]) -> Vector3<f64> {
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    sum / points.len() as f64
}

#[cfg(test)]
mod tests {
    use super::estimate_rigid_transform;
    use crate::registration::{RegistrationError, RigidTransform};
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Rotation3, Vector3};

    fn cloud() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 1.0),
            Point3::new(0.0, 7.0, -2.0),
            Point3::new(3.0, 4.0, 12.0),
            Point3::new(-5.0, 2.0, 6.0),
        ]
    }

    #[test]
    fn test_pure_translation() {
        let src = cloud();
        let d = Vector3::new(1.5, -3.0, 20.0);
        let dst: Vec<_> = src.iter().map(|p| p + d).collect();
        let t = estimate_rigid_transform(&src, &dst).unwrap();
        assert_relative_eq!(t.rotation(), nalgebra::Matrix3::identity(), epsilon = 1e-9);
        assert_relative_eq!(t.translation(), d, epsilon = 1e-9);
    }

    #[test]
    fn test_rotation_and_translation() {
        let src = cloud();
        let r = Rotation3::from_euler_angles(0.4, 0.1, -0.7);
        let expect = RigidTransform::from_parts(*r.matrix(), Vector3::new(-8.0, 2.0, 5.0));
        let dst: Vec<_> = src.iter().map(|p| expect.transform_point(p)).collect();

        let t = estimate_rigid_transform(&src, &dst).unwrap();
        assert_relative_eq!(*t.matrix(), *expect.matrix(), epsilon = 1e-9);
        assert_relative_eq!(t.rotation().determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reflection_is_corrected() {
        // 目标是源点的镜像, 最优正交矩阵是反射; 结果仍须为正常旋转.
        let src = cloud();
        let dst: Vec<_> = src.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();
        let t = estimate_rigid_transform(&src, &dst).unwrap();
        assert_relative_eq!(t.rotation().determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_length_mismatch() {
        let src = cloud();
        assert_eq!(
            estimate_rigid_transform(&src, &src[..3]),
            Err(RegistrationError::LengthMismatch {
                source_len: 5,
                target_len: 3
            })
        );
        assert_eq!(
            estimate_rigid_transform(&src[..2], &src[..2]),
            Err(RegistrationError::InsufficientPoints {
                required: 3,
                provided: 2
            })
        );
    }
}
