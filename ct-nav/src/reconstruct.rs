//! 斜切面重建.
//!
//! 给定平面中心、主轴 (图像 y 方向) 和一个 "x 方向提示", 在体数据中按最近邻采样一张斜切面.
//! 中心和主轴可以直接用采集坐标系下的体素坐标给出, 也可以用配准后的世界坐标 (毫米) 给出.

use crate::consts::{BACKGROUND_HU, VOXEL_SPACING};
use crate::registration::RigidTransform;
use crate::{CrossSection, CtScan};
use nalgebra::{Point3, Vector3};
use thiserror::Error;

const EPS: f64 = 1e-9;

/// 斜切面重建错误.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum ReconstructError {
    /// 主轴为零向量.
    #[error("主轴为零向量")]
    DegenerateAxis,

    /// 主轴与 x 方向提示平行, 无法确定平面内 x 轴.
    #[error("主轴与 x 方向提示平行")]
    DegenerateBasis,

    /// 尚未完成配准, 无法使用世界坐标.
    #[error("尚未完成标记点配准")]
    NotRegistered,
}

/// 斜切面重建结果.
pub type ReconstructResult<T> = Result<T, ReconstructError>;

/// 平面内正交基 `(x 轴, y 轴)`, 均为单位向量.
///
/// `y = normalize(axis)`, `x = normalize((y × hint) × y)`.
pub fn plane_basis(
    axis: &Vector3<f64>,
    hint: &Vector3<f64>,
) -> ReconstructResult<(Vector3<f64>, Vector3<f64>)> {
    let y_axis = axis
        .try_normalize(EPS)
        .ok_or(ReconstructError::DegenerateAxis)?;
    let x_axis = y_axis
        .cross(hint)
        .cross(&y_axis)
        .try_normalize(EPS)
        .ok_or(ReconstructError::DegenerateBasis)?;
    Ok((x_axis, y_axis))
}

/// 在采集坐标系 (体素) 下重建斜切面, 结果写入 `out`.
///
/// 输出像素 `(r, c)` 对应采样点 `center + (c - w/2) * x + (r - h/2) * y`,
/// 各分量四舍五入到整数. 采样点在体数据内时, 读取镜像位置 `(z, H-1-y, W-1-x)`,
/// 否则写入背景值 -1024.
pub fn reconstruct_layer(
    scan: &CtScan,
    out: &mut CrossSection,
    center: &Point3<f64>,
    axis: &Vector3<f64>,
    hint: &Vector3<f64>,
) -> ReconstructResult<()> {
    let (x_axis, y_axis) = plane_basis(axis, hint)?;
    sample_plane(scan, out, center, &x_axis, &y_axis);
    Ok(())
}

/// 在世界坐标系 (毫米, 配准后) 下重建斜切面.
///
/// `registration` 把扫描坐标系映射到世界坐标系. 中心先经逆变换 (含齐次除法) 再逐轴除以体素尺寸;
/// 主轴先经逆旋转, 再逐轴除以体素尺寸并归一化. 之后与 [`reconstruct_layer`] 相同.
pub fn reconstruct_layer_world(
    scan: &CtScan,
    out: &mut CrossSection,
    registration: &RigidTransform,
    center: &Point3<f64>,
    axis: &Vector3<f64>,
    hint: &Vector3<f64>,
) -> ReconstructResult<()> {
    let spacing = Vector3::from(VOXEL_SPACING);
    let local_center = Point3::from(
        registration
            .inverse_transform_point(center)
            .coords
            .component_div(&spacing),
    );
    let local_axis = registration
        .inverse_transform_vector(axis)
        .component_div(&spacing);
    reconstruct_layer(scan, out, &local_center, &local_axis, hint)
}

fn sample_plane(
    scan: &CtScan,
    out: &mut CrossSection,
    center: &Point3<f64>,
    x_axis: &Vector3<f64>,
    y_axis: &Vector3<f64>,
) {
    let (layers, height, width) = scan.shape();
    let (out_h, out_w) = out.shape();
    let (half_h, half_w) = ((out_h / 2) as f64, (out_w / 2) as f64);

    let mut buf = out.data_mut();
    for ((r, c), pix) in buf.indexed_iter_mut() {
        let p = center + x_axis * (c as f64 - half_w) + y_axis * (r as f64 - half_h);
        let (x, y, z) = (p.x.round(), p.y.round(), p.z.round());
        let inside = (0.0..width as f64).contains(&x)
            && (0.0..height as f64).contains(&y)
            && (0.0..layers as f64).contains(&z);
        *pix = if inside {
            let (x, y, z) = (x as usize, y as usize, z as usize);
            scan[(z, height - 1 - y, width - 1 - x)]
        } else {
            BACKGROUND_HU
        };
    }
}

#[cfg(test)]
mod tests {
    use super::{plane_basis, reconstruct_layer, reconstruct_layer_world, ReconstructError};
    use crate::consts::{BACKGROUND_HU, VOXEL_SPACING};
    use crate::registration::RigidTransform;
    use crate::{CrossSection, CtScan};
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Rotation3, Vector3};
    use ndarray::Array3;

    fn numbered(shape: (usize, usize, usize)) -> CtScan {
        CtScan::new(Array3::from_shape_fn(shape, |(z, y, x)| {
            (z * 1000 + y * 10 + x) as i16
        }))
    }

    #[test]
    fn test_axis_aligned_reproduces_layer() {
        let scan = numbered((6, 8, 10));
        let mut out = CrossSection::new((8, 10));
        reconstruct_layer(
            &scan,
            &mut out,
            &Point3::new(5.0, 4.0, 2.0),
            &Vector3::new(0.0, 1.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        for r in 0..8 {
            for c in 0..10 {
                assert_eq!(out[(r, c)], scan[(2, 7 - r, 9 - c)], "({r}, {c})");
            }
        }
    }

    #[test]
    fn test_z_axis_gives_constant_y_plane() {
        let scan = numbered((8, 8, 8));
        let mut out = CrossSection::new((8, 8));
        reconstruct_layer(
            &scan,
            &mut out,
            &Point3::new(4.0, 4.0, 4.0),
            &Vector3::new(0.0, 0.0, 3.0),
            &Vector3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        for r in 0..8 {
            for c in 0..8 {
                assert_eq!(out[(r, c)], scan[(r, 3, 7 - c)]);
            }
        }
    }

    #[test]
    fn test_outside_volume_is_background() {
        let scan = numbered((4, 4, 4));
        let mut out = CrossSection::new((6, 6));
        out.data_mut().fill(7);
        reconstruct_layer(
            &scan,
            &mut out,
            &Point3::new(100.0, 100.0, 100.0),
            &Vector3::new(0.0, 1.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        assert!(out.as_immutable().iter().all(|&v| v == BACKGROUND_HU));
    }

    #[test]
    fn test_degenerate_inputs() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(
            plane_basis(&Vector3::zeros(), &x),
            Err(ReconstructError::DegenerateAxis)
        );
        assert_eq!(
            plane_basis(&Vector3::new(-2.0, 0.0, 0.0), &x),
            Err(ReconstructError::DegenerateBasis)
        );

        let (bx, by) = plane_basis(&Vector3::new(0.0, 1.0, 1.0), &x).unwrap();
        assert_relative_eq!(bx.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(by.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(bx.dot(&by), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_world_matches_local_under_identity() {
        let scan = numbered((6, 8, 10));
        let center = Point3::new(5.0, 4.0, 2.0);
        let axis = Vector3::new(0.0, 1.0, 0.0);
        let hint = Vector3::new(1.0, 0.0, 0.0);

        let mut local = CrossSection::new((8, 10));
        reconstruct_layer(&scan, &mut local, &center, &axis, &hint).unwrap();

        let mm = Point3::from(center.coords.component_mul(&Vector3::from(VOXEL_SPACING)));
        let mut world = CrossSection::new((8, 10));
        reconstruct_layer_world(&scan, &mut world, &RigidTransform::identity(), &mm, &axis, &hint)
            .unwrap();
        assert_eq!(world.into_raw(), local.clone().into_raw());

        // 世界坐标系相对扫描坐标系有刚体变换时, 先把点和方向一并变换过去, 结果不变.
        let reg = RigidTransform::from_parts(
            *Rotation3::from_axis_angle(&Vector3::x_axis(), 0.5).matrix(),
            Vector3::new(10.0, -4.0, 3.0),
        );
        let mut moved = CrossSection::new((8, 10));
        reconstruct_layer_world(
            &scan,
            &mut moved,
            &reg,
            &reg.transform_point(&mm),
            &reg.transform_vector(&axis),
            &hint,
        )
        .unwrap();
        assert_eq!(moved.into_raw(), local.into_raw());
    }

    #[test]
    fn test_world_axis_scaled_by_spacing() {
        let scan = numbered((6, 16, 16));
        let spacing = Vector3::from(VOXEL_SPACING);
        let center = Point3::new(8.0, 8.0, 3.0);
        let mm = Point3::from(center.coords.component_mul(&spacing));
        // 毫米下的 45° 方向, 换算到体素后不再是 45°.
        let axis_mm = Vector3::new(1.0, 1.0, 0.0);
        let hint = Vector3::new(0.0, 0.0, 1.0);

        let mut world = CrossSection::new((16, 16));
        let identity = RigidTransform::identity();
        reconstruct_layer_world(&scan, &mut world, &identity, &mm, &axis_mm, &hint).unwrap();

        let mut scaled = CrossSection::new((16, 16));
        let axis_voxel = axis_mm.component_div(&spacing);
        reconstruct_layer(&scan, &mut scaled, &center, &axis_voxel, &hint).unwrap();
        assert_eq!(world.clone().into_raw(), scaled.into_raw());

        let mut unscaled = CrossSection::new((16, 16));
        reconstruct_layer(&scan, &mut unscaled, &center, &axis_mm, &hint).unwrap();
        assert_ne!(world.into_raw(), unscaled.into_raw());
    }
}
