//! 标记点配准.
//!
//! 把在 CT 扫描中找到的标记点质心 (毫米) 与体模上的已知参考点对齐,
//! 求得两者之间的刚体变换. 流程为四点预配准加固定轮数的 ICP.

mod error;
mod icp;
mod kabsch;
mod phantom;
mod transform;

pub use error::{RegistrationError, RegistrationResult};
pub use icp::{residual, voxel_to_physical, IcpRegistrar, Registration};
pub use kabsch::estimate_rigid_transform;
pub use phantom::{
    preregistration_target, reference_points, PREREGISTRATION_TARGET, REFERENCE_POINTS,
};
pub use transform::RigidTransform;
