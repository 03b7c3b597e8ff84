//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, Shape3d};

pub use crate::data::slice::{CrossSection, ImgWriteRaw, ImgWriteVis, ScanSlice};
pub use crate::data::window::{windowing, CtWindow, WindowError};
pub use crate::data::{CtScan, LoadError, RegionGrid, Voxel};

pub use crate::consts::gray::{BLACK, WHITE};
pub use crate::consts::{BACKGROUND_HU, MARKER_THRESHOLD, STANDARD_SHAPE, VOXEL_SPACING};

pub use crate::dataset::{self, home_dataset_dir_with, raw_loader};

pub use crate::depth::{build_depth_map, DepthMap, ShadedBuffer};
pub use crate::reconstruct::{reconstruct_layer, reconstruct_layer_world, ReconstructError};
pub use crate::region::{grow_region, GrowError, Marker, MarkerFilter, MarkerLocator, VisitedMask};
pub use crate::registration::{IcpRegistrar, Registration, RegistrationError, RigidTransform};

pub use crate::{CtSession, DepthSource, SessionError};
