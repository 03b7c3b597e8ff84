//! CT 扫描切片与重建截面对象的操作.

mod core;
mod save;

pub use core::{CrossSection, ScanSlice};

pub use save::{ImgWriteRaw, ImgWriteVis};
