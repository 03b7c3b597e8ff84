#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 为器械导航叠加显示提供 3D CT 体数据分析与标记点配准的基础算法.
//!
//! 该 crate 目前仅提供 `safe` 接口, 且全部为同步调用. 图形界面、鼠标/滑块事件、
//! 文件对话框等均由外部显示层负责, 本 crate 不依赖任何渲染或窗口 API.
//!
//! # 注意
//!
//! 1. 该 crate 目前只处理固定布局 (无文件头, 400 x 400 x 400, `i16`) 的原始 CT 数据;
//!   算法本身对体数据形状是通用的, 便于用小体积合成数据做测试.
//! 2. 在非期望情况下 (例如索引越界), 程序会直接 panic, 而不会导致内存错误.
//!   所有可预期的前置条件失败都以 `Result` 返回.
//!
//! # 开发计划
//!
//! ### 原始体数据加载 ✅
//!
//! 读取原始二进制数据 (支持 gzip 压缩), 并对每层做一次 180° 平面旋转.
//!
//! 实现位于 `ct-nav/src/data`.
//!
//! ### CT window 视图 ✅
//!
//! 提供一个独立的 CT 窗口对象, 以便将 12-bit HU 值转换为 8-bit 灰度值.
//! 边界策略 (求值顺序) 是接口契约的一部分.
//!
//! 实现位于 `ct-nav/src/data/window.rs`.
//!
//! ### 深度图投影与明暗渲染 ✅
//!
//! 逐列寻找第一个不低于阈值的体素, 并用有限差分近似表面朝向.
//!
//! 实现位于 `ct-nav/src/depth.rs`.
//!
//! ### 三维区域生长 ✅
//!
//! 显式栈 (非递归) 的 6-邻接洪水填充. 边界体素记录但不扩展.
//!
//! 实现位于 `ct-nav/src/region`.
//!
//! ### 标记点定位 ✅
//!
//! 以步长 2 扫描全体积, 按体素个数和 x 方向宽度筛选球形标记, 计算质心.
//!
//! 实现位于 `ct-nav/src/region/marker.rs`.
//!
//! ### ICP 配准 ✅
//!
//! 四点预配准 + 固定 10 次迭代最近点配准, 刚体变换由 SVD (Kabsch) 求解.
//!
//! 实现位于 `ct-nav/src/registration`.
//!
//! ### 斜切面重建 ✅
//!
//! 在体素坐标或 (配准后的) 世界坐标下提取任意斜切面.
//!
//! 实现位于 `ct-nav/src/reconstruct.rs`.
//!
//! ### 小功能 ✅
//!
//! 1. 切片/渲染结果 PNG 导出. ✅
//! 2. 原始体数据目录加载器. ✅
//! 3. 供显示层使用的会话对象 [`CtSession`]. ✅

/// 三维索引, 按 `(z, y, x)` 即 `(层, 行, 列)` 排列.
/// 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 二维索引, 按 `(行, 列)` 排列.
pub type Idx2d = (usize, usize);

/// 三维形状, 按 `(层数, 高, 宽)` 排列.
pub type Shape3d = (usize, usize, usize);

/// 3D CT 原始数据基础数据结构.
mod data;

pub use data::{
    windowing, CrossSection, CtScan, CtWindow, ImgWriteRaw, ImgWriteVis, LoadError, LoadResult,
    RegionGrid, ScanSlice, Voxel, WindowError, WindowResult,
};

pub mod consts;

pub mod dataset;

pub mod depth;

pub mod prelude;

pub mod reconstruct;

pub mod region;

pub mod registration;

mod session;

pub use session::{CtSession, DepthSource, SessionError};
