use crate::depth::{build_depth_map, DepthMap};
use crate::reconstruct::{
    reconstruct_layer, reconstruct_layer_world, ReconstructError, ReconstructResult,
};
use crate::region::{
    grow_region, GrowError, GrowResult, Marker, MarkerFilter, MarkerLocator, Region, VisitedMask,
};
use crate::registration::{IcpRegistrar, Registration, RegistrationError, RegistrationResult};
use crate::{
    windowing, CrossSection, CtScan, LoadError, RegionGrid, Shape3d, Voxel, WindowError,
    WindowResult,
};
use nalgebra::{Point3, Vector3};
use std::path::Path;
use thiserror::Error;

/// 会话级错误, 汇总各模块的错误.
#[derive(Debug, Error)]
pub enum SessionError {
    /// 加载失败.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// 窗口化失败.
    #[error(transparent)]
    Window(#[from] WindowError),

    /// 区域生长失败.
    #[error(transparent)]
    Grow(#[from] GrowError),

    /// 配准失败.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// 重建失败.
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),
}

/// 深度图的投影来源.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum DepthSource {
    /// 原始扫描.
    #[default]
    Scan,
    /// 区域网格 (最近一次区域生长或标记点扫描的结果).
    Region,
}

/// 供显示层使用的分析会话.
///
/// 持有一份已加载的扫描以及与之平行的全部可变状态 (区域网格、访问标记、重建截面、
/// 标记点、配准结果). 所有调用都是同步的; 需要可变状态的操作以 `&mut self` 串行化.
#[derive(Debug)]
pub struct CtSession {
    scan: CtScan,
    region: RegionGrid,
    visited: VisitedMask,
    cross_section: CrossSection,
    locator: MarkerLocator,
    registrar: IcpRegistrar,
    markers: Vec<Marker>,
    registration: Option<Registration>,
}

impl CtSession {
    /// 加载标准形状的原始扫描并创建会话.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        Ok(Self::from_scan(CtScan::open(path)?))
    }

    /// 以给定形状加载原始扫描并创建会话.
    pub fn open_with_shape<P: AsRef<Path>>(path: P, shape: Shape3d) -> Result<Self, SessionError> {
        Ok(Self::from_scan(CtScan::open_with_shape(path, shape)?))
    }

    /// 用已加载的扫描创建会话.
    pub fn from_scan(scan: CtScan) -> Self {
        let region = RegionGrid::like(&scan);
        let visited = VisitedMask::like(&scan);
        let cross_section = CrossSection::new((scan.height(), scan.width()));
        Self {
            scan,
            region,
            visited,
            cross_section,
            locator: MarkerLocator::default(),
            registrar: IcpRegistrar::default(),
            markers: Vec::new(),
            registration: None,
        }
    }

    /// 修改标记点筛选条件.
    pub fn with_marker_filter(mut self, filter: MarkerFilter) -> Self {
        self.locator = MarkerLocator::new(filter);
        self
    }

    /// 就地修改标记点筛选条件. 已找到的标记点保持不变.
    pub fn set_marker_filter(&mut self, filter: MarkerFilter) {
        self.locator = MarkerLocator::new(filter);
    }

    /// 扫描数据.
    #[inline]
    pub fn scan(&self) -> &CtScan {
        &self.scan
    }

    /// 区域网格.
    #[inline]
    pub fn region(&self) -> &RegionGrid {
        &self.region
    }

    /// 最近一次重建的截面.
    #[inline]
    pub fn cross_section(&self) -> &CrossSection {
        &self.cross_section
    }

    /// 最近一次扫描得到的标记点.
    #[inline]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// 最近一次成功的配准.
    #[inline]
    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    /// 窗口化. 见 [`windowing`].
    #[inline]
    pub fn window(&self, hu: i32, start: i32, width: i32) -> WindowResult<u8> {
        windowing(hu, start, width)
    }

    /// 构建深度图.
    pub fn build_depth_map(&self, threshold: i16, source: DepthSource) -> DepthMap {
        match source {
            DepthSource::Scan => build_depth_map(threshold, self.scan.data()),
            DepthSource::Region => build_depth_map(threshold, self.region.data()),
        }
    }

    /// 从 `seed` 出发做一次独立的区域生长.
    ///
    /// 开始前清空访问标记并重置区域网格.
    pub fn grow_region(&mut self, seed: Voxel, threshold: i16) -> GrowResult<Region> {
        self.visited.clear();
        self.region.reset();
        grow_region(&self.scan, &mut self.visited, &mut self.region, seed, threshold)
    }

    /// 扫描全体积定位标记点. 结果同时保存在会话中.
    ///
    /// 之前的配准结果来自旧的标记点, 会被一并清除.
    pub fn locate_markers(&mut self) -> &[Marker] {
        self.registration = None;
        self.markers = self
            .locator
            .locate(&self.scan, &mut self.visited, &mut self.region);
        &self.markers
    }

    /// 用最近一次找到的标记点做配准. 失败时不改动已有的配准结果.
    pub fn register_markers(&mut self) -> RegistrationResult<&Registration> {
        let centroids: Vec<Voxel> = self.markers.iter().map(|m| m.centroid).collect();
        let reg = self.registrar.register_voxels(&centroids, self.scan.shape())?;
        Ok(&*self.registration.insert(reg))
    }

    /// 在体素坐标下重建斜切面. 见 [`reconstruct_layer`].
    pub fn reconstruct_layer(
        &mut self,
        center: &Point3<f64>,
        axis: &Vector3<f64>,
        hint: &Vector3<f64>,
    ) -> ReconstructResult<&CrossSection> {
        reconstruct_layer(&self.scan, &mut self.cross_section, center, axis, hint)?;
        Ok(&self.cross_section)
    }

    /// 在世界坐标下重建斜切面. 尚未配准时返回 [`ReconstructError::NotRegistered`].
    pub fn reconstruct_layer_world(
        &mut self,
        center: &Point3<f64>,
        axis: &Vector3<f64>,
        hint: &Vector3<f64>,
    ) -> ReconstructResult<&CrossSection> {
        let reg = self
            .registration
            .as_ref()
            .ok_or(ReconstructError::NotRegistered)?;
        reconstruct_layer_world(
            &self.scan,
            &mut self.cross_section,
            &reg.transform,
            center,
            axis,
            hint,
        )?;
        Ok(&self.cross_section)
    }
}
