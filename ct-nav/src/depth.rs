//! 深度图投影与明暗渲染.
//!
//! 深度图是一个 2.5D 高度场: 对于每条投影线, 记录第一个不低于阈值的体素位置.
//! 明暗渲染只是用有限差分近似表面朝向的廉价手段, 并非物理光照模型.

use crate::data::ImgWriteRaw;
use crate::Idx2d;
use image::ImageResult;
use log::debug;
use ndarray::{s, Array2, ArrayView2, ArrayView3};
use std::ops::Index;
use std::path::Path;

/// 深度图. 形状为 `(层数, 宽)`, 值为沿体数据 y 轴 (行方向) 的投影深度.
#[derive(Clone, Debug)]
pub struct DepthMap {
    data: Array2<u16>,
}

impl Index<Idx2d> for DepthMap {
    type Output = u16;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl DepthMap {
    /// 直接由深度数据创建.
    #[inline]
    pub fn new(data: Array2<u16>) -> Self {
        Self { data }
    }

    /// 深度图分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 获取给定位置的深度. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<u16> {
        self.data.get(pos).copied()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<u16> {
        self.data.view()
    }

    /// 渲染明暗图.
    ///
    /// 对除最外一圈以外的像素, 计算水平/垂直有限差分 `Tx`, `Ty`, 亮度为
    /// `255 * 4 / sqrt((2Tx)^2 + (2Ty)^2 + 16)`. 最外一圈保持为 0.
    pub fn shade(&self) -> ShadedBuffer {
        let (h, w) = self.shape();
        let mut out = Array2::<u8>::zeros((h, w));
        if h < 3 || w < 3 {
            return ShadedBuffer { data: out };
        }

        let d = &self.data;
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let tx = f32::from(d[(y, x - 1)]) - f32::from(d[(y, x + 1)]);
                let ty = f32::from(d[(y - 1, x)]) - f32::from(d[(y + 1, x)]);
                let incidence = 4.0 / ((2.0 * tx).powi(2) + (2.0 * ty).powi(2) + 16.0).sqrt();
                out[(y, x)] = (255.0 * incidence) as u8;
            }
        }
        ShadedBuffer { data: out }
    }
}

/// 构建深度图.
///
/// `volume` 按 `(z, y, x)` 排列, 可以是原始扫描, 也可以是区域网格.
/// 输出像素 `(r, c)` 对应第 `r` 层中镜像列 `W - 1 - c`: 从第 0 行起逐行向下寻找,
/// 记录第一个 `>= threshold` 的行号; 若整列都低于阈值则记为 0.
pub fn build_depth_map(threshold: i16, volume: ArrayView3<'_, i16>) -> DepthMap {
    let (layers, _, width) = volume.dim();
    let mut data = Array2::<u16>::zeros((layers, width));
    for ((r, c), d) in data.indexed_iter_mut() {
        let column = volume.slice(s![r, .., width - 1 - c]);
        *d = column
            .iter()
            .position(|&v| v >= threshold)
            .map_or(0, |l| l as u16);
    }
    debug!("深度图已生成, 阈值 {threshold}, 形状 {:?}", data.dim());
    DepthMap { data }
}

/// 明暗渲染结果, 0-255 灰度.
#[derive(Clone, Debug)]
pub struct ShadedBuffer {
    data: Array2<u8>,
}

impl Index<Idx2d> for ShadedBuffer {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl ShadedBuffer {
    /// 分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<u8> {
        self.data.view()
    }
}

impl ImgWriteRaw for ShadedBuffer {
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &pix) in self.data.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
        }
        buf.save(path)
    }
}
