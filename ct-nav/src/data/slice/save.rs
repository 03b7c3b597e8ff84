//! 图像的持久化存储.

use crate::data::slice::{CrossSection, ScanSlice};
use crate::CtWindow;
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 以 CT HU 值存储的切片在保存时会先经过 CT 窗口映射为灰度.
pub trait ImgWriteVis {
    /// 用窗口 `window` 将 HU 值映射为灰度后, 把图片保存到 `path` 路径.
    fn save_windowed<P: AsRef<Path>>(&self, path: P, window: CtWindow) -> ImageResult<()>;

    /// 以骨窗 (见 [`CtWindow::from_bone_visual`]) 保存图片.
    #[inline]
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.save_windowed(path, CtWindow::from_bone_visual())
    }
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
///
/// 只对本身就是 8-bit 灰度的图像 (如明暗渲染结果) 有意义.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

impl ImgWriteVis for ScanSlice<'_> {
    fn save_windowed<P: AsRef<Path>>(&self, path: P, window: CtWindow) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &hu) in self.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([window.eval_saturating(hu)]));
        }
        buf.save(path)
    }
}

impl ImgWriteVis for CrossSection {
    #[inline]
    fn save_windowed<P: AsRef<Path>>(&self, path: P, window: CtWindow) -> ImageResult<()> {
        self.as_immutable().save_windowed(path, window)
    }
}

#[cfg(test)]
mod tests {
    use super::ImgWriteVis;
    use crate::{CrossSection, CtScan, CtWindow};
    use ndarray::Array3;

    #[test]
    fn test_save_cross_section() {
        let mut cs = CrossSection::new((4, 6));
        cs[(1, 2)] = 1500;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cs.png");
        cs.save_windowed(&path, CtWindow::new(0, 1500).unwrap())
            .unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (6, 4));
        assert_eq!(img.get_pixel(2, 1).0, [255]);
        assert_eq!(img.get_pixel(0, 0).0, [0]);
    }

    #[test]
    fn test_save_scan_layer() {
        let scan = CtScan::new(Array3::from_shape_fn((3, 4, 5), |(z, y, x)| {
            if z == 1 && y == 2 && x == 3 {
                2000
            } else {
                (z as i16) * 100
            }
        }));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.png");
        scan.slice_at(1)
            .save_windowed(&path, CtWindow::new(0, 200).unwrap())
            .unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (5, 4));
        // 第 1 层为 100 HU, 窗口 [0, 200] 下为 128; 超出窗口的体素饱和为白色.
        assert_eq!(img.get_pixel(0, 0).0, [128]);
        assert_eq!(img.get_pixel(3, 2).0, [255]);
    }
}
