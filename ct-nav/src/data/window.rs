use crate::consts::gray::{BLACK, WHITE};
use crate::consts::{HU_MAX, HU_MIN, WINDOW_START_MIN, WINDOW_WIDTH_MAX, WINDOW_WIDTH_MIN};
use thiserror::Error;

/// 窗口化 (HU -> 灰度) 的状态码.
///
/// 除 [`WindowError::HuOutOfRange`] 之外, 其余两种状态仍然定义了灰度值,
/// 可以通过 [`WindowError::fallback_gray`] 获取.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum WindowError {
    /// HU 值不在 \[-1024, 3071\] 内. 灰度值无定义.
    #[error("HU 值超出 [-1024, 3071]")]
    HuOutOfRange,

    /// HU 值低于窗口起点, 或窗口起点本身越界. 灰度值为 0.
    #[error("HU 值低于窗口起点, 或窗口起点越界")]
    StartOutOfRange,

    /// HU 值高于窗口终点, 或窗宽越界. 灰度值为 255.
    #[error("HU 值高于窗口终点, 或窗宽越界")]
    WidthOutOfRange,
}

impl WindowError {
    /// 该状态下约定的灰度值. [`WindowError::HuOutOfRange`] 时返回 `None`.
    #[inline]
    pub const fn fallback_gray(&self) -> Option<u8> {
        match self {
            Self::HuOutOfRange => None,
            Self::StartOutOfRange => Some(BLACK),
            Self::WidthOutOfRange => Some(WHITE),
        }
    }
}

/// 窗口化结果.
pub type WindowResult<T> = Result<T, WindowError>;

/// 将 12-bit HU 值 `hu` 按窗口起点 `start` 和窗宽 `width` 映射为 8-bit 灰度值.
///
/// 按以下顺序判定 (顺序本身是契约的一部分):
///
/// 1. `hu` 不在 \[-1024, 3071\] 内: [`WindowError::HuOutOfRange`];
/// 2. `hu < start`, 或 `start` 不在 \[-1042, 3071\] 内: [`WindowError::StartOutOfRange`];
/// 3. `hu > start + width`, 或 `width` 不在 \[1, 4095\] 内: [`WindowError::WidthOutOfRange`];
/// 4. 否则返回 `round((hu - start) * 255 / width)`.
pub fn windowing(hu: i32, start: i32, width: i32) -> WindowResult<u8> {
    if !(HU_MIN..=HU_MAX).contains(&hu) {
        return Err(WindowError::HuOutOfRange);
    }
    if hu < start || !(WINDOW_START_MIN..=HU_MAX).contains(&start) {
        return Err(WindowError::StartOutOfRange);
    }
    if i64::from(hu) > i64::from(start) + i64::from(width)
        || !(WINDOW_WIDTH_MIN..=WINDOW_WIDTH_MAX).contains(&width)
    {
        return Err(WindowError::WidthOutOfRange);
    }
    // 先乘后除, 避免 255 / width 的舍入误差影响 .5 处的取整.
    let gray = (f64::from((hu - start) * 255) / f64::from(width)).round();
    Ok(gray as u8)
}

/// CT 窗口, 包含窗口起点 (start) 和窗宽 (width).
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CtWindow {
    start: i32,
    width: i32,
}

impl CtWindow {
    /// 构建 CT 窗.
    ///
    /// `start` 必须在 \[-1042, 3071\] 内, `width` 必须在 \[1, 4095\] 内, 否则返回 `None`.
    pub fn new(start: i32, width: i32) -> Option<CtWindow> {
        ((WINDOW_START_MIN..=HU_MAX).contains(&start)
            && (WINDOW_WIDTH_MIN..=WINDOW_WIDTH_MAX).contains(&width))
        .then_some(Self { start, width })
    }

    /// 覆盖全部合法 HU 值的窗口. 起点为 -1024, 窗宽为 4095.
    #[inline]
    pub const fn full_range() -> CtWindow {
        Self {
            start: HU_MIN,
            width: WINDOW_WIDTH_MAX,
        }
    }

    /// 构建一个便于观察骨骼与金属标记的 CT 窗口. 起点为 -200, 窗宽为 2000.
    #[inline]
    pub const fn from_bone_visual() -> CtWindow {
        Self {
            start: -200,
            width: 2000,
        }
    }

    /// 窗口起点.
    #[inline]
    pub fn start(&self) -> i32 {
        self.start
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// 窗口终点.
    #[inline]
    pub fn end(&self) -> i32 {
        self.start + self.width
    }

    /// 求在当前 CT 窗设置下, `hu` 对应的灰度值及状态. 见 [`windowing`].
    #[inline]
    pub fn eval(&self, hu: i32) -> WindowResult<u8> {
        windowing(hu, self.start, self.width)
    }

    /// 与 [`Self::eval`] 相同, 但总是返回一个可显示的灰度值.
    ///
    /// 低于合法范围的 HU 值映射为黑色, 高于合法范围的映射为白色.
    pub fn eval_saturating(&self, hu: i16) -> u8 {
        let hu = i32::from(hu);
        match self.eval(hu) {
            Ok(gray) => gray,
            Err(e) => e
                .fallback_gray()
                .unwrap_or(if hu < HU_MIN { BLACK } else { WHITE }),
        }
    }

    /// 该体素是否应当在显示层被标记为 "分割目标" (即 `hu >= threshold`).
    #[inline]
    pub fn overlay(&self, hu: i16, threshold: i16) -> bool {
        hu >= threshold
    }
}

impl Default for CtWindow {
    #[inline]
    fn default() -> Self {
        Self::full_range()
    }
}

#[cfg(test)]
mod tests {
    use super::{windowing, CtWindow, WindowError};

    #[test]
    fn test_windowing_valid_table() {
        // 下界恰为 0
        assert_eq!(windowing(-34, -34, 100), Ok(0));
        // 窗口中点, 127.5 -> 128
        assert_eq!(windowing(50, 0, 100), Ok(128));
        // 上界恰为 255
        assert_eq!(windowing(50, 0, 50), Ok(255));
    }

    #[test]
    fn test_windowing_invalid_table() {
        use WindowError::*;

        assert_eq!(windowing(-4100, -1000, 2000), Err(HuOutOfRange));
        assert_eq!(windowing(3100, -100, 2000), Err(HuOutOfRange));
        assert_eq!(windowing(100, -1500, 1000), Err(StartOutOfRange));
        assert_eq!(windowing(100, 3500, 1000), Err(StartOutOfRange));
        assert_eq!(windowing(100, 100, -100), Err(WidthOutOfRange));
        assert_eq!(windowing(100, 100, 4100), Err(WidthOutOfRange));
    }

    #[test]
    fn test_windowing_order() {
        // HU 越界优先于起点越界
        assert_eq!(windowing(-2000, 5000, 0), Err(WindowError::HuOutOfRange));
        // 起点检查比 HU 下限宽松
        assert_eq!(windowing(0, -1030, 2000), Ok(131));
        assert_eq!(windowing(0, -1043, 2000), Err(WindowError::StartOutOfRange));
        // 起点检查优先于窗宽检查
        assert_eq!(windowing(10, 20, 0), Err(WindowError::StartOutOfRange));
        // 巨大窗宽不会溢出
        assert_eq!(windowing(10, 0, i32::MAX), Err(WindowError::WidthOutOfRange));
    }

    #[test]
    fn test_fallback_gray() {
        assert_eq!(WindowError::HuOutOfRange.fallback_gray(), None);
        assert_eq!(WindowError::StartOutOfRange.fallback_gray(), Some(0));
        assert_eq!(WindowError::WidthOutOfRange.fallback_gray(), Some(255));
    }

    #[test]
    fn test_ct_window_invalid_input() {
        assert!(CtWindow::new(0, 0).is_none());
        assert!(CtWindow::new(0, 4096).is_none());
        assert!(CtWindow::new(-1043, 10).is_none());
        assert!(CtWindow::new(3072, 10).is_none());
        assert!(CtWindow::new(-1042, 1).is_some());
    }

    #[test]
    fn test_ct_window_saturating() {
        let w = CtWindow::new(0, 100).unwrap();
        assert_eq!(w.end(), 100);
        assert_eq!(w.eval_saturating(-50), 0);
        assert_eq!(w.eval_saturating(50), 128);
        assert_eq!(w.eval_saturating(150), 255);
        assert_eq!(w.eval_saturating(-2000), 0);
        assert_eq!(w.eval_saturating(4000), 255);
        assert!(w.overlay(1500, 1500));
        assert!(!w.overlay(1499, 1500));
    }
}
