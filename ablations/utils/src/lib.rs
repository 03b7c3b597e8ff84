//! 消融实验依赖的通用组件.

use ct_nav::CtWindow;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 创建便于观察金属标记与骨骼的窗口. 窗口起点为 -200, 窗宽为 2000.
#[inline]
pub fn marker_window() -> CtWindow {
    CtWindow::from_bone_visual()
}
