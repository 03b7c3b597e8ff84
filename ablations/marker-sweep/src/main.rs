//! 标记点检测阈值消融实验.
//!
//! 对 `$CT_NAV_VOLUME_DIR` (默认 `$HOME/dataset/ct-nav`) 下的每个原始体数据,
//! 分别以若干阈值做标记点扫描和 ICP 配准, 统计标记点数量、配准残差与耗时.
//! 设置 `$CT_NAV_PREVIEW_DIR` 时额外输出 PNG 预览. 日志级别由 `$RUST_LOG` 控制.

mod profile;
mod result;
mod runner;

fn main() -> std::io::Result<()> {
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("logger: {e}");
    }

    let result = runner::run()?;
    result.analyze()
}
