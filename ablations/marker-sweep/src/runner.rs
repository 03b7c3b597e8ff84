//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use ct_nav::consts::MARKER_THRESHOLD;
use ct_nav::prelude::*;
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use std::io;
use std::path::Path;
use utils::loader;

/// 参与比较的标记点检测阈值 (HU).
pub const THRESHOLDS: [i16; 3] = [1200, MARKER_THRESHOLD, 1800];

/// 实际运行.
pub fn run() -> io::Result<AblationResult> {
    let dir = loader::volume_dir_from_env_or_home()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "无法确定体数据目录"))?;
    let preview = loader::preview_dir_from_env();
    if let Some(p) = &preview {
        std::fs::create_dir_all(p)?;
    }

    let mut profiles: Vec<(i16, Profile)> =
        THRESHOLDS.iter().map(|&t| (t, Profile::new())).collect();

    println!("Running marker sweep ablation on `{}`...", dir.display());
    for (name, scan) in loader::volume_loader(&dir)? {
        let scan = match scan {
            Ok(scan) => scan,
            Err(e) => {
                warn!("跳过 `{name}`: {e}");
                continue;
            }
        };
        info!("处理 `{name}`");

        let mut session = CtSession::from_scan(scan);
        for (threshold, profile) in profiles.iter_mut() {
            session.set_marker_filter(MarkerFilter::default().with_threshold(*threshold));

            profile.sweep_start();
            let n = session.locate_markers().len();
            profile.count_markers(n);
            match session.register_markers() {
                Ok(reg) => profile.count_registered(reg.final_residual()),
                Err(e) => {
                    warn!("`{name}` 在阈值 {threshold} 下配准失败: {e}");
                    profile.count_failed();
                }
            }
            profile.sweep_elapsed();
        }

        if let Some(p) = &preview {
            save_previews(&mut session, &name, p);
        }
    }

    Ok(profiles.into_iter().collect())
}

/// 输出深度明暗图, 中间层与截面预览. 失败只记录日志, 不中断实验.
fn save_previews(session: &mut CtSession, name: &str, dir: &Path) {
    let window = utils::marker_window();
    let shaded = session
        .build_depth_map(MARKER_THRESHOLD, DepthSource::Scan)
        .shade();
    if let Err(e) = shaded.save_raw(dir.join(format!("{name}.depth.png"))) {
        warn!("保存 `{name}` 深度图失败: {e}");
    }

    let (layers, height, width) = session.scan().shape();
    let layer = session.scan().slice_at(layers / 2);
    if let Err(e) = layer.save_windowed(dir.join(format!("{name}.layer.png")), window) {
        warn!("保存 `{name}` 中间层失败: {e}");
    }

    // 已配准时沿体模长轴切一刀, 否则取采集坐标系中心的横断面.
    let hint = Vector3::new(1.0, 0.0, 0.0);
    let section = if session.registration().is_some() {
        session.reconstruct_layer_world(&Point3::origin(), &Vector3::new(0.0, 0.0, 1.0), &hint)
    } else {
        let center = Point3::new(
            (width / 2) as f64,
            (height / 2) as f64,
            (layers / 2) as f64,
        );
        session.reconstruct_layer(&center, &Vector3::new(0.0, 1.0, 0.0), &hint)
    };
    match section {
        Ok(cs) => {
            if let Err(e) = cs.save_windowed(dir.join(format!("{name}.section.png")), window) {
                warn!("保存 `{name}` 截面失败: {e}");
            }
        }
        Err(e) => warn!("重建 `{name}` 截面失败: {e}"),
    }
}
