//! 实验结果.

use crate::profile::Profile;
use std::io::{self, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(threshold: i16, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Threshold `{threshold}` HU:")?;
    writeln!(w, "{S4}Volumes: {}", p.get_volumes())?;
    writeln!(
        w,
        "{S4}Average markers: {}",
        f64_to_display(p.get_avg_markers())
    )?;
    writeln!(w, "{S4}Registered: {}", p.get_registered())?;
    writeln!(w, "{S4}Failed: {}", p.get_failed())?;
    writeln!(
        w,
        "{S4}Average residual: {}",
        f64_to_display(p.get_avg_residual())
    )?;
    writeln!(
        w,
        "{S4}Worst residual: {}",
        f64_to_display(p.get_worst_residual())
    )?;
    writeln!(w, "{S4}Total sweep time: {} ms", p.get_sweep_time_ms())?;
    write!(w, "{S4}Most time-consuming sweep costs {} ms", p.get_most_ms())?;
    Ok(())
}

/// 阈值扫描最终结果.
pub struct AblationResult {
    data: Vec<(i16, Profile)>,
}

impl FromIterator<(i16, Profile)> for AblationResult {
    fn from_iter<I: IntoIterator<Item = (i16, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }
}

impl AblationResult {
    /// 分析运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        utils::sep_to(&mut out)?;
        for (threshold, profile) in self.data.iter() {
            describe_into(*threshold, profile, &mut out)?;
            writeln!(out)?;
            utils::sep_to(&mut out)?;
        }
        Ok(())
    }
}
