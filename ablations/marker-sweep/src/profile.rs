//! 扫描运行统计.

use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时 (`self.start()`).
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 累计时间 (毫秒).
    #[inline]
    fn total_ms(&self) -> u64 {
        self.consumed.as_millis() as u64
    }
}

/// 单个阈值下的扫描统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 处理过的体数据个数.
    volumes: u64,

    /// 找到的标记点总数.
    markers: u64,

    /// 配准成功次数.
    registered: u64,

    /// 配准失败次数 (通常是标记点不足).
    failed: u64,

    /// 成功配准的最终残差之和.
    residual_sum: f64,

    /// 成功配准中最大的最终残差.
    worst_residual: Option<f64>,

    /// 标记点扫描 + 配准花费的总时间.
    sweep_time: AccTimer,

    /// 单次扫描最耗时的一次.
    most: Duration,
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl Profile {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self {
            volumes: 0,
            markers: 0,
            registered: 0,
            failed: 0,
            residual_sum: 0.0,
            worst_residual: None,
            sweep_time: AccTimer::new(),
            most: Duration::ZERO,
        }
    }

    /// 开始一次扫描计时.
    #[inline]
    pub fn sweep_start(&mut self) {
        self.volumes += 1;
        self.sweep_time.start();
    }

    /// 结束一次扫描计时.
    #[inline]
    pub fn sweep_elapsed(&mut self) {
        let d = self.sweep_time.elapsed();
        self.most = self.most.max(d);
    }

    /// 记录本次找到的标记点个数.
    #[inline]
    pub fn count_markers(&mut self, n: usize) {
        self.markers += n as u64;
    }

    /// 记录一次成功配准.
    #[inline]
    pub fn count_registered(&mut self, residual: f64) {
        self.registered += 1;
        self.residual_sum += residual;
        self.worst_residual = Some(self.worst_residual.map_or(residual, |w| w.max(residual)));
    }

    /// 记录一次失败配准.
    #[inline]
    pub fn count_failed(&mut self) {
        self.failed += 1;
    }

    /// 体数据个数.
    #[inline]
    pub fn get_volumes(&self) -> u64 {
        self.volumes
    }

    /// 平均每个体数据找到的标记点数.
    #[inline]
    pub fn get_avg_markers(&self) -> Option<f64> {
        match self.volumes {
            0 => None,
            v => Some(self.markers as f64 / v as f64),
        }
    }

    /// 配准成功次数.
    #[inline]
    pub fn get_registered(&self) -> u64 {
        self.registered
    }

    /// 配准失败次数.
    #[inline]
    pub fn get_failed(&self) -> u64 {
        self.failed
    }

    /// 成功配准的平均残差.
    #[inline]
    pub fn get_avg_residual(&self) -> Option<f64> {
        match self.registered {
            0 => None,
            r => Some(self.residual_sum / r as f64),
        }
    }

    /// 成功配准中最大的残差.
    #[inline]
    pub fn get_worst_residual(&self) -> Option<f64> {
        self.worst_residual
    }

    /// 总耗时 (毫秒).
    #[inline]
    pub fn get_sweep_time_ms(&self) -> u64 {
        self.sweep_time.total_ms()
    }

    /// 最耗时一次 (毫秒).
    #[inline]
    pub fn get_most_ms(&self) -> u64 {
        self.most.as_millis() as u64
    }
}
