//! 场景会话指标收集模块
//!
//! 记录飞行器生成、传感器挂载与仿真步进的运行指标。

use metrics::{counter, gauge, histogram};

/// 记录飞行器生成成功
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_vehicle_spawned;
///
/// let vehicle = factory.spawn(&mut ctx, &spec)?;
/// record_vehicle_spawned(vehicle.id(), vehicle.sensors.len());
/// ```
pub fn record_vehicle_spawned(vehicle_id: u32, sensor_count: usize) {
    counter!("scenario_vehicles_spawned_total").increment(1);
    gauge!(
        "scenario_vehicle_sensors",
        "vehicle_id" => vehicle_id.to_string()
    )
    .set(sensor_count as f64);
}

/// 记录传感器挂载
pub fn record_sensor_attached(sensor_kind: &str) {
    counter!(
        "scenario_sensors_attached_total",
        "kind" => sensor_kind.to_string()
    )
    .increment(1);
}

/// 记录生成失败
///
/// `stage` 为失败阶段，例如 "config"、"vehicle"、"sensor"。
pub fn record_spawn_failure(stage: &str) {
    counter!(
        "scenario_spawn_failures_total",
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// 记录一次仿真步进
pub fn record_sim_step(sim_time_s: f64, step_ms: f64) {
    counter!("scenario_sim_steps_total").increment(1);
    gauge!("scenario_sim_time_seconds").set(sim_time_s);
    histogram!("scenario_step_duration_ms").record(step_ms);
}

/// 记录场景搭建耗时
pub fn record_scene_setup_ms(duration_ms: f64) {
    histogram!("scenario_scene_setup_ms").record(duration_ms);
}

/// 会话指标聚合器
///
/// 在内存中聚合指标，便于在会话结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    /// 已生成飞行器数
    pub vehicles: u64,

    /// 已挂载传感器数
    pub sensors: u64,

    /// 仿真步数
    pub steps: u64,

    /// 最后一次仿真时间 (秒)
    pub sim_time: f64,

    /// 单步耗时统计 (毫秒)
    pub step_stats: RunningStats,
}

impl SessionMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_vehicle(&mut self, sensor_count: usize) {
        self.vehicles += 1;
        self.sensors += sensor_count as u64;
    }

    /// 更新步进统计
    pub fn record_step(&mut self, sim_time_s: f64, step_ms: f64) {
        self.steps += 1;
        self.sim_time = sim_time_s;
        self.step_stats.push(step_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            vehicles: self.vehicles,
            sensors: self.sensors,
            steps: self.steps,
            sim_time: self.sim_time,
            step_ms: StatsSummary::from(&self.step_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub vehicles: u64,
    pub sensors: u64,
    pub steps: u64,
    pub sim_time: f64,
    pub step_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Metrics Summary ===")?;
        writeln!(f, "Vehicles: {}", self.vehicles)?;
        writeln!(f, "Sensors: {}", self.sensors)?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Simulated time (s): {:.3}", self.sim_time)?;
        writeln!(f, "Step duration (ms): {}", self.step_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
