//! 内存仿真上下文
//!
//! 在进程内记录场景图与时间线，供测试与无引擎运行使用，支持注入失败场景。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use contracts::{BackendConfig, Pose, PoseTreeSpec, SensorHandle, SensorKind, DEFAULT_BODY_CHILDREN};
use tracing::{debug, instrument};

use crate::client::{MultirotorRequest, SimulationContext};
use crate::error::{FactoryError, Result};

/// 内存仿真配置
#[derive(Debug, Clone)]
pub struct InMemoryConfig {
    /// 物理步长 (秒)
    pub physics_dt: f64,
    /// 步数上限，达到后 `is_running` 返回 false
    pub max_steps: Option<u64>,
    /// 在这些场景路径上的创建操作会失败
    pub fail_paths: Vec<String>,
    /// 播放时每步按 physics_dt 休眠，使仿真时间与墙钟同步
    pub real_time: bool,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            physics_dt: 1.0 / 250.0,
            max_steps: None,
            fail_paths: Vec::new(),
            real_time: false,
        }
    }
}

/// 场景中的一个 prim
#[derive(Debug, Clone, PartialEq)]
pub struct PrimRecord {
    pub kind: PrimKind,
    /// 通过 `set_xform` 设置的名称
    pub name: Option<String>,
    pub pose: Pose,
    pub scale: [f64; 3],
}

impl PrimRecord {
    fn new(kind: PrimKind, pose: Pose) -> Self {
        Self {
            kind,
            name: None,
            pose,
            scale: [1.0, 1.0, 1.0],
        }
    }
}

/// prim 类型
#[derive(Debug, Clone, PartialEq)]
pub enum PrimKind {
    GroundPlane,
    Reference { asset: PathBuf },
    SphereLight { radius: f64, intensity: f64 },
    Multirotor {
        robot: String,
        vehicle_id: u32,
        backends: Vec<BackendConfig>,
    },
    /// 飞行器刚体的子链接 (body, base_link, Looks)
    Link,
    Sensor {
        sensor_kind: SensorKind,
        topic: String,
    },
}

/// 时间线状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineState {
    pub playing: bool,
    pub closed: bool,
    pub steps: u64,
    pub rendered_frames: u64,
    pub sim_time: f64,
    pub resets: u32,
}

type StepHook = Box<dyn FnMut(u64) + Send>;

/// 内存仿真上下文
pub struct InMemorySimulation {
    /// 配置（可注入失败场景）
    config: InMemoryConfig,
    /// 场景路径 -> prim
    prims: BTreeMap<String, PrimRecord>,
    /// 时钟话题
    clock_topics: Vec<String>,
    /// 飞行器场景路径 -> 位姿树发布器
    pose_trees: BTreeMap<String, PoseTreeSpec>,
    timeline: TimelineState,
    /// 每步之后调用，参数为已完成步数
    step_hook: Option<StepHook>,
}

impl InMemorySimulation {
    /// 创建默认内存仿真
    pub fn new() -> Self {
        Self::with_config(InMemoryConfig::default())
    }

    /// 使用配置创建内存仿真
    pub fn with_config(config: InMemoryConfig) -> Self {
        Self {
            config,
            prims: BTreeMap::new(),
            clock_topics: Vec::new(),
            pose_trees: BTreeMap::new(),
            timeline: TimelineState::default(),
            step_hook: None,
        }
    }

    /// 注册每步回调
    pub fn on_step(&mut self, hook: impl FnMut(u64) + Send + 'static) {
        self.step_hook = Some(Box::new(hook));
    }

    pub fn prim(&self, path: &str) -> Option<&PrimRecord> {
        self.prims.get(path)
    }

    /// 当前 prim 数量
    pub fn prim_count(&self) -> usize {
        self.prims.len()
    }

    /// 所有飞行器 prim
    pub fn multirotors(&self) -> impl Iterator<Item = (&str, &PrimRecord)> {
        self.prims
            .iter()
            .filter(|(_, p)| matches!(p.kind, PrimKind::Multirotor { .. }))
            .map(|(path, p)| (path.as_str(), p))
    }

    /// 所有传感器 prim
    pub fn sensors(&self) -> impl Iterator<Item = (&str, &PrimRecord)> {
        self.prims
            .iter()
            .filter(|(_, p)| matches!(p.kind, PrimKind::Sensor { .. }))
            .map(|(path, p)| (path.as_str(), p))
    }

    pub fn clock_topics(&self) -> &[String] {
        &self.clock_topics
    }

    pub fn pose_tree(&self, scene_path: &str) -> Option<&PoseTreeSpec> {
        self.pose_trees.get(scene_path)
    }

    pub fn pose_tree_count(&self) -> usize {
        self.pose_trees.len()
    }

    pub fn timeline(&self) -> &TimelineState {
        &self.timeline
    }

    fn ensure_open(&self) -> Result<()> {
        if self.timeline.closed {
            Err(FactoryError::SimulationClosed)
        } else {
            Ok(())
        }
    }

    fn check_injected_failure(&self, path: &str) -> Result<()> {
        if self.config.fail_paths.iter().any(|p| p == path) {
            Err(FactoryError::Contract(contracts::ContractError::scene(
                path,
                "injected failure",
            )))
        } else {
            Ok(())
        }
    }

    /// 创建新 prim；路径已存在时失败
    fn create(&mut self, path: &str, record: PrimRecord) -> Result<()> {
        self.ensure_open()?;
        self.check_injected_failure(path)?;
        if self.prims.contains_key(path) {
            return Err(FactoryError::Contract(contracts::ContractError::scene(
                path,
                "prim already exists",
            )));
        }
        self.prims.insert(path.to_string(), record);
        Ok(())
    }

    fn has_ancestor(&self, path: &str) -> bool {
        let mut current = path;
        while let Some(idx) = current.rfind('/') {
            current = &current[..idx];
            if current.is_empty() {
                return false;
            }
            if self.prims.contains_key(current) {
                return true;
            }
        }
        false
    }
}

impl Default for InMemorySimulation {
    fn default() -> Self {
        Self::new()
    }
}

fn is_under(path: &str, root: &str) -> bool {
    path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl SimulationContext for InMemorySimulation {
    #[instrument(name = "in_memory_add_ground_plane", skip(self))]
    fn add_ground_plane(&mut self, prim_path: &str) -> Result<()> {
        self.create(prim_path, PrimRecord::new(PrimKind::GroundPlane, Pose::default()))
    }

    #[instrument(name = "in_memory_set_xform", skip(self, pose), fields(has_pose = pose.is_some()))]
    fn set_xform(
        &mut self,
        prim_path: &str,
        name: &str,
        pose: Option<&Pose>,
        scale: [f64; 3],
    ) -> Result<()> {
        self.ensure_open()?;
        self.check_injected_failure(prim_path)?;
        let prim = self.prims.get_mut(prim_path).ok_or_else(|| {
            FactoryError::Contract(contracts::ContractError::scene(prim_path, "prim not found"))
        })?;
        prim.name = Some(name.to_string());
        if let Some(pose) = pose {
            prim.pose = *pose;
        }
        prim.scale = scale;
        Ok(())
    }

    #[instrument(name = "in_memory_add_reference", skip(self), fields(asset = %asset_path.display()))]
    fn add_reference(&mut self, asset_path: &Path, prim_path: &str) -> Result<()> {
        let kind = PrimKind::Reference {
            asset: asset_path.to_path_buf(),
        };
        self.create(prim_path, PrimRecord::new(kind, Pose::default()))
    }

    #[instrument(name = "in_memory_define_sphere_light", skip(self))]
    fn define_sphere_light(
        &mut self,
        prim_path: &str,
        radius: f64,
        intensity: f64,
        translation: [f64; 3],
    ) -> Result<()> {
        let kind = PrimKind::SphereLight { radius, intensity };
        self.create(prim_path, PrimRecord::new(kind, Pose::at(translation)))
    }

    #[instrument(
        name = "in_memory_spawn_multirotor",
        skip(self, request),
        fields(scene_path = %request.scene_path, vehicle_id = request.vehicle_id)
    )]
    fn spawn_multirotor(&mut self, request: &MultirotorRequest<'_>) -> Result<()> {
        let kind = PrimKind::Multirotor {
            robot: request.robot.to_string(),
            vehicle_id: request.vehicle_id,
            backends: request.backends.to_vec(),
        };
        self.create(request.scene_path, PrimRecord::new(kind, *request.pose))?;

        for child in DEFAULT_BODY_CHILDREN {
            let path = format!("{}/{child}", request.scene_path);
            self.prims
                .insert(path, PrimRecord::new(PrimKind::Link, Pose::default()));
        }
        debug!(backends = request.backends.len(), "multirotor created");
        Ok(())
    }

    #[instrument(
        name = "in_memory_attach_sensor",
        skip(self, sensor),
        fields(prim_path = %sensor.prim_path, kind = %sensor.kind)
    )]
    fn attach_sensor(&mut self, sensor: &SensorHandle) -> Result<()> {
        // 验证 parent 存在
        if !self.has_ancestor(&sensor.prim_path) {
            return Err(FactoryError::Contract(contracts::ContractError::scene(
                &sensor.prim_path,
                "parent prim not found",
            )));
        }
        let kind = PrimKind::Sensor {
            sensor_kind: sensor.kind,
            topic: sensor.topic.clone(),
        };
        self.create(&sensor.prim_path, PrimRecord::new(kind, Pose::at(sensor.mount_offset)))
    }

    fn register_clock_publisher(&mut self, topic: &str) -> Result<()> {
        self.ensure_open()?;
        self.clock_topics.push(topic.to_string());
        Ok(())
    }

    #[instrument(name = "in_memory_register_pose_tree", skip(self, spec), fields(scene_path = %spec.scene_path))]
    fn register_pose_tree_publisher(&mut self, spec: &PoseTreeSpec) -> Result<()> {
        self.ensure_open()?;
        if !self.prims.contains_key(&spec.scene_path) {
            return Err(FactoryError::Contract(contracts::ContractError::scene(
                &spec.scene_path,
                "pose tree root not found",
            )));
        }
        self.pose_trees
            .insert(spec.scene_path.clone(), spec.clone());
        Ok(())
    }

    #[instrument(name = "in_memory_remove_prim", skip(self))]
    fn remove_prim(&mut self, prim_path: &str) -> Result<()> {
        // 幂等：即使不存在也返回 Ok
        self.prims.retain(|path, _| !is_under(path, prim_path));
        self.pose_trees.retain(|path, _| !is_under(path, prim_path));
        Ok(())
    }

    fn prim_exists(&self, prim_path: &str) -> bool {
        self.prims.contains_key(prim_path)
    }

    fn reset(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.timeline.resets += 1;
        self.timeline.sim_time = 0.0;
        Ok(())
    }

    fn play(&mut self) {
        self.timeline.playing = true;
    }

    fn step(&mut self, render: bool) -> Result<()> {
        self.ensure_open()?;
        self.timeline.steps += 1;
        if self.timeline.playing {
            self.timeline.sim_time += self.config.physics_dt;
            if self.config.real_time {
                std::thread::sleep(Duration::from_secs_f64(self.config.physics_dt));
            }
        }
        if render {
            self.timeline.rendered_frames += 1;
        }
        let steps = self.timeline.steps;
        if let Some(hook) = self.step_hook.as_mut() {
            hook(steps);
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        !self.timeline.closed
            && self
                .config
                .max_steps
                .is_none_or(|max| self.timeline.steps < max)
    }

    fn stop(&mut self) {
        self.timeline.playing = false;
    }

    fn close(&mut self) {
        self.timeline.playing = false;
        self.timeline.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(path: &'a str, pose: &'a Pose) -> MultirotorRequest<'a> {
        MultirotorRequest {
            scene_path: path,
            robot: "Iris",
            vehicle_id: 0,
            pose,
            backends: &[],
        }
    }

    #[test]
    fn test_multirotor_creates_body_links() {
        let mut sim = InMemorySimulation::new();
        let pose = Pose::default();
        sim.spawn_multirotor(&request("/World/quadrotor", &pose)).unwrap();

        assert!(sim.prim_exists("/World/quadrotor"));
        assert!(sim.prim_exists("/World/quadrotor/body"));
        assert!(sim.prim_exists("/World/quadrotor/Looks"));
        assert_eq!(sim.multirotors().count(), 1);
    }

    #[test]
    fn test_remove_is_idempotent_and_recursive() {
        let mut sim = InMemorySimulation::new();
        let pose = Pose::default();
        sim.spawn_multirotor(&request("/World/quadrotor", &pose)).unwrap();
        sim.spawn_multirotor(&request("/World/quadrotor_1", &pose)).unwrap();

        sim.remove_prim("/World/quadrotor").unwrap();
        sim.remove_prim("/World/quadrotor").unwrap();

        assert!(!sim.prim_exists("/World/quadrotor/body"));
        assert!(sim.prim_exists("/World/quadrotor_1"));
    }

    #[test]
    fn test_sensor_requires_parent() {
        let mut sim = InMemorySimulation::new();
        let sensor = SensorHandle {
            kind: SensorKind::Lidar,
            vehicle_id: 0,
            prim_path: "/World/quadrotor/body/rtx_lidar".into(),
            topic: "/isaac/rtx_lidar".into(),
            mount_offset: [0.0, 0.0, 0.05],
            params: Default::default(),
        };
        assert!(sim.attach_sensor(&sensor).is_err());
    }

    #[test]
    fn test_existing_path_is_rejected() {
        let mut sim = InMemorySimulation::new();
        sim.add_ground_plane("/World/defaultGroundPlane").unwrap();
        let err = sim.add_ground_plane("/World/defaultGroundPlane").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_injected_failure() {
        let mut sim = InMemorySimulation::with_config(InMemoryConfig {
            fail_paths: vec!["/World/light".into()],
            ..Default::default()
        });
        assert!(sim
            .define_sphere_light("/World/light", 50.0, 1000.0, [0.0; 3])
            .is_err());
        assert_eq!(sim.prim_count(), 0);
    }

    #[test]
    fn test_timeline_budget() {
        let mut sim = InMemorySimulation::with_config(InMemoryConfig {
            max_steps: Some(2),
            physics_dt: 0.5,
            ..Default::default()
        });
        sim.play();
        assert!(sim.is_running());
        sim.step(true).unwrap();
        sim.step(false).unwrap();
        assert!(!sim.is_running());
        assert_eq!(sim.timeline().sim_time, 1.0);
        assert_eq!(sim.timeline().rendered_frames, 1);

        sim.close();
        assert!(matches!(sim.step(true), Err(FactoryError::SimulationClosed)));
    }
}
