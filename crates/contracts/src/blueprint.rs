//! SessionBlueprint - Config Loader 输出
//!
//! 描述完整的会话配置：会话参数、世界、飞控后端、静态道具、飞行器。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{VehicleSpec, DEFAULT_TOPIC_PREFIX, DEFAULT_VEHICLE_BASE_PATH};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的会话蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 会话设置
    #[serde(default)]
    #[validate(nested)]
    pub session: SessionSettings,

    /// 世界设置
    #[serde(default)]
    #[validate(nested)]
    pub world: WorldSettings,

    /// 飞控后端默认参数
    #[serde(default)]
    #[validate(nested)]
    pub backend: BackendSettings,

    /// 静态道具
    #[serde(default)]
    #[validate(nested)]
    pub props: Vec<PropConfig>,

    /// 飞行器列表
    #[serde(default)]
    pub vehicles: Vec<VehicleSpec>,
}

impl SessionBlueprint {
    /// 参考场景：地面、光源、一个立方体、0 号机（仅激光雷达）
    pub fn reference() -> Self {
        Self {
            version: ConfigVersion::V1,
            session: SessionSettings::default(),
            world: WorldSettings::default(),
            backend: BackendSettings::default(),
            props: vec![PropConfig {
                name: "CubeObject".into(),
                prim_path: "/World/Object".into(),
                asset: "cube.usdc".into(),
                position: [10.0, 0.0, 0.0],
                orientation: [45.0, 45.0, 45.0],
                scale: [1.0, 1.0, 1.0],
            }],
            vehicles: vec![VehicleSpec::new(0).with_lidar(true)],
        }
    }
}

/// 传感器挂载失败时对已创建飞行器的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorFailurePolicy {
    /// 返回错误，飞行器留在场景中（缺少该传感器）
    #[default]
    KeepVehicle,
    /// 返回错误，并移除该飞行器及其已挂载的传感器
    RollbackVehicle,
}

/// 会话设置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionSettings {
    /// 无窗口运行
    #[serde(default)]
    pub headless: bool,

    /// 每步是否渲染
    #[serde(default = "default_true")]
    pub render: bool,

    /// 话题根前缀
    #[serde(default = "default_topic_prefix")]
    #[validate(length(min = 2))]
    pub topic_prefix: String,

    /// 0 号机场景路径，其余飞行器追加 `_<id>`
    #[serde(default = "default_vehicle_base_path")]
    #[validate(length(min = 2))]
    pub vehicle_base_path: String,

    /// 工作目录，`config/` 与 `data/` 相对于此目录
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// 传感器配置文件名（位于 `config/`）
    #[serde(default = "default_sensor_config")]
    #[validate(length(min = 1))]
    pub sensor_config: String,

    /// 传感器挂载失败策略
    #[serde(default)]
    pub sensor_failure_policy: SensorFailurePolicy,

    /// 在多个飞行器之间复用已解析的传感器配置
    #[serde(default)]
    pub cache_sensor_config: bool,
}

impl SessionSettings {
    /// 配置目录
    pub fn config_dir(&self) -> PathBuf {
        self.working_dir.join("config")
    }

    /// 资产目录
    pub fn data_dir(&self) -> PathBuf {
        self.working_dir.join("data")
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            headless: false,
            render: true,
            topic_prefix: default_topic_prefix(),
            vehicle_base_path: default_vehicle_base_path(),
            working_dir: default_working_dir(),
            sensor_config: default_sensor_config(),
            sensor_failure_policy: SensorFailurePolicy::default(),
            cache_sensor_config: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_topic_prefix() -> String {
    DEFAULT_TOPIC_PREFIX.to_string()
}

fn default_vehicle_base_path() -> String {
    DEFAULT_VEHICLE_BASE_PATH.to_string()
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_sensor_config() -> String {
    "sensor_config.yaml".to_string()
}

/// 世界设置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorldSettings {
    /// 物理步长 (秒)
    #[serde(default = "default_physics_dt")]
    #[validate(range(exclusive_min = 0.0))]
    pub physics_dt: f64,

    /// 渲染步长 (秒)
    #[serde(default = "default_rendering_dt")]
    #[validate(range(exclusive_min = 0.0))]
    pub rendering_dt: f64,

    /// 场景单位与米的比例
    #[serde(default = "default_stage_units")]
    #[validate(range(exclusive_min = 0.0))]
    pub stage_units_in_meters: f64,

    #[serde(default)]
    #[validate(nested)]
    pub ground_plane: GroundPlaneConfig,

    #[serde(default)]
    #[validate(nested)]
    pub light: LightConfig,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            physics_dt: default_physics_dt(),
            rendering_dt: default_rendering_dt(),
            stage_units_in_meters: default_stage_units(),
            ground_plane: GroundPlaneConfig::default(),
            light: LightConfig::default(),
        }
    }
}

fn default_physics_dt() -> f64 {
    1.0 / 250.0
}

fn default_rendering_dt() -> f64 {
    1.0 / 60.0
}

fn default_stage_units() -> f64 {
    1.0
}

/// 地面
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GroundPlaneConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ground_path")]
    #[validate(length(min = 2))]
    pub prim_path: String,

    /// 缩放 (x, y, z)
    #[serde(default = "default_ground_scale")]
    pub scale: [f64; 3],
}

impl Default for GroundPlaneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prim_path: default_ground_path(),
            scale: default_ground_scale(),
        }
    }
}

fn default_ground_path() -> String {
    "/World/defaultGroundPlane".to_string()
}

fn default_ground_scale() -> [f64; 3] {
    [10.0, 10.0, 10.0]
}

/// 球形光源
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LightConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_light_path")]
    #[validate(length(min = 2))]
    pub prim_path: String,

    #[serde(default = "default_light_radius")]
    #[validate(range(min = 0.0))]
    pub radius: f64,

    #[serde(default = "default_light_intensity")]
    #[validate(range(min = 0.0))]
    pub intensity: f64,

    #[serde(default = "default_light_translation")]
    pub translation: [f64; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prim_path: default_light_path(),
            radius: default_light_radius(),
            intensity: default_light_intensity(),
            translation: default_light_translation(),
        }
    }
}

fn default_light_path() -> String {
    "/World/light".to_string()
}

fn default_light_radius() -> f64 {
    50.0
}

fn default_light_intensity() -> f64 {
    1000.0
}

fn default_light_translation() -> [f64; 3] {
    [1000.0, 1000.0, 1000.0]
}

/// 飞控后端默认参数，所有飞行器共用
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BackendSettings {
    /// 随飞行器自动启动飞控进程
    #[serde(default = "default_true")]
    pub autolaunch: bool,

    /// 飞控可执行文件目录（此处不校验是否存在）
    #[serde(default = "default_px4_dir")]
    pub px4_dir: PathBuf,

    /// 默认机架模型
    #[serde(default = "default_airframe")]
    #[validate(length(min = 1))]
    pub default_airframe: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            autolaunch: true,
            px4_dir: default_px4_dir(),
            default_airframe: default_airframe(),
        }
    }
}

fn default_px4_dir() -> PathBuf {
    PathBuf::from("PX4-Autopilot")
}

fn default_airframe() -> String {
    "gazebo-classic_iris".to_string()
}

/// 静态道具
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PropConfig {
    /// 道具名称
    #[validate(length(min = 1))]
    pub name: String,

    /// 场景路径
    #[validate(length(min = 2))]
    pub prim_path: String,

    /// 资产文件名（位于 `data/`）
    #[validate(length(min = 1))]
    pub asset: String,

    #[serde(default)]
    pub position: [f64; 3],

    /// 欧拉角 (度)，外旋 X-Y-Z
    #[serde(default)]
    pub orientation: [f64; 3],

    #[serde(default = "default_prop_scale")]
    pub scale: [f64; 3],
}

fn default_prop_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}
