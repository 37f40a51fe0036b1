//! VehicleFactory 核心实现
//!
//! 将命名空间、位姿、飞控后端与传感器组合为一个完整的飞行器，并管理其生命周期。

use config_loader::{ConfigResolver, SensorConfigSource};
use contracts::{
    PoseTreeSpec, SensorFailurePolicy, SensorHandle, SessionBlueprint, SpawnedVehicle, VehicleSpec,
};
use tracing::{error, info, instrument, warn};

use crate::backend::BackendWirer;
use crate::client::{MultirotorRequest, SimulationContext};
use crate::error::{FactoryError, Result};
use crate::namespace::NamespaceAllocator;
use crate::pose::PoseResolver;
use crate::sensor::SensorAttacher;

/// Vehicle Factory
///
/// 负责按 VehicleSpec 生成飞行器及其传感器，
/// 并提供 despawn 和按策略回滚的能力。
#[derive(Debug)]
pub struct VehicleFactory {
    allocator: NamespaceAllocator,
    wirer: BackendWirer,
    sensor_source: SensorConfigSource,
    /// 传感器配置文件名（位于配置目录下）
    sensor_config: String,
    policy: SensorFailurePolicy,
}

impl VehicleFactory {
    /// 创建新的 VehicleFactory
    pub fn new(
        allocator: NamespaceAllocator,
        wirer: BackendWirer,
        sensor_source: SensorConfigSource,
        sensor_config: impl Into<String>,
    ) -> Self {
        Self {
            allocator,
            wirer,
            sensor_source,
            sensor_config: sensor_config.into(),
            policy: SensorFailurePolicy::default(),
        }
    }

    /// 按会话蓝图创建
    pub fn from_blueprint(blueprint: &SessionBlueprint) -> Self {
        let session = &blueprint.session;
        let resolver = ConfigResolver::new(session.config_dir());
        let sensor_source = if session.cache_sensor_config {
            SensorConfigSource::cached(resolver)
        } else {
            SensorConfigSource::direct(resolver)
        };

        Self::new(
            NamespaceAllocator::new(&session.vehicle_base_path, &session.topic_prefix),
            BackendWirer::new(&blueprint.backend),
            sensor_source,
            &session.sensor_config,
        )
        .with_policy(session.sensor_failure_policy)
    }

    pub fn with_policy(mut self, policy: SensorFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SensorFailurePolicy {
        self.policy
    }

    pub fn allocator(&self) -> &NamespaceAllocator {
        &self.allocator
    }

    /// 生成单个飞行器
    ///
    /// # 失败语义
    /// - 身份重复、配置缺失或解析失败：飞行器尚未创建，场景不变
    /// - 传感器挂载失败：按 `SensorFailurePolicy` 保留或回滚飞行器
    #[instrument(
        name = "vehicle_factory_spawn",
        skip(self, ctx, spec),
        fields(vehicle_id = spec.id, camera = spec.camera, lidar = spec.lidar)
    )]
    pub fn spawn<C: SimulationContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        spec: &VehicleSpec,
    ) -> Result<SpawnedVehicle> {
        // 1. 命名空间（先检查重复，再产生副作用）
        let namespace = self.allocator.check(spec.id).inspect_err(|_| {
            observability::record_spawn_failure("namespace");
        })?;

        // 2. 位姿
        let pose = PoseResolver::resolve(spec.position, spec.rotation);

        // 3. 飞控后端（必须先于飞行器创建）
        let backends = self.wirer.wire_for(spec.id).inspect_err(|_| {
            observability::record_spawn_failure("backend");
        })?;

        // 4. 传感器配置，即使不挂载传感器也加载
        let config = self
            .sensor_source
            .fetch(&self.sensor_config)
            .inspect_err(|e| {
                observability::record_spawn_failure("config");
                error!(error = %e, "sensor configuration unavailable, vehicle not created");
            })?;

        // 5. 创建飞行器
        info!(scene_path = %namespace.scene_path, robot = %spec.robot, "spawning vehicle");
        ctx.spawn_multirotor(&MultirotorRequest {
            scene_path: &namespace.scene_path,
            robot: &spec.robot,
            vehicle_id: spec.id,
            pose: &pose,
            backends: &backends,
        })
        .map_err(|e| {
            observability::record_spawn_failure("vehicle");
            FactoryError::vehicle_spawn(spec.id, &namespace.scene_path, e)
        })?;
        self.allocator.reserve(spec.id)?;

        // 6. 传感器：先相机后激光雷达
        let mut sensors: Vec<SensorHandle> = Vec::new();
        for kind in spec.requested_sensors() {
            match SensorAttacher::attach(
                ctx,
                kind,
                &config,
                &namespace,
                &namespace.scene_path,
                spec.id,
                kind.default_mount(),
            ) {
                Ok(handle) => {
                    observability::record_sensor_attached(kind.config_key());
                    sensors.push(handle);
                }
                Err(e) => {
                    observability::record_spawn_failure("sensor");
                    return Err(self.after_construction_failure(
                        ctx,
                        spec.id,
                        &namespace.scene_path,
                        &sensors,
                        e,
                    ));
                }
            }
        }

        // 7. 位姿树发布
        let pose_tree = PoseTreeSpec::new(&namespace.scene_path, &namespace.topic_prefix);
        if let Err(e) = ctx.register_pose_tree_publisher(&pose_tree) {
            observability::record_spawn_failure("pose_tree");
            return Err(self.after_construction_failure(
                ctx,
                spec.id,
                &namespace.scene_path,
                &sensors,
                e,
            ));
        }

        observability::record_vehicle_spawned(spec.id, sensors.len());
        info!(
            scene_path = %namespace.scene_path,
            topic_prefix = %namespace.topic_prefix,
            sensors = sensors.len(),
            port = backends[0].connection_port(),
            "vehicle spawned successfully"
        );

        Ok(SpawnedVehicle {
            spec: spec.clone(),
            namespace,
            pose,
            backends,
            sensors,
            pose_tree,
        })
    }

    /// 移除飞行器及其传感器，并释放身份
    ///
    /// # 幂等性
    /// 多次调用安全，不存在的 prim 会被忽略。
    #[instrument(
        name = "vehicle_factory_despawn",
        skip(self, ctx, vehicle),
        fields(vehicle_id = vehicle.id(), scene_path = %vehicle.scene_path())
    )]
    pub fn despawn<C: SimulationContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        vehicle: &SpawnedVehicle,
    ) {
        // 先移除传感器
        for sensor in &vehicle.sensors {
            remove_prim_safe(ctx, &sensor.prim_path);
        }
        // 再移除飞行器
        remove_prim_safe(ctx, vehicle.scene_path());
        self.allocator.release(vehicle.id());
    }

    /// 飞行器已创建后的失败处理
    fn after_construction_failure<C: SimulationContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        vehicle_id: u32,
        scene_path: &str,
        sensors: &[SensorHandle],
        cause: FactoryError,
    ) -> FactoryError {
        match self.policy {
            SensorFailurePolicy::KeepVehicle => {
                warn!(
                    vehicle_id,
                    scene_path,
                    attached = sensors.len(),
                    error = %cause,
                    "vehicle left in scene without all requested sensors"
                );
            }
            SensorFailurePolicy::RollbackVehicle => {
                // 回滚该飞行器的所有传感器
                warn!(
                    vehicle_id,
                    scene_path,
                    error = %cause,
                    "spawn failed after construction, rolling back vehicle"
                );
                for sensor in sensors {
                    remove_prim_safe(ctx, &sensor.prim_path);
                }
                remove_prim_safe(ctx, scene_path);
                self.allocator.release(vehicle_id);
            }
        }
        cause
    }
}

/// 安全移除 prim（忽略错误，仅记录日志）
fn remove_prim_safe<C: SimulationContext + ?Sized>(ctx: &mut C, prim_path: &str) {
    info!(prim_path, "removing prim");
    if let Err(e) = ctx.remove_prim(prim_path) {
        error!(prim_path, error = %e, "failed to remove prim");
    }
}
