//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 内存仿真 e2e 测试（无需真实引擎）
//! - 失败策略与回滚

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, SensorKind, DEFAULT_TOPIC_PREFIX, DEFAULT_VEHICLE_BASE_PATH};

    #[test]
    fn test_contracts_compile() {
        let _ = ConfigVersion::V1;
        assert_eq!(DEFAULT_VEHICLE_BASE_PATH, "/World/quadrotor");
        assert_eq!(DEFAULT_TOPIC_PREFIX, "/isaac");
        assert_eq!(SensorKind::ALL, [SensorKind::Camera, SensorKind::Lidar]);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::path::Path;

    use config_loader::ConfigLoader;
    use contracts::{
        ContractError, SensorFailurePolicy, SensorKind, SessionBlueprint, VehicleSpec,
        MAX_VEHICLE_ID,
    };
    use tempfile::TempDir;
    use vehicle_factory::{
        ExitReason, FactoryError, InMemoryConfig, InMemorySimulation, PrimKind, SceneBuilder,
        SessionRunner, SimulationContext, VehicleFactory, CLOCK_TOPIC,
    };

    const FULL_SENSOR_CONFIG: &str = "\
stereo_camera:
  frequency: 30
  resolution: [640, 480]
rtx_lidar:
  frequency: 10
  channels: 32
";

    /// 创建带 `config/` 的工作目录
    fn working_dir(sensor_config: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        if let Some(content) = sensor_config {
            write_sensor_config(dir.path(), content);
        }
        dir
    }

    fn write_sensor_config(root: &Path, content: &str) {
        fs::write(root.join("config/sensor_config.yaml"), content).unwrap();
    }

    fn blueprint_in(dir: &TempDir) -> SessionBlueprint {
        let mut blueprint = SessionBlueprint::reference();
        blueprint.session.working_dir = dir.path().to_path_buf();
        blueprint
    }

    /// 参考场景：0 号机、仅激光雷达
    #[test]
    fn test_e2e_reference_scene() {
        let dir = working_dir(Some(FULL_SENSOR_CONFIG));
        let blueprint = blueprint_in(&dir);
        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);

        let graph = builder.build(&mut ctx, &blueprint).unwrap();

        // 世界
        assert_eq!(graph.ground_plane.as_deref(), Some("/World/defaultGroundPlane"));
        assert_eq!(graph.light.as_deref(), Some("/World/light"));
        assert_eq!(ctx.clock_topics().to_vec(), vec![CLOCK_TOPIC.to_string()]);
        let ground = ctx.prim("/World/defaultGroundPlane").unwrap();
        assert_eq!(ground.scale, [10.0, 10.0, 10.0]);

        let cube = ctx.prim("/World/Object").unwrap();
        match &cube.kind {
            PrimKind::Reference { asset } => assert!(asset.ends_with("data/cube.usdc")),
            other => panic!("unexpected prim kind: {other:?}"),
        }

        // 飞行器
        let vehicle = &graph.vehicles[&0];
        assert_eq!(vehicle.scene_path(), "/World/quadrotor");
        assert_eq!(vehicle.namespace.topic_prefix, "/isaac");
        assert!(vehicle.sensor(SensorKind::Camera).is_none());

        let lidar = vehicle.sensor(SensorKind::Lidar).unwrap();
        assert_eq!(lidar.topic, "/isaac/rtx_lidar");
        assert_eq!(lidar.prim_path, "/World/quadrotor/body/rtx_lidar");
        assert_eq!(lidar.params["channels"], 32);

        assert_eq!(vehicle.backends.len(), 1);
        assert_eq!(vehicle.backends[0].connection_port(), 4560);
        assert!(ctx.pose_tree("/World/quadrotor").is_some());

        // 构建结束后时间线已复位
        assert_eq!(ctx.timeline().resets, 1);
    }

    /// 两个飞行器，各挂载相机和激光雷达，命名空间互不冲突
    #[test]
    fn test_e2e_two_vehicles_no_collisions() {
        let dir = working_dir(Some(FULL_SENSOR_CONFIG));
        let mut blueprint = blueprint_in(&dir);
        blueprint.vehicles = vec![
            VehicleSpec::new(0).with_camera(true).with_lidar(true),
            VehicleSpec::new(1)
                .with_position([2.0, 0.0, 0.07])
                .with_camera(true)
                .with_lidar(true),
        ];
        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);

        let graph = builder.build(&mut ctx, &blueprint).unwrap();

        assert_eq!(graph.vehicles.len(), 2);
        assert_eq!(graph.sensor_count(), 4);
        assert_eq!(graph.backend_count(), 2);
        assert_eq!(ctx.sensors().count(), 4);
        assert_eq!(ctx.pose_tree_count(), 2);
        assert_eq!(
            graph.vehicle_paths(),
            vec!["/World/quadrotor".to_string(), "/World/quadrotor_1".to_string()]
        );

        let topics: Vec<&str> = graph
            .vehicles
            .values()
            .flat_map(|v| v.sensors.iter().map(|s| s.topic.as_str()))
            .collect();
        assert_eq!(
            topics,
            vec![
                "/isaac/stereo_camera",
                "/isaac/rtx_lidar",
                "/isaac_1/stereo_camera",
                "/isaac_1/rtx_lidar",
            ]
        );

        let ports: Vec<u16> = graph
            .vehicles
            .values()
            .map(|v| v.backends[0].connection_port())
            .collect();
        assert_eq!(ports, vec![4560, 4561]);
    }

    /// 传感器配置缺失：飞行器创建前中止
    #[test]
    fn test_e2e_missing_sensor_config_aborts_before_vehicle() {
        let dir = working_dir(None);
        let blueprint = blueprint_in(&dir);
        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);

        let err = builder.build(&mut ctx, &blueprint).unwrap_err();

        assert!(matches!(
            err.contract(),
            Some(ContractError::ConfigNotFound { .. })
        ));
        assert_eq!(ctx.multirotors().count(), 0);
        assert!(!builder.factory().allocator().is_reserved(0));
        // 世界部分已创建
        assert!(ctx.prim("/World/Object").is_some());
    }

    /// 缺少传感器段落 + 默认策略：飞行器保留，身份保持占用
    #[test]
    fn test_e2e_keep_vehicle_on_sensor_failure() {
        let dir = working_dir(Some("stereo_camera:\n  frequency: 30\n"));
        let mut blueprint = blueprint_in(&dir);
        blueprint.vehicles = vec![VehicleSpec::new(3).with_camera(true).with_lidar(true)];
        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);

        let err = builder.build(&mut ctx, &blueprint).unwrap_err();

        assert!(err.is_missing_sensor_config());
        assert!(matches!(err, FactoryError::SensorAttachFailed { kind: SensorKind::Lidar, .. }));
        assert!(ctx.prim("/World/quadrotor_3").is_some());
        assert!(ctx.prim("/World/quadrotor_3/body/stereo_camera").is_some());
        assert!(ctx.prim("/World/quadrotor_3/body/rtx_lidar").is_none());
        assert!(builder.factory().allocator().is_reserved(3));

        // 身份仍被占用，重复生成被拒绝
        let retry = builder
            .factory_mut()
            .spawn(&mut ctx, &blueprint.vehicles[0])
            .unwrap_err();
        assert!(matches!(
            retry.contract(),
            Some(ContractError::DuplicateVehicleIdentity { vehicle_id: 3, .. })
        ));
    }

    /// 回滚策略：飞行器与已挂载的传感器被移除，身份释放
    #[test]
    fn test_e2e_rollback_vehicle_on_sensor_failure() {
        let dir = working_dir(Some("stereo_camera:\n  frequency: 30\n"));
        let mut blueprint = blueprint_in(&dir);
        blueprint.session.sensor_failure_policy = SensorFailurePolicy::RollbackVehicle;
        blueprint.vehicles = vec![VehicleSpec::new(3).with_camera(true).with_lidar(true)];
        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);

        let err = builder.build(&mut ctx, &blueprint).unwrap_err();

        assert!(err.is_missing_sensor_config());
        assert_eq!(ctx.multirotors().count(), 0);
        assert_eq!(ctx.sensors().count(), 0);
        assert!(!builder.factory().allocator().is_reserved(3));

        // 补齐配置后可用同一身份重新生成
        write_sensor_config(dir.path(), FULL_SENSOR_CONFIG);
        let vehicle = builder
            .factory_mut()
            .spawn(&mut ctx, &blueprint.vehicles[0])
            .unwrap();
        assert_eq!(vehicle.sensors.len(), 2);
        assert_eq!(vehicle.scene_path(), "/World/quadrotor_3");
    }

    /// 额外的标量键与空段落不影响未请求的传感器
    #[test]
    fn test_e2e_extra_keys_in_sensor_config() {
        let dir = working_dir(Some("version: 1
stereo_camera:
rtx_lidar:
  frequency: 10
"));
        let blueprint = blueprint_in(&dir);
        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);

        let graph = builder.build(&mut ctx, &blueprint).unwrap();

        let vehicle = &graph.vehicles[&0];
        assert_eq!(vehicle.sensors.len(), 1);
        assert_eq!(vehicle.sensors[0].kind, SensorKind::Lidar);
        assert_eq!(vehicle.sensors[0].params["frequency"], 10);
    }

    /// 请求的段落为空：按缺失处理
    #[test]
    fn test_e2e_empty_requested_section() {
        let dir = working_dir(Some("version: 1
stereo_camera:
rtx_lidar:
  frequency: 10
"));
        let mut blueprint = blueprint_in(&dir);
        blueprint.vehicles = vec![VehicleSpec::new(1).with_camera(true)];
        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);

        let err = builder.build(&mut ctx, &blueprint).unwrap_err();

        assert!(err.is_missing_sensor_config());
        assert!(matches!(err, FactoryError::SensorAttachFailed { kind: SensorKind::Camera, .. }));
        assert!(ctx.prim("/World/quadrotor_1").is_some());
        assert_eq!(ctx.sensors().count(), 0);
    }

    /// 最大身份对应最后一个 MAVLink 端口，超出则在任何副作用之前被拒绝
    #[test]
    fn test_e2e_identity_port_bound() {
        let dir = working_dir(Some(FULL_SENSOR_CONFIG));
        let mut blueprint = blueprint_in(&dir);
        blueprint.vehicles = vec![VehicleSpec::new(MAX_VEHICLE_ID)];
        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);

        let graph = builder.build(&mut ctx, &blueprint).unwrap();
        let vehicle = &graph.vehicles[&MAX_VEHICLE_ID];
        assert_eq!(vehicle.backends[0].connection_port(), u16::MAX);

        let err = builder
            .factory_mut()
            .spawn(&mut ctx, &VehicleSpec::new(MAX_VEHICLE_ID + 1))
            .unwrap_err();
        assert!(matches!(
            err.contract(),
            Some(ContractError::VehicleIdOutOfRange { .. })
        ));
        assert_eq!(ctx.multirotors().count(), 1);

        let err = ConfigLoader::load_from_str(
            "[[vehicles]]\nid = 4294967295\n",
            config_loader::ConfigFormat::Toml,
        )
        .unwrap_err();
        assert!(err.to_string().contains("out of range"), "got: {err}");
    }

    /// 重复身份：校验器与工厂都会拒绝
    #[test]
    fn test_e2e_duplicate_identity() {
        let err = ConfigLoader::load_from_str(
            "[[vehicles]]\nid = 2\n\n[[vehicles]]\nid = 2\n",
            config_loader::ConfigFormat::Toml,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ContractError::DuplicateVehicleIdentity { vehicle_id: 2, ref scene_path }
                if scene_path == "/World/quadrotor_2"
        ));

        // 绕过校验直接交给场景构建
        let dir = working_dir(Some(FULL_SENSOR_CONFIG));
        let mut blueprint = blueprint_in(&dir);
        blueprint.vehicles = vec![VehicleSpec::new(2), VehicleSpec::new(2).with_camera(true)];
        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);

        let err = builder.build(&mut ctx, &blueprint).unwrap_err();

        assert!(matches!(
            err.contract(),
            Some(ContractError::DuplicateVehicleIdentity { vehicle_id: 2, .. })
        ));
        // 第一个飞行器不受影响
        assert_eq!(ctx.multirotors().count(), 1);
        assert_eq!(ctx.sensors().count(), 0);
    }

    /// 缓存的传感器配置在文件删除后仍可用；直接读取则失败
    #[test]
    fn test_e2e_cached_sensor_config() {
        for cached in [true, false] {
            let dir = working_dir(Some(FULL_SENSOR_CONFIG));
            let mut blueprint = blueprint_in(&dir);
            blueprint.session.cache_sensor_config = cached;
            let mut factory = VehicleFactory::from_blueprint(&blueprint);
            let mut ctx = InMemorySimulation::new();

            factory
                .spawn(&mut ctx, &VehicleSpec::new(0).with_lidar(true))
                .unwrap();
            fs::remove_file(dir.path().join("config/sensor_config.yaml")).unwrap();

            let second = factory.spawn(&mut ctx, &VehicleSpec::new(1).with_lidar(true));
            assert_eq!(second.is_ok(), cached, "cached = {cached}");
        }
    }

    /// 从文件加载蓝图并构建场景，工作目录相对于文件所在目录
    #[test]
    fn test_e2e_loaded_from_file() {
        let dir = working_dir(Some(FULL_SENSOR_CONFIG));
        let path = dir.path().join("scenario.toml");
        fs::write(
            &path,
            r#"
[session]
headless = true
topic_prefix = "/drone"

[world.light]
enabled = false

[[props]]
name = "Crate"
prim_path = "/World/Crate"
asset = "crate.usdc"
position = [3.0, 1.0, 0.0]

[[vehicles]]
id = 0
camera = true

[[vehicles]]
id = 5
position = [0.0, 4.0, 0.07]
rotation = [0.0, 0.0, 90.0]
lidar = true
"#,
        )
        .unwrap();

        let blueprint = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(blueprint.session.working_dir, dir.path().join("."));

        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);
        let graph = builder.build(&mut ctx, &blueprint).unwrap();

        assert!(graph.light.is_none());
        assert!(ctx.prim("/World/light").is_none());
        assert_eq!(graph.props[0].prim_path, "/World/Crate");
        assert_eq!(
            graph.vehicles[&0].sensors[0].topic,
            "/drone/stereo_camera"
        );
        assert_eq!(graph.vehicles[&5].sensors[0].topic, "/drone_5/rtx_lidar");
        assert_eq!(graph.vehicles[&5].backends[0].connection_port(), 4565);

        let yaw = graph.vehicles[&5].pose.quat_xyzw();
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert!((yaw[2] - half).abs() < 1e-9);
        assert!((yaw[3] - half).abs() < 1e-9);
    }

    /// 构建 → 运行 → 拆除
    #[test]
    fn test_e2e_session_lifecycle() {
        let dir = working_dir(Some(FULL_SENSOR_CONFIG));
        let blueprint = blueprint_in(&dir);
        let mut ctx = InMemorySimulation::with_config(InMemoryConfig {
            max_steps: Some(25),
            ..Default::default()
        });
        let mut builder = SceneBuilder::from_blueprint(&blueprint);
        let graph = builder.build(&mut ctx, &blueprint).unwrap();

        let mut runner = SessionRunner::new(false, blueprint.world.physics_dt);
        let stats = runner.run(&mut ctx).unwrap();

        assert_eq!(stats.steps, 25);
        assert_eq!(stats.exit_reason, ExitReason::AppClosed);
        assert_eq!(stats.metrics.steps, 25);
        assert!(ctx.timeline().closed);
        assert!(!ctx.timeline().playing);
        assert!(!ctx.is_running());

        // 拆除只作用于记录的路径，且可重复调用
        builder.teardown(&mut ctx, &graph);
        builder.teardown(&mut ctx, &graph);
        assert!(!builder.factory().allocator().is_reserved(0));
    }

    /// 运行中途请求停止
    #[test]
    fn test_e2e_stop_from_step_hook() {
        let dir = working_dir(Some(FULL_SENSOR_CONFIG));
        let blueprint = blueprint_in(&dir);
        let mut ctx = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&blueprint);
        builder.build(&mut ctx, &blueprint).unwrap();

        let mut runner = SessionRunner::new(true, blueprint.world.physics_dt);
        let stop = runner.stop_handle();
        ctx.on_step(move |step| {
            if step == 10 {
                stop.request_stop();
            }
        });
        let stats = runner.run(&mut ctx).unwrap();

        assert_eq!(stats.steps, 10);
        assert_eq!(stats.exit_reason, ExitReason::StopRequested);
        assert_eq!(ctx.timeline().rendered_frames, 10);
    }
}
