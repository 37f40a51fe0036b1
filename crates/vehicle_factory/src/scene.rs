//! Scene setup
//!
//! Builds the world once at session start: ground plane, clock publisher,
//! light, static props, then every configured vehicle, then a world reset.
//! Any failure aborts setup and is returned to the caller.

use std::time::Instant;

use contracts::{PropConfig, PropHandle, SessionBlueprint, SessionGraph};
use tracing::{error, info, instrument};

use crate::client::SimulationContext;
use crate::error::{FactoryError, Result};
use crate::factory::VehicleFactory;
use crate::pose::PoseResolver;

/// Topic simulation time is published on
pub const CLOCK_TOPIC: &str = "/clock";

/// Scene builder
#[derive(Debug)]
pub struct SceneBuilder {
    factory: VehicleFactory,
}

impl SceneBuilder {
    pub fn new(factory: VehicleFactory) -> Self {
        Self { factory }
    }

    pub fn from_blueprint(blueprint: &SessionBlueprint) -> Self {
        Self::new(VehicleFactory::from_blueprint(blueprint))
    }

    pub fn factory(&self) -> &VehicleFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut VehicleFactory {
        &mut self.factory
    }

    /// Build the whole scene described by `blueprint`
    #[instrument(
        name = "scene_builder_build",
        skip(self, ctx, blueprint),
        fields(vehicle_count = blueprint.vehicles.len(), prop_count = blueprint.props.len())
    )]
    pub fn build<C: SimulationContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        blueprint: &SessionBlueprint,
    ) -> Result<SessionGraph> {
        let started = Instant::now();
        let mut graph = SessionGraph::new();
        let world = &blueprint.world;

        if world.ground_plane.enabled {
            let path = &world.ground_plane.prim_path;
            ctx.add_ground_plane(path)
                .and_then(|_| ctx.set_xform(path, leaf_name(path), None, world.ground_plane.scale))
                .map_err(|e| FactoryError::scene_setup(path, e.to_string()))?;
            graph.ground_plane = Some(path.clone());
        }

        ctx.register_clock_publisher(CLOCK_TOPIC)
            .map_err(|e| FactoryError::scene_setup(CLOCK_TOPIC, e.to_string()))?;
        graph.clock_topic = Some(CLOCK_TOPIC.to_string());

        if world.light.enabled {
            let light = &world.light;
            ctx.define_sphere_light(
                &light.prim_path,
                light.radius,
                light.intensity,
                light.translation,
            )
            .map_err(|e| FactoryError::scene_setup(&light.prim_path, e.to_string()))?;
            graph.light = Some(light.prim_path.clone());
        }

        let data_dir = blueprint.session.data_dir();
        for prop in &blueprint.props {
            let handle = add_prop(ctx, prop, &data_dir)?;
            graph.props.push(handle);
        }

        for spec in &blueprint.vehicles {
            let vehicle = self.factory.spawn(ctx, spec).inspect_err(|e| {
                error!(vehicle_id = spec.id, error = %e, "vehicle spawn failed, aborting scene setup");
            })?;
            graph.register_vehicle(vehicle);
        }

        ctx.reset()?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_scene_setup_ms(elapsed_ms);
        info!(
            vehicles = graph.vehicles.len(),
            sensors = graph.sensor_count(),
            props = graph.props.len(),
            elapsed_ms,
            "scene setup completed"
        );

        Ok(graph)
    }

    /// Remove everything `graph` recorded
    ///
    /// Safe to call more than once.
    #[instrument(
        name = "scene_builder_teardown",
        skip(self, ctx, graph),
        fields(vehicle_count = graph.vehicles.len())
    )]
    pub fn teardown<C: SimulationContext + ?Sized>(&mut self, ctx: &mut C, graph: &SessionGraph) {
        info!("starting teardown");

        for vehicle in graph.vehicles.values() {
            self.factory.despawn(ctx, vehicle);
        }

        let world_paths = graph
            .props
            .iter()
            .map(|p| p.prim_path.as_str())
            .chain(graph.light.as_deref())
            .chain(graph.ground_plane.as_deref());
        for path in world_paths {
            if let Err(e) = ctx.remove_prim(path) {
                error!(path, error = %e, "failed to remove prim");
            }
        }

        info!("teardown completed");
    }
}

#[instrument(name = "scene_builder_add_prop", skip(ctx, prop, data_dir), fields(name = %prop.name))]
fn add_prop<C: SimulationContext + ?Sized>(
    ctx: &mut C,
    prop: &PropConfig,
    data_dir: &std::path::Path,
) -> Result<PropHandle> {
    let asset_path = data_dir.join(&prop.asset);
    let pose = PoseResolver::resolve_extrinsic(prop.position, prop.orientation);

    ctx.add_reference(&asset_path, &prop.prim_path)
        .and_then(|_| ctx.set_xform(&prop.prim_path, &prop.name, Some(&pose), prop.scale))
        .map_err(|e| FactoryError::scene_setup(&prop.prim_path, e.to_string()))?;

    info!(prim_path = %prop.prim_path, asset = %asset_path.display(), "prop added");
    Ok(PropHandle {
        name: prop.name.clone(),
        prim_path: prop.prim_path.clone(),
        asset_path: asset_path.display().to_string(),
        pose,
        scale: prop.scale,
    })
}

/// Last path segment, used as the prim name
fn leaf_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::{InMemoryConfig, InMemorySimulation, PrimKind};
    use contracts::{SensorFailurePolicy, VehicleSpec};
    use std::fs;
    use tempfile::TempDir;

    fn blueprint(dir: &TempDir) -> SessionBlueprint {
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join("config/sensor_config.yaml"),
            "stereo_camera:\n  frequency: 30\nrtx_lidar:\n  frequency: 10\n",
        )
        .unwrap();

        let mut bp = SessionBlueprint::reference();
        bp.session.working_dir = dir.path().to_path_buf();
        bp
    }

    #[test]
    fn test_reference_scene() {
        let dir = TempDir::new().unwrap();
        let bp = blueprint(&dir);
        let mut sim = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&bp);

        let graph = builder.build(&mut sim, &bp).unwrap();

        assert_eq!(graph.ground_plane.as_deref(), Some("/World/defaultGroundPlane"));
        assert_eq!(graph.light.as_deref(), Some("/World/light"));
        assert_eq!(graph.clock_topic.as_deref(), Some(CLOCK_TOPIC));
        assert_eq!(sim.clock_topics(), &[CLOCK_TOPIC.to_string()]);
        assert_eq!(graph.vehicles.len(), 1);
        assert_eq!(graph.sensor_count(), 1);
        assert_eq!(sim.timeline().resets, 1);

        let ground = sim.prim("/World/defaultGroundPlane").unwrap();
        assert_eq!(ground.scale, [10.0, 10.0, 10.0]);

        let cube = sim.prim("/World/Object").unwrap();
        assert_eq!(cube.name.as_deref(), Some("CubeObject"));
        match &cube.kind {
            PrimKind::Reference { asset } => {
                assert_eq!(asset, &dir.path().join("data").join("cube.usdc"))
            }
            other => panic!("unexpected prim kind: {other:?}"),
        }
        assert_eq!(graph.props[0].pose, PoseResolver::resolve_extrinsic([10.0, 0.0, 0.0], [45.0; 3]));
    }

    #[test]
    fn test_two_vehicles_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let mut bp = blueprint(&dir);
        bp.vehicles = vec![
            VehicleSpec::new(0).with_camera(true).with_lidar(true),
            VehicleSpec::new(1)
                .with_position([2.0, 0.0, 0.0])
                .with_camera(true)
                .with_lidar(true),
        ];
        let mut sim = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&bp);

        let graph = builder.build(&mut sim, &bp).unwrap();

        assert_eq!(graph.sensor_count(), 4);
        assert_eq!(graph.backend_count(), 2);
        assert_eq!(sim.multirotors().count(), 2);
        assert_eq!(sim.pose_tree_count(), 2);
        assert_eq!(
            graph.vehicle_paths(),
            vec!["/World/quadrotor".to_string(), "/World/quadrotor_1".to_string()]
        );
    }

    #[test]
    fn test_disabled_world_elements() {
        let dir = TempDir::new().unwrap();
        let mut bp = blueprint(&dir);
        bp.world.ground_plane.enabled = false;
        bp.world.light.enabled = false;
        bp.props.clear();
        bp.vehicles.clear();
        let mut sim = InMemorySimulation::new();

        let graph = SceneBuilder::from_blueprint(&bp).build(&mut sim, &bp).unwrap();

        assert!(graph.ground_plane.is_none());
        assert!(graph.light.is_none());
        assert_eq!(sim.prim_count(), 0);
        assert_eq!(sim.clock_topics().len(), 1);
    }

    #[test]
    fn test_prop_failure_aborts_before_vehicles() {
        let dir = TempDir::new().unwrap();
        let bp = blueprint(&dir);
        let mut sim = InMemorySimulation::with_config(InMemoryConfig {
            fail_paths: vec!["/World/Object".into()],
            ..Default::default()
        });

        let err = SceneBuilder::from_blueprint(&bp)
            .build(&mut sim, &bp)
            .unwrap_err();

        assert!(matches!(err, FactoryError::SceneSetupFailed { .. }));
        assert_eq!(sim.multirotors().count(), 0);
        assert_eq!(sim.timeline().resets, 0);
    }

    #[test]
    fn test_missing_sensor_config_file_aborts_setup() {
        let dir = TempDir::new().unwrap();
        let mut bp = SessionBlueprint::reference();
        bp.session.working_dir = dir.path().to_path_buf();
        let mut sim = InMemorySimulation::new();

        let err = SceneBuilder::from_blueprint(&bp)
            .build(&mut sim, &bp)
            .unwrap_err();

        assert!(err.to_string().contains("sensor_config.yaml"), "got: {err}");
        assert_eq!(sim.multirotors().count(), 0);
    }

    #[test]
    fn test_policy_comes_from_blueprint() {
        let dir = TempDir::new().unwrap();
        let mut bp = blueprint(&dir);
        bp.session.sensor_failure_policy = SensorFailurePolicy::RollbackVehicle;

        let builder = SceneBuilder::from_blueprint(&bp);
        assert_eq!(builder.factory().policy(), SensorFailurePolicy::RollbackVehicle);
    }

    #[test]
    fn test_teardown_idempotent() {
        let dir = TempDir::new().unwrap();
        let bp = blueprint(&dir);
        let mut sim = InMemorySimulation::new();
        let mut builder = SceneBuilder::from_blueprint(&bp);
        let graph = builder.build(&mut sim, &bp).unwrap();

        builder.teardown(&mut sim, &graph);
        builder.teardown(&mut sim, &graph);

        assert_eq!(sim.prim_count(), 0);
        assert_eq!(builder.factory().allocator().reserved_count(), 0);
    }
}
