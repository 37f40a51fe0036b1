//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{SessionBlueprint, VehicleSpec};
use serde::Serialize;
use tracing::info;
use vehicle_factory::{BackendWirer, NamespaceAllocator, PoseResolver};

use crate::cli::InfoArgs;

/// Scenario info for JSON output
#[derive(Debug, Serialize)]
struct ScenarioInfo {
    version: String,
    session: SessionInfo,
    world: WorldInfo,
    props: Vec<PropInfo>,
    vehicles: Vec<VehicleInfo>,
}

#[derive(Debug, Serialize)]
struct SessionInfo {
    headless: bool,
    working_dir: String,
    sensor_config: String,
    topic_prefix: String,
    sensor_failure_policy: String,
}

#[derive(Debug, Serialize)]
struct WorldInfo {
    physics_dt: f64,
    rendering_dt: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ground_plane: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    light: Option<String>,
}

#[derive(Debug, Serialize)]
struct PropInfo {
    name: String,
    prim_path: String,
    asset: String,
}

#[derive(Debug, Serialize)]
struct VehicleInfo {
    id: u32,
    robot: String,
    position: [f64; 3],
    rotation: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    wiring: Option<WiringInfo>,
}

/// Derived namespace, topics and backend handshake of one vehicle
#[derive(Debug, Serialize)]
struct WiringInfo {
    scene_path: String,
    topic_prefix: String,
    sensor_topics: Vec<String>,
    orientation_xyzw: [f64; 4],
    mavlink_port: u16,
    connection_uri: String,
    airframe: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading scenario info");

    if !args.config.exists() {
        anyhow::bail!("Scenario file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load scenario from {}", args.config.display()))?;

    let info = build_scenario_info(&blueprint, args.vehicles)?;
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize scenario info")?;
        println!("{}", json);
    } else {
        print_scenario_info(&info);
    }

    Ok(())
}

fn build_scenario_info(blueprint: &SessionBlueprint, with_wiring: bool) -> Result<ScenarioInfo> {
    let session = &blueprint.session;
    let allocator = NamespaceAllocator::new(&session.vehicle_base_path, &session.topic_prefix);
    let wirer = BackendWirer::new(&blueprint.backend);

    let vehicles = blueprint
        .vehicles
        .iter()
        .map(|v| {
            let wiring = with_wiring
                .then(|| build_wiring(&allocator, &wirer, v))
                .transpose()?;

            Ok(VehicleInfo {
                id: v.id,
                robot: v.robot.clone(),
                position: v.position,
                rotation: v.rotation,
                wiring,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let world = &blueprint.world;
    Ok(ScenarioInfo {
        version: format!("{:?}", blueprint.version),
        session: SessionInfo {
            headless: session.headless,
            working_dir: session.working_dir.display().to_string(),
            sensor_config: session.sensor_config.clone(),
            topic_prefix: session.topic_prefix.clone(),
            sensor_failure_policy: format!("{:?}", session.sensor_failure_policy),
        },
        world: WorldInfo {
            physics_dt: world.physics_dt,
            rendering_dt: world.rendering_dt,
            ground_plane: world
                .ground_plane
                .enabled
                .then(|| world.ground_plane.prim_path.clone()),
            light: world.light.enabled.then(|| world.light.prim_path.clone()),
        },
        props: blueprint
            .props
            .iter()
            .map(|p| PropInfo {
                name: p.name.clone(),
                prim_path: p.prim_path.clone(),
                asset: p.asset.clone(),
            })
            .collect(),
        vehicles,
    })
}

fn build_wiring(
    allocator: &NamespaceAllocator,
    wirer: &BackendWirer,
    vehicle: &VehicleSpec,
) -> Result<WiringInfo> {
    let namespace = allocator.allocate(vehicle.id);
    let backends = wirer
        .wire_for(vehicle.id)
        .with_context(|| format!("Failed to wire backend for vehicle {}", vehicle.id))?;
    let backend = &backends[0];
    let sensor_topics = vehicle
        .requested_sensors()
        .map(|kind| format!("{}/{}", namespace.topic_prefix, kind.config_key()))
        .collect();

    Ok(WiringInfo {
        orientation_xyzw: PoseResolver::resolve(vehicle.position, vehicle.rotation).quat_xyzw(),
        mavlink_port: backend.connection_port(),
        connection_uri: backend.connection_uri(),
        airframe: backend.airframe.clone(),
        scene_path: namespace.scene_path,
        topic_prefix: namespace.topic_prefix,
        sensor_topics,
    })
}

fn print_scenario_info(info: &ScenarioInfo) {
    println!("=== Sim Scenario ===\n");

    println!("Session");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Working dir: {}", info.session.working_dir);
    println!("   ├─ Sensor config: {}", info.session.sensor_config);
    println!("   ├─ Topic prefix: {}", info.session.topic_prefix);
    println!("   ├─ Headless: {}", info.session.headless);
    println!("   └─ Sensor failure policy: {}", info.session.sensor_failure_policy);

    println!("\nWorld");
    println!(
        "   ├─ Physics dt: {:.4}s, rendering dt: {:.4}s",
        info.world.physics_dt, info.world.rendering_dt
    );
    println!(
        "   ├─ Ground plane: {}",
        info.world.ground_plane.as_deref().unwrap_or("(disabled)")
    );
    println!(
        "   └─ Light: {}",
        info.world.light.as_deref().unwrap_or("(disabled)")
    );

    if !info.props.is_empty() {
        println!("\nProps ({})", info.props.len());
        for (i, prop) in info.props.iter().enumerate() {
            let prefix = if i + 1 == info.props.len() { "└─" } else { "├─" };
            println!("   {} {} at {} ({})", prefix, prop.name, prop.prim_path, prop.asset);
        }
    }

    println!("\nVehicles ({})", info.vehicles.len());
    for (i, vehicle) in info.vehicles.iter().enumerate() {
        let is_last = i + 1 == info.vehicles.len();
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} ({}) at {:?} rot {:?}",
            prefix, vehicle.id, vehicle.robot, vehicle.position, vehicle.rotation
        );

        if let Some(ref wiring) = vehicle.wiring {
            println!("   {}  ├─ Scene path: {}", child_prefix, wiring.scene_path);
            println!("   {}  ├─ Topics: {:?}", child_prefix, wiring.sensor_topics);
            println!("   {}  ├─ Orientation (xyzw): {:?}", child_prefix, wiring.orientation_xyzw);
            println!(
                "   {}  └─ PX4: {} ({})",
                child_prefix, wiring.connection_uri, wiring.airframe
            );
        }
    }

    println!();
}
