//! SessionGraph - scene builder output
//!
//! What was created in the scene and under which names.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{BackendConfig, Namespace, Pose, PoseTreeSpec, SensorHandle, SensorKind, VehicleSpec};

/// A fully wired vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnedVehicle {
    /// Description the vehicle was built from
    pub spec: VehicleSpec,

    pub namespace: Namespace,

    /// Resolved spawn pose
    pub pose: Pose,

    /// Control backends handed to the vehicle at construction
    pub backends: Vec<BackendConfig>,

    /// Attached sensors, camera before lidar
    pub sensors: Vec<SensorHandle>,

    /// Pose-tree publisher registered for this vehicle
    pub pose_tree: PoseTreeSpec,
}

impl SpawnedVehicle {
    pub fn id(&self) -> u32 {
        self.spec.id
    }

    pub fn scene_path(&self) -> &str {
        &self.namespace.scene_path
    }

    /// First sensor of the given kind
    pub fn sensor(&self, kind: SensorKind) -> Option<&SensorHandle> {
        self.sensors.iter().find(|s| s.kind == kind)
    }
}

/// A static prop placed in the scene
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropHandle {
    pub name: String,
    pub prim_path: String,
    pub asset_path: String,
    pub pose: Pose,
    pub scale: [f64; 3],
}

/// Everything created during scene setup
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionGraph {
    /// Ground plane scene path, if one was added
    pub ground_plane: Option<String>,

    /// Light scene path, if one was added
    pub light: Option<String>,

    /// Clock publisher topic, if registered
    pub clock_topic: Option<String>,

    pub props: Vec<PropHandle>,

    /// Vehicle identity -> spawned vehicle
    pub vehicles: BTreeMap<u32, SpawnedVehicle>,
}

impl SessionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spawned vehicle
    pub fn register_vehicle(&mut self, vehicle: SpawnedVehicle) {
        self.vehicles.insert(vehicle.id(), vehicle);
    }

    /// Total sensors across all vehicles
    pub fn sensor_count(&self) -> usize {
        self.vehicles.values().map(|v| v.sensors.len()).sum()
    }

    /// Total backends across all vehicles
    pub fn backend_count(&self) -> usize {
        self.vehicles.values().map(|v| v.backends.len()).sum()
    }

    /// All vehicle scene paths (for teardown)
    pub fn vehicle_paths(&self) -> Vec<String> {
        self.vehicles
            .values()
            .map(|v| v.namespace.scene_path.clone())
            .collect()
    }
}
