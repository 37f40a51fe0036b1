//! Vehicle description, namespace and backend handshake types

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ContractError, SensorKind};

/// Scene path of vehicle 0; other vehicles append `_<id>`
pub const DEFAULT_VEHICLE_BASE_PATH: &str = "/World/quadrotor";

/// Session root topic prefix
pub const DEFAULT_TOPIC_PREFIX: &str = "/isaac";

/// Robot asset used when a vehicle does not name one
pub const DEFAULT_ROBOT: &str = "Iris";

/// First MAVLink port; vehicle `n` connects on `base + n`
pub const MAVLINK_BASE_PORT: u16 = 4560;

/// Largest identity whose MAVLink port still fits in a `u16`
pub const MAX_VEHICLE_ID: u32 = (u16::MAX - MAVLINK_BASE_PORT) as u32;

/// MAVLink port for `vehicle_id`, `None` past [`MAX_VEHICLE_ID`]
pub fn mavlink_port(vehicle_id: u32) -> Option<u16> {
    u16::try_from(vehicle_id)
        .ok()
        .and_then(|id| MAVLINK_BASE_PORT.checked_add(id))
}

/// Child links published as part of the vehicle's rigid body
pub const DEFAULT_BODY_CHILDREN: [&str; 3] = ["body", "base_link", "Looks"];

/// Declarative vehicle description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    /// Numeric identity, unique per session
    pub id: u32,

    /// Robot asset name (e.g. "Iris")
    #[serde(default = "default_robot")]
    pub robot: String,

    /// Spawn position (x, y, z)
    #[serde(default)]
    pub position: [f64; 3],

    /// Euler angles in degrees, intrinsic X-Y-Z
    #[serde(default)]
    pub rotation: [f64; 3],

    /// Carry a stereo camera
    #[serde(default)]
    pub camera: bool,

    /// Carry an RTX lidar
    #[serde(default)]
    pub lidar: bool,
}

fn default_robot() -> String {
    DEFAULT_ROBOT.to_string()
}

impl VehicleSpec {
    /// Sensor-less vehicle at the origin
    pub fn new(id: u32) -> Self {
        Self {
            id,
            robot: default_robot(),
            position: [0.0; 3],
            rotation: [0.0; 3],
            camera: false,
            lidar: false,
        }
    }

    pub fn with_position(mut self, position: [f64; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: [f64; 3]) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_camera(mut self, camera: bool) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_lidar(mut self, lidar: bool) -> Self {
        self.lidar = lidar;
        self
    }

    /// Requested sensors in attach order
    pub fn requested_sensors(&self) -> impl Iterator<Item = SensorKind> + '_ {
        SensorKind::ALL.into_iter().filter(|kind| match kind {
            SensorKind::Camera => self.camera,
            SensorKind::Lidar => self.lidar,
        })
    }
}

/// Scene path and topic prefix owned by one vehicle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Namespace {
    pub scene_path: String,
    pub topic_prefix: String,
}

impl Namespace {
    /// Vehicle 0 keeps the base names; vehicle `n` appends `_<n>` to both
    pub fn for_vehicle(base_path: &str, topic_prefix: &str, vehicle_id: u32) -> Self {
        if vehicle_id == 0 {
            Self {
                scene_path: base_path.to_string(),
                topic_prefix: topic_prefix.to_string(),
            }
        } else {
            Self {
                scene_path: format!("{base_path}_{vehicle_id}"),
                topic_prefix: format!("{topic_prefix}_{vehicle_id}"),
            }
        }
    }
}

/// External control backend configuration (PX4 over MAVLink)
///
/// Built fresh for each vehicle. Two vehicles sharing one would drive the
/// same flight-controller process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendConfig {
    /// Vehicle identity the flight controller expects on connect
    pub vehicle_id: u32,

    /// MAVLink port derived from the identity
    pub port: u16,

    /// Launch the flight-controller process alongside the vehicle
    pub autolaunch: bool,

    /// Directory holding the flight-controller executable
    pub backend_dir: PathBuf,

    /// Airframe model name passed to the flight controller
    pub airframe: String,
}

impl BackendConfig {
    /// Backend for `vehicle_id`
    ///
    /// Fails with `VehicleIdOutOfRange` when the identity has no MAVLink port.
    pub fn new(
        vehicle_id: u32,
        autolaunch: bool,
        backend_dir: impl Into<PathBuf>,
        airframe: impl Into<String>,
    ) -> Result<Self, ContractError> {
        let port = mavlink_port(vehicle_id).ok_or(ContractError::VehicleIdOutOfRange {
            vehicle_id,
            max: MAX_VEHICLE_ID,
        })?;
        Ok(Self {
            vehicle_id,
            port,
            autolaunch,
            backend_dir: backend_dir.into(),
            airframe: airframe.into(),
        })
    }

    /// MAVLink port the vehicle listens on
    pub fn connection_port(&self) -> u16 {
        self.port
    }

    /// Connection string in MAVLink URI form
    pub fn connection_uri(&self) -> String {
        format!("tcpin:localhost:{}", self.connection_port())
    }
}

/// Pose-tree publication request for one vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoseTreeSpec {
    pub scene_path: String,
    pub topic_prefix: String,
    pub child_links: BTreeSet<String>,
}

impl PoseTreeSpec {
    /// Publisher for the default rigid-body links
    pub fn new(scene_path: impl Into<String>, topic_prefix: impl Into<String>) -> Self {
        Self {
            scene_path: scene_path.into(),
            topic_prefix: topic_prefix.into(),
            child_links: default_body_children(),
        }
    }
}

/// Fresh copy of the default child-link set
pub fn default_body_children() -> BTreeSet<String> {
    DEFAULT_BODY_CHILDREN.iter().map(|s| s.to_string()).collect()
}
