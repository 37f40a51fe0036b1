//! Vehicle Factory error types

use contracts::{ContractError, SensorKind};
use thiserror::Error;

/// Vehicle Factory specific error
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Simulation rejected the vehicle entity
    #[error("failed to spawn vehicle {vehicle_id} at '{scene_path}': {source}")]
    VehicleSpawnFailed {
        vehicle_id: u32,
        scene_path: String,
        #[source]
        source: Box<FactoryError>,
    },

    /// Sensor could not be attached
    #[error("failed to attach {kind} to vehicle {vehicle_id}: {source}")]
    SensorAttachFailed {
        kind: SensorKind,
        vehicle_id: u32,
        #[source]
        source: Box<FactoryError>,
    },

    /// World-level setup step failed (ground plane, light, props)
    #[error("scene setup failed at '{path}': {message}")]
    SceneSetupFailed { path: String, message: String },

    /// Timeline used after the simulation was closed
    #[error("simulation is closed")]
    SimulationClosed,

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl FactoryError {
    /// Create vehicle spawn error
    pub fn vehicle_spawn(
        vehicle_id: u32,
        scene_path: impl Into<String>,
        source: FactoryError,
    ) -> Self {
        Self::VehicleSpawnFailed {
            vehicle_id,
            scene_path: scene_path.into(),
            source: Box::new(source),
        }
    }

    /// Create scene setup error
    pub fn scene_setup(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SceneSetupFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an error raised while attaching a sensor
    pub fn sensor_attach(kind: SensorKind, vehicle_id: u32, source: FactoryError) -> Self {
        Self::SensorAttachFailed {
            kind,
            vehicle_id,
            source: Box::new(source),
        }
    }

    /// Underlying contract error, looking through spawn and attach wrapping
    pub fn contract(&self) -> Option<&ContractError> {
        match self {
            Self::Contract(e) => Some(e),
            Self::VehicleSpawnFailed { source, .. } | Self::SensorAttachFailed { source, .. } => {
                source.contract()
            }
            _ => None,
        }
    }

    /// True if the root cause is a missing sensor configuration section
    pub fn is_missing_sensor_config(&self) -> bool {
        matches!(self.contract(), Some(ContractError::MissingSensorConfig { .. }))
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, FactoryError>;
