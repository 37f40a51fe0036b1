//! Layered error definitions
//!
//! Categorized by source: config / composition / scene

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration file does not exist
    #[error("config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration file exists but is not well-formed
    #[error("config parse error in {}: {message}", path.display())]
    ConfigParse {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Composition Errors =====
    /// Sensor section missing from the sensor configuration document
    #[error("missing sensor config '{key}' for vehicle {vehicle_id}")]
    MissingSensorConfig { key: String, vehicle_id: u32 },

    /// Sensor section present but not a mapping of parameters
    #[error("sensor config '{key}' for vehicle {vehicle_id} must be a mapping, found {found}")]
    InvalidSensorConfig {
        key: String,
        vehicle_id: u32,
        found: String,
    },

    /// Vehicle identity too large to derive a MAVLink port from
    #[error("vehicle identity {vehicle_id} out of range (max {max})")]
    VehicleIdOutOfRange { vehicle_id: u32, max: u32 },

    /// Two vehicles in one session share an identity
    #[error("duplicate vehicle identity {vehicle_id} (scene path '{scene_path}' already in use)")]
    DuplicateVehicleIdentity { vehicle_id: u32, scene_path: String },

    // ===== Scene Errors =====
    /// Scene graph operation rejected by the simulation
    #[error("scene error at '{path}': {message}")]
    Scene { path: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration-not-found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create configuration parse error without an underlying source
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create missing sensor config error
    pub fn missing_sensor_config(key: impl Into<String>, vehicle_id: u32) -> Self {
        Self::MissingSensorConfig {
            key: key.into(),
            vehicle_id,
        }
    }

    /// Create invalid sensor config error
    pub fn invalid_sensor_config(
        key: impl Into<String>,
        vehicle_id: u32,
        found: impl Into<String>,
    ) -> Self {
        Self::InvalidSensorConfig {
            key: key.into(),
            vehicle_id,
            found: found.into(),
        }
    }

    /// Create scene error
    pub fn scene(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scene {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for errors raised while reading or parsing configuration files
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigParse { .. } | Self::ConfigValidation { .. }
        )
    }
}
