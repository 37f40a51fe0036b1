//! Control backend wiring
//!
//! Builds the PX4 / MAVLink backend configuration handed to a vehicle at
//! construction time. The executable directory is not checked here; the
//! flight controller reports a bad path when it starts.

use std::path::{Path, PathBuf};

use contracts::{BackendConfig, BackendSettings, ContractError};

/// Backend wirer holding the session-wide defaults
#[derive(Debug, Clone)]
pub struct BackendWirer {
    autolaunch: bool,
    backend_dir: PathBuf,
    airframe: String,
}

impl BackendWirer {
    pub fn new(settings: &BackendSettings) -> Self {
        Self {
            autolaunch: settings.autolaunch,
            backend_dir: settings.px4_dir.clone(),
            airframe: settings.default_airframe.clone(),
        }
    }

    /// Fresh backend configuration for `vehicle_id`
    ///
    /// Fails with `VehicleIdOutOfRange` when the MAVLink port would not fit.
    pub fn wire(
        vehicle_id: u32,
        autolaunch: bool,
        backend_dir: &Path,
        airframe: &str,
    ) -> Result<BackendConfig, ContractError> {
        BackendConfig::new(vehicle_id, autolaunch, backend_dir, airframe)
    }

    /// Backend list for one vehicle using the session defaults
    pub fn wire_for(&self, vehicle_id: u32) -> Result<Vec<BackendConfig>, ContractError> {
        Ok(vec![Self::wire(
            vehicle_id,
            self.autolaunch,
            &self.backend_dir,
            &self.airframe,
        )?])
    }
}

impl Default for BackendWirer {
    fn default() -> Self {
        Self::new(&BackendSettings::default())
    }
}
