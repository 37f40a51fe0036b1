//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;
use vehicle_factory::FactoryError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Scenario file not found
    #[error("Scenario file not found: {}", path.display())]
    ScenarioNotFound { path: PathBuf },

    /// Scene could not be built
    #[error("Scene setup failed: {source}")]
    SceneSetup {
        #[source]
        source: FactoryError,
    },

    /// Run loop ended with an error
    #[error("Simulation session failed: {source}")]
    Session {
        #[source]
        source: FactoryError,
    },

    /// Blocking session task could not be joined
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },
}

impl CliError {
    pub fn scenario_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ScenarioNotFound { path: path.into() }
    }

    pub fn scene_setup(source: FactoryError) -> Self {
        Self::SceneSetup { source }
    }

    pub fn session(source: FactoryError) -> Self {
        Self::Session { source }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}
