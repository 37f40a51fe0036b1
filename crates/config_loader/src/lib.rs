//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse session blueprints (TOML / JSON / YAML)
//! - Validate blueprint legality
//! - Resolve sensor configuration documents from `config/`
//! - Optionally cache parsed sensor configuration
//!
//! # Example
//!
//! ```no_run
//! use config_loader::{ConfigLoader, ConfigResolver};
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("scenario.toml")).unwrap();
//! let sensors = ConfigResolver::for_working_dir(&blueprint.session.working_dir)
//!     .load(&blueprint.session.sensor_config)
//!     .unwrap();
//! println!("vehicles: {}", blueprint.vehicles.len());
//! ```

mod cache;
mod parser;
mod sensor_config;
mod validator;

pub use cache::{ConfigCache, SensorConfigSource};
pub use contracts::SessionBlueprint;
pub use parser::ConfigFormat;
pub use sensor_config::ConfigResolver;

use contracts::ContractError;
use std::path::Path;

/// Label used as the origin of configuration parsed from memory
const INLINE_ORIGIN: &str = "<inline>";

/// Configuration loader
///
/// Provides static methods to load session blueprints from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Format follows the file extension (.toml / .json / .yaml). A relative
    /// `session.working_dir` is resolved against the file's directory.
    ///
    /// # Errors
    /// - File missing (`ConfigNotFound`)
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<SessionBlueprint, ContractError> {
        if !path.exists() {
            return Err(ContractError::config_not_found(path));
        }
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;

        let mut blueprint: SessionBlueprint = parser::parse(&content, format, path)?;
        if blueprint.session.working_dir.is_relative() {
            if let Some(parent) = path.parent() {
                blueprint.session.working_dir = parent.join(&blueprint.session.working_dir);
            }
        }

        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SessionBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an in-memory blueprint
    pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Serialize SessionBlueprint to TOML string
    pub fn to_toml(blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint).map_err(|e| {
            ContractError::config_parse(INLINE_ORIGIN, format!("TOML serialize error: {e}"))
        })
    }

    /// Serialize SessionBlueprint to JSON string
    pub fn to_json(blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint).map_err(|e| {
            ContractError::config_parse(INLINE_ORIGIN, format!("JSON serialize error: {e}"))
        })
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(path, "cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(path, format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SessionBlueprint, ContractError> {
        let blueprint = parser::parse(content, format, Path::new(INLINE_ORIGIN))?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}
