//! Sensor configuration resolver
//!
//! Loads named sensor configuration documents from the session's `config/`
//! directory. There is no fallback: a missing or malformed file is an error.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use contracts::{ConfigDocument, ContractError};
use tracing::{debug, instrument};

use crate::parser::{self, ConfigFormat};

/// Resolves sensor configuration files against a fixed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigResolver {
    config_dir: PathBuf,
}

impl ConfigResolver {
    /// Resolver rooted at `config_dir`
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Resolver for `<working_dir>/config`
    pub fn for_working_dir(working_dir: &Path) -> Self {
        Self::new(working_dir.join("config"))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path a filename resolves to
    pub fn resolve_path(&self, filename: &str) -> PathBuf {
        self.config_dir.join(filename)
    }

    /// Load and parse `filename`
    ///
    /// Format follows the extension; files without a known extension are
    /// read as YAML.
    ///
    /// # Errors
    /// - `ConfigNotFound` with the attempted path when the file is absent
    /// - `ConfigParse` when the content is empty, malformed or not a mapping
    #[instrument(name = "config_resolver_load", skip(self), fields(config_dir = %self.config_dir.display()))]
    pub fn load(&self, filename: &str) -> Result<ConfigDocument, ContractError> {
        let path = self.resolve_path(filename);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ContractError::config_not_found(path));
            }
            Err(e) => return Err(e.into()),
        };

        let format = ConfigFormat::from_path(&path).unwrap_or(ConfigFormat::Yaml);
        let document: ConfigDocument = parser::parse(&content, format, &path)?;

        debug!(
            path = %path.display(),
            sections = ?document.keys().collect::<Vec<_>>(),
            "sensor config loaded"
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SENSOR_YAML: &str = r#"
stereo_camera:
  resolution: [1280, 720]
  frequency: 30
rtx_lidar:
  config: OS1_REV6_32ch10hz1024res
  frequency: 10
"#;

    fn config_dir_with(filename: &str, content: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config").join(filename), content).unwrap();
        dir
    }

    #[test]
    fn test_load_yaml_document() {
        let dir = config_dir_with("sensor_config.yaml", SENSOR_YAML);
        let resolver = ConfigResolver::for_working_dir(dir.path());

        let doc = resolver.load("sensor_config.yaml").unwrap();
        assert_eq!(doc.section("stereo_camera").unwrap()["frequency"], 30);
        assert_eq!(
            doc.section("rtx_lidar").unwrap()["config"],
            "OS1_REV6_32ch10hz1024res"
        );
    }

    #[test]
    fn test_missing_file_reports_attempted_path() {
        let dir = TempDir::new().unwrap();
        let resolver = ConfigResolver::for_working_dir(dir.path());

        let err = resolver.load("sensor_config.yaml").unwrap_err();
        let expected = dir.path().join("config").join("sensor_config.yaml");
        match &err {
            ContractError::ConfigNotFound { path } => assert_eq!(path, &expected),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains(&expected.display().to_string()));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = config_dir_with("sensor_config.yaml", "stereo_camera: {resolution: [1, 2}\n");
        let resolver = ConfigResolver::for_working_dir(dir.path());

        let err = resolver.load("sensor_config.yaml").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }), "got: {err}");
    }

    #[test]
    fn test_extra_keys_and_empty_sections_load() {
        let dir = config_dir_with(
            "sensor_config.yaml",
            "version: 1\nstereo_camera:\nrtx_lidar:\n  frequency: 10\n",
        );
        let resolver = ConfigResolver::for_working_dir(dir.path());

        let doc = resolver.load("sensor_config.yaml").unwrap();
        assert_eq!(doc.get("version").unwrap(), 1);
        assert!(doc.get("stereo_camera").unwrap().is_null());
        assert_eq!(doc.section("rtx_lidar").unwrap()["frequency"], 10);
    }

    #[test]
    fn test_top_level_list_is_parse_error() {
        let dir = config_dir_with("sensor_config.yaml", "- stereo_camera\n- rtx_lidar\n");
        let resolver = ConfigResolver::for_working_dir(dir.path());

        let err = resolver.load("sensor_config.yaml").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }), "got: {err}");
    }

    #[test]
    fn test_json_by_extension() {
        let dir = config_dir_with("sensors.json", r#"{ "rtx_lidar": { "frequency": 20 } }"#);
        let resolver = ConfigResolver::for_working_dir(dir.path());

        let doc = resolver.load("sensors.json").unwrap();
        assert_eq!(doc.section("rtx_lidar").unwrap()["frequency"], 20);
    }
}
