//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::SessionBlueprint;
use serde_json::Value;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ScenarioSummary>,
}

#[derive(Serialize)]
struct ScenarioSummary {
    version: String,
    vehicle_count: usize,
    sensor_count: usize,
    prop_count: usize,
    sensor_failure_policy: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating scenario");

    let result = validate_scenario(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Scenario validation failed")
    }
}

fn validate_scenario(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let sensor_count: usize = blueprint
                .vehicles
                .iter()
                .map(|v| v.requested_sensors().count())
                .sum();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ScenarioSummary {
                    version: format!("{:?}", blueprint.version),
                    vehicle_count: blueprint.vehicles.len(),
                    sensor_count,
                    prop_count: blueprint.props.len(),
                    sensor_failure_policy: format!("{:?}", blueprint.session.sensor_failure_policy),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect scenario warnings (non-fatal issues)
fn collect_warnings(blueprint: &SessionBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.vehicles.is_empty() {
        warnings.push("No vehicles configured - only the world will be built".to_string());
    }

    // The sensor config is loaded for every vehicle, even without sensors
    let resolver = config_loader::ConfigResolver::new(blueprint.session.config_dir());
    match resolver.load(&blueprint.session.sensor_config) {
        Ok(document) => {
            for vehicle in &blueprint.vehicles {
                for kind in vehicle.requested_sensors() {
                    let problem = match document.get(kind.config_key()) {
                        None | Some(Value::Null) => "has no such section",
                        Some(Value::Object(_)) => continue,
                        Some(_) => "has a non-mapping section",
                    };
                    warnings.push(format!(
                        "Vehicle {} requests {} but '{}' {problem}",
                        vehicle.id,
                        kind.config_key(),
                        blueprint.session.sensor_config
                    ));
                }
            }
        }
        Err(e) if !blueprint.vehicles.is_empty() => {
            warnings.push(format!("Sensor config unusable - spawning will fail: {e}"));
        }
        Err(_) => {}
    }

    let data_dir = blueprint.session.data_dir();
    for prop in &blueprint.props {
        if !data_dir.join(&prop.asset).exists() {
            warnings.push(format!(
                "Prop '{}' asset not found under {}",
                prop.name,
                data_dir.display()
            ));
        }
    }

    if blueprint.backend.autolaunch && !blueprint.backend.px4_dir.exists() {
        warnings.push(format!(
            "PX4 directory {} does not exist - autolaunch will fail",
            blueprint.backend.px4_dir.display()
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Scenario is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Vehicles: {}", summary.vehicle_count);
            println!("  Sensors: {}", summary.sensor_count);
            println!("  Props: {}", summary.prop_count);
            println!("  Sensor failure policy: {}", summary.sensor_failure_policy);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Scenario is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_warnings_for_missing_files() {
        let dir = TempDir::new().unwrap();
        let mut blueprint = SessionBlueprint::reference();
        blueprint.session.working_dir = dir.path().to_path_buf();
        blueprint.backend.px4_dir = dir.path().join("no-px4");

        let warnings = collect_warnings(&blueprint);

        assert!(warnings.iter().any(|w| w.contains("Sensor config unusable")));
        assert!(warnings.iter().any(|w| w.contains("CubeObject")));
        assert!(warnings.iter().any(|w| w.contains("autolaunch")));
    }

    #[test]
    fn test_warning_for_missing_section() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join("config/sensor_config.yaml"),
            "stereo_camera:\n  frequency: 30\n",
        )
        .unwrap();
        let mut blueprint = SessionBlueprint::reference();
        blueprint.session.working_dir = dir.path().to_path_buf();

        let warnings = collect_warnings(&blueprint);
        assert!(warnings.iter().any(|w| w.contains("requests rtx_lidar")));
    }

    #[test]
    fn test_only_requested_sections_warn() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join("config/sensor_config.yaml"),
            "version: 1
stereo_camera:
rtx_lidar: 10
",
        )
        .unwrap();
        let mut blueprint = SessionBlueprint::reference();
        blueprint.session.working_dir = dir.path().to_path_buf();

        // 参考场景只请求激光雷达
        let warnings = collect_warnings(&blueprint);
        assert!(warnings
            .iter()
            .any(|w| w.contains("requests rtx_lidar") && w.contains("non-mapping")));
        assert!(!warnings.iter().any(|w| w.contains("stereo_camera")));
        assert!(!warnings.iter().any(|w| w.contains("unusable")));
    }

    #[test]
    fn test_invalid_scenario_result() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scenario.toml");
        fs::write(&path, "[[vehicles]]\nid = 1\n\n[[vehicles]]\nid = 1\n").unwrap();

        let result = validate_scenario(&ValidateArgs {
            config: path,
            json: true,
        });

        assert!(!result.valid);
        assert!(result.error.unwrap().contains("duplicate"));
    }
}
