//! Sensor kinds, configuration document and attached sensor handles

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Named intrinsic parameters of one sensor, passed through verbatim
pub type SensorParams = serde_json::Map<String, serde_json::Value>;

/// Sensor capability a vehicle may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Stereo camera pair
    Camera,
    /// Range-scanning RTX lidar
    Lidar,
}

impl SensorKind {
    /// Attach order used by the vehicle factory
    pub const ALL: [SensorKind; 2] = [SensorKind::Camera, SensorKind::Lidar];

    /// Section key in the sensor configuration document
    pub fn config_key(self) -> &'static str {
        match self {
            SensorKind::Camera => "stereo_camera",
            SensorKind::Lidar => "rtx_lidar",
        }
    }

    /// Static translation from the vehicle origin
    pub fn default_mount(self) -> [f64; 3] {
        match self {
            SensorKind::Camera => [0.1, 0.0, 0.2],
            SensorKind::Lidar => [0.0, 0.0, 0.05],
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// Parsed sensor configuration file: section key -> value
///
/// Only the top level must be a mapping. Section contents stay opaque until
/// a sensor asks for its own key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    sections: BTreeMap<String, serde_json::Value>,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value stored under `key`
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.sections.get(key)
    }

    /// Parameters under `key`, if that section is a mapping
    pub fn section(&self, key: &str) -> Option<&SensorParams> {
        self.get(key).and_then(serde_json::Value::as_object)
    }

    /// Insert or replace a parameter section
    pub fn insert(&mut self, key: impl Into<String>, params: SensorParams) {
        self.insert_value(key, serde_json::Value::Object(params));
    }

    /// Insert or replace a raw top-level value
    pub fn insert_value(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.sections.insert(key.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// A sensor attached to a vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorHandle {
    pub kind: SensorKind,

    /// Owning vehicle identity
    pub vehicle_id: u32,

    /// Scene path of the sensor, a child of the vehicle
    pub prim_path: String,

    /// Publish topic under the vehicle's topic prefix
    pub topic: String,

    /// Translation relative to the vehicle frame
    pub mount_offset: [f64; 3],

    /// Intrinsics taken from the configuration document
    pub params: SensorParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_keys_match_document_layout() {
        assert_eq!(SensorKind::Camera.config_key(), "stereo_camera");
        assert_eq!(SensorKind::Lidar.config_key(), "rtx_lidar");
        assert_eq!(SensorKind::ALL, [SensorKind::Camera, SensorKind::Lidar]);
    }

    #[test]
    fn document_from_json_sections() {
        let doc: ConfigDocument = serde_json::from_str(
            r#"{ "rtx_lidar": { "rotation_rate": 10, "config": "Example_Rotary" } }"#,
        )
        .unwrap();
        let lidar = doc.section("rtx_lidar").unwrap();
        assert_eq!(lidar["rotation_rate"], 10);
        assert!(doc.section("stereo_camera").is_none());
    }

    #[test]
    fn document_keeps_non_mapping_values() {
        let doc: ConfigDocument =
            serde_json::from_str(r#"{ "version": 1, "stereo_camera": null, "rtx_lidar": 3 }"#)
                .unwrap();
        assert_eq!(doc.keys().count(), 3);
        assert_eq!(doc.get("version"), Some(&serde_json::json!(1)));
        assert!(doc.section("stereo_camera").is_none());
        assert!(doc.section("rtx_lidar").is_none());
    }

    #[test]
    fn document_top_level_must_be_mapping() {
        let result: Result<ConfigDocument, _> = serde_json::from_str("[1, 2]");
        assert!(result.is_err());
    }
}
