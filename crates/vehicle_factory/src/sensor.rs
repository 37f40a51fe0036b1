//! Sensor attachment
//!
//! Builds a sensor from its configuration section and attaches it under the
//! vehicle's body link. Mounts are translation only; sensors stay
//! axis-aligned with the body.

use contracts::{ConfigDocument, ContractError, Namespace, SensorHandle, SensorKind};
use serde_json::Value;
use tracing::{info, instrument};

use crate::client::SimulationContext;
use crate::error::{FactoryError, Result};

/// Link sensors are parented to
pub const SENSOR_PARENT_LINK: &str = "body";

/// Sensor attacher
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorAttacher;

impl SensorAttacher {
    /// Build the handle for `kind` without touching the scene
    ///
    /// Fails with `MissingSensorConfig` if `config` has no section for the
    /// sensor kind or the section is empty, and with `InvalidSensorConfig` if
    /// the section is not a mapping. Other sections are never inspected.
    pub fn build(
        kind: SensorKind,
        config: &ConfigDocument,
        namespace: &Namespace,
        vehicle_scene_path: &str,
        vehicle_id: u32,
        mount_offset: [f64; 3],
    ) -> std::result::Result<SensorHandle, ContractError> {
        let key = kind.config_key();
        let params = match config.get(key) {
            None | Some(Value::Null) => {
                return Err(ContractError::missing_sensor_config(key, vehicle_id));
            }
            Some(Value::Object(params)) => params.clone(),
            Some(other) => {
                return Err(ContractError::invalid_sensor_config(
                    key,
                    vehicle_id,
                    value_kind(other),
                ));
            }
        };

        Ok(SensorHandle {
            kind,
            vehicle_id,
            prim_path: format!("{vehicle_scene_path}/{SENSOR_PARENT_LINK}/{key}"),
            topic: format!("{}/{key}", namespace.topic_prefix),
            mount_offset,
            params,
        })
    }

    /// Build and attach a sensor to an existing vehicle
    #[instrument(
        name = "sensor_attacher_attach",
        skip(ctx, config, namespace, mount_offset),
        fields(kind = %kind)
    )]
    pub fn attach<C: SimulationContext + ?Sized>(
        ctx: &mut C,
        kind: SensorKind,
        config: &ConfigDocument,
        namespace: &Namespace,
        vehicle_scene_path: &str,
        vehicle_id: u32,
        mount_offset: [f64; 3],
    ) -> Result<SensorHandle> {
        let handle = Self::build(
            kind,
            config,
            namespace,
            vehicle_scene_path,
            vehicle_id,
            mount_offset,
        )
        .map_err(|e| FactoryError::sensor_attach(kind, vehicle_id, e.into()))?;

        ctx.attach_sensor(&handle)
            .map_err(|e| FactoryError::sensor_attach(kind, vehicle_id, e))?;

        info!(
            prim_path = %handle.prim_path,
            topic = %handle.topic,
            "sensor attached"
        );
        Ok(handle)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
