//! 配置校验模块
//!
//! 校验规则：
//! - 数值范围与必填字符串 (validator derive)
//! - vehicle id 唯一，且不超过 MAVLink 端口上限
//! - topic_prefix / 场景路径以 `/` 开头且不以 `/` 结尾
//! - 道具场景路径唯一
//! - 位姿数值有限

use std::collections::{HashMap, HashSet};

use contracts::{ContractError, Namespace, SessionBlueprint, MAX_VEHICLE_ID};
use validator::Validate;

/// 校验 SessionBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_vehicle_ids(blueprint)?;
    validate_paths(blueprint)?;
    validate_prop_paths(blueprint)?;
    validate_finite(blueprint)?;
    Ok(())
}

/// 字段级校验
fn validate_fields(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

/// 校验 vehicle id 范围与唯一性
fn validate_vehicle_ids(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let session = &blueprint.session;
    let mut seen = HashSet::new();
    for vehicle in &blueprint.vehicles {
        if vehicle.id > MAX_VEHICLE_ID {
            return Err(ContractError::VehicleIdOutOfRange {
                vehicle_id: vehicle.id,
                max: MAX_VEHICLE_ID,
            });
        }
        if !seen.insert(vehicle.id) {
            let namespace =
                Namespace::for_vehicle(&session.vehicle_base_path, &session.topic_prefix, vehicle.id);
            return Err(ContractError::DuplicateVehicleIdentity {
                vehicle_id: vehicle.id,
                scene_path: namespace.scene_path,
            });
        }
    }
    Ok(())
}

/// 校验话题前缀与场景路径格式
fn validate_paths(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let session = &blueprint.session;
    let world = &blueprint.world;

    check_absolute("session.topic_prefix", &session.topic_prefix)?;
    check_absolute("session.vehicle_base_path", &session.vehicle_base_path)?;
    if world.ground_plane.enabled {
        check_absolute("world.ground_plane.prim_path", &world.ground_plane.prim_path)?;
    }
    if world.light.enabled {
        check_absolute("world.light.prim_path", &world.light.prim_path)?;
    }
    for (idx, prop) in blueprint.props.iter().enumerate() {
        check_absolute(&format!("props[{idx}].prim_path"), &prop.prim_path)?;
    }
    Ok(())
}

fn check_absolute(field: &str, value: &str) -> Result<(), ContractError> {
    if !value.starts_with('/') {
        return Err(ContractError::config_validation(
            field,
            format!("'{value}' must start with '/'"),
        ));
    }
    if value.len() > 1 && value.ends_with('/') {
        return Err(ContractError::config_validation(
            field,
            format!("'{value}' must not end with '/'"),
        ));
    }
    Ok(())
}

/// 校验道具场景路径唯一
fn validate_prop_paths(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for prop in &blueprint.props {
        if let Some(previous) = seen.insert(prop.prim_path.as_str(), prop.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("props[name={}].prim_path", prop.name),
                format!(
                    "duplicate prim_path '{}' (already used by '{previous}')",
                    prop.prim_path
                ),
            ));
        }
    }
    Ok(())
}

/// 校验位姿数值
fn validate_finite(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    for vehicle in &blueprint.vehicles {
        let mut values = vehicle.position.iter().chain(vehicle.rotation.iter());
        if values.any(|v| !v.is_finite()) {
            return Err(ContractError::config_validation(
                format!("vehicles[id={}]", vehicle.id),
                "position and rotation must be finite",
            ));
        }
    }
    for prop in &blueprint.props {
        let mut values = prop
            .position
            .iter()
            .chain(prop.orientation.iter())
            .chain(prop.scale.iter());
        if values.any(|v| !v.is_finite()) {
            return Err(ContractError::config_validation(
                format!("props[name={}]", prop.name),
                "position, orientation and scale must be finite",
            ));
        }
    }
    Ok(())
}
