//! Vehicle namespace allocation
//!
//! Maps a vehicle identity to the scene path and topic prefix it owns.
//! Vehicle 0 keeps the unsuffixed base names; vehicle `n` gets `_<n>`
//! appended to both.

use std::collections::BTreeSet;

use contracts::{ContractError, Namespace, DEFAULT_TOPIC_PREFIX, DEFAULT_VEHICLE_BASE_PATH};
use tracing::debug;

/// Namespace allocator
#[derive(Debug, Clone)]
pub struct NamespaceAllocator {
    base_path: String,
    topic_prefix: String,
    reserved: BTreeSet<u32>,
}

impl NamespaceAllocator {
    pub fn new(base_path: impl Into<String>, topic_prefix: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            topic_prefix: topic_prefix.into(),
            reserved: BTreeSet::new(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn topic_prefix(&self) -> &str {
        &self.topic_prefix
    }

    /// Namespace for `vehicle_id`
    ///
    /// Pure: does not consult or update the reservation set.
    pub fn allocate(&self, vehicle_id: u32) -> Namespace {
        Namespace::for_vehicle(&self.base_path, &self.topic_prefix, vehicle_id)
    }

    /// Namespace for `vehicle_id`, failing if the identity is already taken
    pub fn check(&self, vehicle_id: u32) -> Result<Namespace, ContractError> {
        let namespace = self.allocate(vehicle_id);
        if self.reserved.contains(&vehicle_id) {
            return Err(ContractError::DuplicateVehicleIdentity {
                vehicle_id,
                scene_path: namespace.scene_path,
            });
        }
        Ok(namespace)
    }

    /// Commit `vehicle_id` for this session
    pub fn reserve(&mut self, vehicle_id: u32) -> Result<Namespace, ContractError> {
        let namespace = self.check(vehicle_id)?;
        self.reserved.insert(vehicle_id);
        debug!(vehicle_id, scene_path = %namespace.scene_path, "namespace reserved");
        Ok(namespace)
    }

    /// Give `vehicle_id` back; returns whether it was reserved
    pub fn release(&mut self, vehicle_id: u32) -> bool {
        self.reserved.remove(&vehicle_id)
    }

    pub fn is_reserved(&self, vehicle_id: u32) -> bool {
        self.reserved.contains(&vehicle_id)
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }
}

impl Default for NamespaceAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_VEHICLE_BASE_PATH, DEFAULT_TOPIC_PREFIX)
    }
}
