//! # Vehicle Factory
//!
//! Multirotor scene composition module.
//!
//! Responsibilities:
//! - Allocate collision-free namespaces per vehicle identity
//! - Resolve Euler-angle placements into poses
//! - Wire the flight-controller backend and attach sensors
//! - Build the world from a `SessionBlueprint`, with teardown and rollback
//! - Drive the session run loop
//!
//! The engine sits behind [`SimulationContext`]; [`InMemorySimulation`]
//! implements it in-process.

pub mod backend;
pub mod client;
pub mod error;
pub mod factory;
pub mod in_memory;
pub mod namespace;
pub mod pose;
pub mod scene;
pub mod sensor;
pub mod session;

pub use backend::BackendWirer;
pub use client::{MultirotorRequest, SimulationContext};
pub use contracts::{SessionBlueprint, SessionGraph, SpawnedVehicle};
pub use error::{FactoryError, Result};
pub use factory::VehicleFactory;
pub use in_memory::{InMemoryConfig, InMemorySimulation, PrimKind, PrimRecord, TimelineState};
pub use namespace::NamespaceAllocator;
pub use pose::PoseResolver;
pub use scene::{SceneBuilder, CLOCK_TOPIC};
pub use sensor::SensorAttacher;
pub use session::{ExitReason, SessionRunner, SessionStats, StopHandle};
