//! Simulation context abstraction
//!
//! Defines the trait the scene builder, vehicle factory and session runner
//! drive. The engine behind it owns the scene graph and simulated time; this
//! crate only issues requests. One context is constructed per session and
//! passed by reference, never reached through global state.

use std::path::Path;

use contracts::{BackendConfig, Pose, PoseTreeSpec, SensorHandle};

use crate::error::Result;

/// Construction request for a multirotor entity
#[derive(Debug, Clone, Copy)]
pub struct MultirotorRequest<'a> {
    /// Scene path the vehicle is created at
    pub scene_path: &'a str,
    /// Robot asset name, e.g. "Iris"
    pub robot: &'a str,
    pub vehicle_id: u32,
    pub pose: &'a Pose,
    /// Control backends; must be known at construction time
    pub backends: &'a [BackendConfig],
}

/// Simulation context trait
///
/// All calls are synchronous. `step` blocks until one simulated frame has
/// advanced.
pub trait SimulationContext {
    /// Add the engine's default ground plane at `prim_path`
    fn add_ground_plane(&mut self, prim_path: &str) -> Result<()>;

    /// Set name, pose and scale of an existing prim
    ///
    /// `pose = None` leaves the current pose untouched.
    fn set_xform(
        &mut self,
        prim_path: &str,
        name: &str,
        pose: Option<&Pose>,
        scale: [f64; 3],
    ) -> Result<()>;

    /// Reference an external asset into the scene at `prim_path`
    fn add_reference(&mut self, asset_path: &Path, prim_path: &str) -> Result<()>;

    /// Define a sphere light
    fn define_sphere_light(
        &mut self,
        prim_path: &str,
        radius: f64,
        intensity: f64,
        translation: [f64; 3],
    ) -> Result<()>;

    /// Construct a multirotor; this is when the vehicle becomes visible
    fn spawn_multirotor(&mut self, request: &MultirotorRequest<'_>) -> Result<()>;

    /// Create a sensor as a child of its vehicle
    fn attach_sensor(&mut self, sensor: &SensorHandle) -> Result<()>;

    /// Publish simulation time on `topic`
    fn register_clock_publisher(&mut self, topic: &str) -> Result<()>;

    /// Publish the relative poses of a vehicle's child links
    fn register_pose_tree_publisher(&mut self, spec: &PoseTreeSpec) -> Result<()>;

    /// Remove a prim and everything below it
    ///
    /// Idempotent: returns Ok if the prim does not exist.
    fn remove_prim(&mut self, prim_path: &str) -> Result<()>;

    /// Check if a prim exists
    fn prim_exists(&self, prim_path: &str) -> bool;

    /// Reset the world after scene setup
    fn reset(&mut self) -> Result<()>;

    /// Start the timeline
    fn play(&mut self);

    /// Advance simulated time by one frame
    fn step(&mut self, render: bool) -> Result<()>;

    /// Whether the application is still running
    fn is_running(&self) -> bool;

    /// Stop the timeline
    fn stop(&mut self);

    /// Release the application; the context is unusable afterwards
    fn close(&mut self);
}
