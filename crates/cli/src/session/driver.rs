//! Session driver - builds the scene and runs the loop.
//!
//! Runs on a blocking thread; the async side only holds the stop handle.

use std::time::Instant;

use anyhow::Result;
use contracts::SessionBlueprint;
use tracing::info;
use vehicle_factory::{
    InMemoryConfig, InMemorySimulation, SceneBuilder, SessionRunner, SimulationContext, StopHandle,
};

use super::RunStats;
use crate::error::CliError;

/// Driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// The session blueprint
    pub blueprint: SessionBlueprint,

    /// Step budget (None = until stopped)
    pub max_steps: Option<u64>,

    /// Pace steps to wall-clock time
    pub real_time: bool,
}

/// Main session driver
pub struct SessionDriver {
    config: DriverConfig,
    stop: StopHandle,
}

impl SessionDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            stop: StopHandle::new(),
        }
    }

    /// Handle that ends the run loop after the current step
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Build the scene and run until the step budget or a stop request
    pub fn run(self) -> Result<RunStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let world = &blueprint.world;

        let mut ctx = InMemorySimulation::with_config(InMemoryConfig {
            physics_dt: world.physics_dt,
            max_steps: self.config.max_steps,
            real_time: self.config.real_time,
            ..Default::default()
        });
        info!(
            physics_dt = world.physics_dt,
            rendering_dt = world.rendering_dt,
            stage_units_in_meters = world.stage_units_in_meters,
            headless = blueprint.session.headless,
            "Simulation context created"
        );

        let mut builder = SceneBuilder::from_blueprint(blueprint);
        let graph = match builder.build(&mut ctx, blueprint) {
            Ok(graph) => graph,
            Err(e) => {
                ctx.close();
                return Err(CliError::scene_setup(e).into());
            }
        };

        info!(
            vehicles = graph.vehicles.len(),
            sensors = graph.sensor_count(),
            backends = graph.backend_count(),
            "Scene ready"
        );

        let render = blueprint.session.render && !blueprint.session.headless;
        let mut runner =
            SessionRunner::new(render, world.physics_dt).with_stop_handle(self.stop.clone());
        let session = runner.run(&mut ctx).map_err(CliError::session)?;

        Ok(RunStats {
            graph,
            session,
            duration: start_time.elapsed(),
        })
    }
}
