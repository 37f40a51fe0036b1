//! Session run loop
//!
//! Plays the timeline and steps the simulation until the application stops
//! running or a stop is requested, then stops the timeline and closes the
//! application. The stop flag is checked once per step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use observability::{MetricsSummary, SessionMetricsAggregator};
use tracing::{debug, error, info, instrument, warn};

use crate::client::SimulationContext;
use crate::error::Result;

/// Cooperative stop flag shared with signal handlers
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why the run loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The stop flag was set
    StopRequested,
    /// The application reported it is no longer running
    AppClosed,
}

/// Summary of one run
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub steps: u64,
    /// Simulated seconds, `steps * physics_dt`
    pub sim_time: f64,
    pub wall_time: Duration,
    pub exit_reason: ExitReason,
    pub metrics: MetricsSummary,
}

/// Session runner
#[derive(Debug)]
pub struct SessionRunner {
    stop: StopHandle,
    render: bool,
    physics_dt: f64,
}

impl SessionRunner {
    pub fn new(render: bool, physics_dt: f64) -> Self {
        Self {
            stop: StopHandle::new(),
            render,
            physics_dt,
        }
    }

    /// Use an externally created stop flag
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Handle that ends the loop after the current step
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Drive the simulation until it closes or a stop is requested
    ///
    /// The timeline is stopped and the application closed on every exit
    /// path, including a failed step.
    #[instrument(name = "session_runner_run", skip(self, ctx), fields(render = self.render))]
    pub fn run<C: SimulationContext + ?Sized>(&mut self, ctx: &mut C) -> Result<SessionStats> {
        let started = Instant::now();
        let mut aggregator = SessionMetricsAggregator::new();

        ctx.play();
        info!(physics_dt = self.physics_dt, "timeline started");

        let outcome = loop {
            if self.stop.is_stop_requested() {
                break Ok(ExitReason::StopRequested);
            }
            if !ctx.is_running() {
                break Ok(ExitReason::AppClosed);
            }

            let step_started = Instant::now();
            if let Err(e) = ctx.step(self.render) {
                error!(error = %e, steps = aggregator.steps, "simulation step failed");
                break Err(e);
            }

            let step_ms = step_started.elapsed().as_secs_f64() * 1000.0;
            let sim_time = (aggregator.steps + 1) as f64 * self.physics_dt;
            aggregator.record_step(sim_time, step_ms);
            observability::record_sim_step(sim_time, step_ms);
        };

        warn!("app is closing");
        ctx.stop();
        ctx.close();

        let exit_reason = outcome?;
        let stats = SessionStats {
            steps: aggregator.steps,
            sim_time: aggregator.sim_time,
            wall_time: started.elapsed(),
            exit_reason,
            metrics: aggregator.summary(),
        };
        debug!(exit_reason = ?stats.exit_reason, steps = stats.steps, "run loop finished");
        Ok(stats)
    }
}
