//! Run statistics.

use std::time::Duration;

use contracts::SessionGraph;
use vehicle_factory::SessionStats;

/// Statistics from one session
#[derive(Debug, Clone)]
pub struct RunStats {
    /// What the scene builder created
    pub graph: SessionGraph,

    /// Run loop summary
    pub session: SessionStats,

    /// Total duration including scene setup
    pub duration: Duration,
}

impl RunStats {
    /// Simulated seconds per wall-clock second
    pub fn real_time_factor(&self) -> f64 {
        let wall = self.session.wall_time.as_secs_f64();
        if wall > 0.0 {
            self.session.sim_time / wall
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Session Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Steps: {}", self.session.steps);
        println!("   ├─ Simulated time: {:.3}s", self.session.sim_time);
        println!("   ├─ Real-time factor: {:.2}", self.real_time_factor());
        println!("   └─ Exit: {:?}", self.session.exit_reason);

        println!("\nVehicles ({})", self.graph.vehicles.len());
        let count = self.graph.vehicles.len();
        for (i, vehicle) in self.graph.vehicles.values().enumerate() {
            let prefix = if i + 1 == count { "└─" } else { "├─" };
            let sensors: Vec<&str> = vehicle.sensors.iter().map(|s| s.topic.as_str()).collect();
            println!(
                "   {} {} (id {}, MAVLink {}) sensors: {:?}",
                prefix,
                vehicle.scene_path(),
                vehicle.id(),
                vehicle
                    .backends
                    .first()
                    .map(|b| b.connection_port())
                    .unwrap_or_default(),
                sensors
            );
        }

        println!("\nStep duration (ms): {}", self.session.metrics.step_ms);
        println!();
    }
}
