//! Session orchestration module.

mod driver;
mod stats;

pub use driver::{DriverConfig, SessionDriver};
pub use stats::RunStats;
