//! # Contracts
//!
//! Shared data model for the scenario bootstrapper. Every other crate in the
//! workspace depends on this one; it depends on none of them.
//!
//! ## Conventions
//! - Positions are world units (metres), `[x, y, z]`
//! - Euler angles are degrees; vehicles use intrinsic X-Y-Z order
//! - Quaternions are exposed scalar-last (`[x, y, z, w]`) at the boundary

mod blueprint;
mod error;
mod geometry;
mod runtime;
mod sensor;
mod vehicle;

pub use blueprint::*;
pub use error::*;
pub use geometry::*;
pub use runtime::*;
pub use sensor::*;
pub use vehicle::*;
