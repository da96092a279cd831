//! Shared utilities for aliveim
//!
//! This crate provides:
//! - ID types (DeviceId, ArmingId)
//! - Time utilities (timeout policy, wall-clock helpers)
//! - Default paths for the config file

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
