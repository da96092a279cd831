//! Wire types for aliveim
//!
//! This crate defines the JSON shapes exchanged at the service boundaries:
//! - Alive reports from devices and their responses
//! - Device status queries
//! - Expiry notices posted to the upstream API

mod types;

pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
