//! Expiry notifier for aliveim
//!
//! This crate defines the outbound boundary of the service: the call made
//! once a device's timer has elapsed. It provides:
//! - The `ExpiryNotifier` trait the core depends on
//! - `HttpNotifier`, which POSTs an expiry notice to the upstream API
//! - `MockNotifier`, which records notifications for tests

mod http;
mod mock;
mod traits;

pub use http::*;
pub use mock::*;
pub use traits::*;
