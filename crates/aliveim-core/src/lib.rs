//! Device timer registry for aliveim
//!
//! This crate is the heart of aliveim, containing:
//! - The registry mapping each live device to its expiring timer
//! - Reset-or-create handling of alive reports
//! - One watcher task per timer incarnation
//! - Expiration handling (remove, then notify upstream)
//!
//! Per device: Absent -> Live (created) -> Live (reset) -> Absent (expired | removed)

mod expiry;
mod registry;
mod watcher;

pub use expiry::*;
pub use registry::*;
