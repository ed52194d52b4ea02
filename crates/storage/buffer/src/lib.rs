//! Buffer management module for the storage system: a fixed pool of page
//! frames with explicit pin/unpin, dirty tracking and write-back on eviction.

pub mod errors;
mod frame;
pub mod pool;

/// Exposes the `PagePin` handle and the guard structs that provide access to
/// the pinned page bytes.
pub mod pin;
