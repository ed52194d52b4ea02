//! This crate provides the shared on-disk page layout convention used by the
//! heap file, the primary hash table and the secondary index: header pages
//! holding a handful of `u32` fields, and data pages holding a record count
//! followed by fixed-width records packed contiguously.

pub mod errors;

/// Typed, zero-copy views over raw page bytes.
pub mod layout;

/// Unique identifier for pages.
pub mod page_id;

/// Fixed size of a page in bytes.
pub const PAGE_SIZE: usize = 512;
