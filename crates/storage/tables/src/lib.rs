//! Record stores built on top of the buffer pool: an unordered heap file, a
//! static-bucket primary hash table keyed by record id, and an in-memory
//! secondary hash index keyed by record name.

pub mod errors;

/// The fixed-width record all three stores operate on.
pub mod record;

/// Unordered record store with first-fit placement.
pub mod heap_file;

/// Static primary hash table: one pre-allocated page per bucket, tail-only
/// insertion and lookup.
pub mod hash_table;

/// In-memory secondary index over the record name, with last-write-wins
/// slots.
pub mod secondary_index;
