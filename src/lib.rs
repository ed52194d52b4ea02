//! # recdb
//!
//! This is the main crate for the **recdb** record storage engine.
//!
//! The engine is composed of multiple internal components organized under
//! the `/crates` directory of this workspace:
//!
//! - `/storage`: page layouts, file managers, the buffer pool and the record
//!   stores (heap file, primary hash table, secondary index).
//!
//! The facade re-exports the workspace crates so integration code can reach
//! them through a single dependency.

pub use buffer;
pub use file;
pub use page;
pub use tables;
