//! The `file` crate is responsible for the implementation of interaction between the engine and the file system.
//! Its main logic centers around retrieving from/writing to disk data pages.

pub mod api;

pub mod errors;

pub mod file_catalog;

/// The actual disk based file manager
pub mod disk_file_manager;

/// An in-memory stand-in for the disk file manager, used by tests.
pub mod in_memory_file_manager;
