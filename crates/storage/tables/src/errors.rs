use buffer::errors::BufferError;
use page::errors::LayoutError;
use page::page_id::FileId;
use thiserror::Error;

/// Public facing error type returned by the record stores.
#[derive(Debug, Error)]
pub enum TableError {
    /// Failure propagated from the buffer pool or the file manager below it.
    #[error(transparent)]
    Buffer(#[from] BufferError),
    /// Failure while reading or writing a page layout field.
    #[error("page layout error")]
    Layout(#[from] LayoutError),
    /// A header page read back at open time violates the format invariants.
    #[error("malformed header in file {file_id}: {reason}")]
    MalformedHeader { file_id: FileId, reason: String },
    /// A record slice has the wrong width for this file.
    #[error("record slice is {actual} bytes, expected {expected}")]
    CorruptRecord { expected: usize, actual: usize },
    /// The table was created with a bucket count of zero.
    #[error("bucket count must be at least 1")]
    ZeroBuckets,
    /// Opening the hash table would pin more pages than the pool holds.
    /// Surfaced before any page is pinned so the pool is left untouched.
    #[error(
        "hash table session needs {required} buffer frames ({buckets} bucket pins plus transient pins) but the pool only has {capacity}"
    )]
    PoolTooSmall {
        buckets: usize,
        required: usize,
        capacity: usize,
    },
}

/// Result alias used across the record stores.
pub type TableResult<T> = Result<T, TableError>;
