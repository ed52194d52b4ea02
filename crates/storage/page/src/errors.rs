use binary_helpers::bin_error::BinaryError;
use thiserror::Error;

/// Errors raised by the typed page-layout views.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A view was constructed over a slice that is not exactly one page long.
    #[error("page view requires a {expected}-byte slice, got {actual} bytes")]
    PageSliceSizeMismatch { expected: usize, actual: usize },
    /// A record index points past the end of the page.
    #[error("record index {index} is out of bounds for record size {record_size}")]
    RecordOutOfBounds { index: usize, record_size: usize },
    /// The page already holds the maximum number of records for this width.
    #[error("page is full: already holds {record_count} records of size {record_size}")]
    PageFull {
        record_count: usize,
        record_size: usize,
    },
    /// Error while reading or writing a header field.
    #[error("error while accessing a page field")]
    Binary(#[from] BinaryError),
}
