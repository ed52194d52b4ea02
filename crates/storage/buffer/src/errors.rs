use file::errors::FileError;
use page::page_id::{FileId, PageId};
use thiserror::Error;

/// Buffer error.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Every frame in the pool is pinned; nothing can be evicted.
    #[error("buffer pool exhausted: all {capacity} frames are pinned")]
    PoolExhausted { capacity: usize },
    /// The file was never created or opened through this pool.
    #[error("file {0} is not open in this buffer pool")]
    FileNotOpen(FileId),
    /// A file is being closed while one of its pages still holds pins.
    /// Leaking a pin is a caller bug: the pool will not flush a page that is
    /// still claimed, so its dirty state would be lost.
    #[error("page {page_id} still holds {pins} pin(s) while its file is being closed")]
    PagePinned { page_id: PageId, pins: u32 },
    /// Failure propagated from the underlying file manager.
    #[error(transparent)]
    File(#[from] FileError),
}
