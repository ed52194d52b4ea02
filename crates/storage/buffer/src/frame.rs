use page::page_id::PageId;
use page::PAGE_SIZE;
use std::sync::atomic::{AtomicBool, AtomicU32};
use std::sync::RwLock;

/// The ID of a frame is basically just its index in the pool's vector
pub(crate) type FrameId = usize;

/// A buffer frame is a memory allocation designed to store the contents of a
/// data page in memory, along with the metadata needed by the buffer pool.
/// The `page_id` is optional (`Option<T>`) to indicate that the frame is
/// empty; an empty frame contains a zeroed byte array.
///
/// Access to the `BufferFrame` is not allowed outside the `BufferPool` -
/// instead, the `PagePin` handle provides guarded references to the bytes.
#[derive(Debug)]
pub(crate) struct BufferFrame {
    /// The `PageId` corresponding to the page stored in the `data` field.
    /// `None` if the frame is empty.
    pub(crate) page_id: RwLock<Option<PageId>>,

    /// The page bytes. Protected by a `RwLock`.
    pub(crate) data: RwLock<Box<[u8; PAGE_SIZE]>>,

    /// Number of outstanding pins. A frame with pins can never be evicted.
    pub(crate) pin_count: AtomicU32,

    /// Dirtiness flag; set when a pinned caller modified the page bytes.
    pub(crate) dirty: AtomicBool,
}

impl Default for BufferFrame {
    fn default() -> Self {
        Self {
            page_id: RwLock::new(None),
            data: RwLock::new(Box::new([0; PAGE_SIZE])),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
        }
    }
}
