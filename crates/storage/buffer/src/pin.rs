use crate::frame::BufferFrame;
use page::page_id::PageId;
use page::PAGE_SIZE;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::Ordering;
use std::sync::{Arc, RwLockReadGuard, RwLockWriteGuard};

/// A claim on one page held in the buffer pool. While a `PagePin` exists the
/// frame will not be evicted or reused. Pins are released explicitly through
/// [`BufferPool::unpin`](crate::pool::BufferPool::unpin); a session handle
/// that keeps pages pinned (the hash table keeps one per bucket) must unpin
/// them all on close, otherwise closing the file reports an error.
#[derive(Debug)]
pub struct PagePin {
    pub(crate) frame: Arc<BufferFrame>,
    pub(crate) page_id: PageId,
}

impl PagePin {
    /// The id of the pinned page.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Read access to the page bytes.
    pub fn data(&self) -> PageBytes<'_> {
        PageBytes {
            guard: self.frame.data.read().unwrap(),
        }
    }

    /// Write access to the page bytes. Callers that modify the page must also
    /// call [`mark_dirty`](Self::mark_dirty) before releasing the pin.
    pub fn data_mut(&self) -> PageBytesMut<'_> {
        PageBytesMut {
            guard: self.frame.data.write().unwrap(),
        }
    }

    /// Flags the page so eviction and close write it back to disk.
    pub fn mark_dirty(&self) {
        self.frame.dirty.store(true, Ordering::Relaxed);
    }
}

/// Provides read access to the bytes of a pinned page.
/// Free as soon as possible.
#[derive(Debug)]
pub struct PageBytes<'a> {
    guard: RwLockReadGuard<'a, Box<[u8; PAGE_SIZE]>>,
}

impl Deref for PageBytes<'_> {
    type Target = [u8; PAGE_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Provides write access to the bytes of a pinned page.
/// Free as soon as possible.
#[derive(Debug)]
pub struct PageBytesMut<'a> {
    guard: RwLockWriteGuard<'a, Box<[u8; PAGE_SIZE]>>,
}

impl Deref for PageBytesMut<'_> {
    type Target = [u8; PAGE_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for PageBytesMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
