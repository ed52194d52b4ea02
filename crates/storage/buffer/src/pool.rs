//! Provides the implementation for the page pool leveraged by the record stores.

use crate::errors::BufferError;
use crate::frame::{BufferFrame, FrameId};
use crate::pin::PagePin;
use file::api::FileManager;
use file::errors::FileError;
use file::file_catalog::FileCatalog;
use page::page_id::{FileId, PageId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

/// The buffer pool responsible for handling the cache of data pages.
///
/// The pool owns a fixed number of frames. Pages are claimed with
/// [`fetch_page`](Self::fetch_page)/[`allocate_page`](Self::allocate_page),
/// which hand out [`PagePin`] handles, and released with
/// [`unpin`](Self::unpin). A frame whose pin count is zero may be evicted to
/// make room; eviction writes the frame back through the file manager when it
/// is dirty. When every frame is pinned the pool reports
/// [`BufferError::PoolExhausted`] instead of corrupting state — callers that
/// pin many pages for a whole session (the hash table pins one page per
/// bucket) are expected to validate against [`capacity`](Self::capacity)
/// up front.
///
/// The engine is single-session; the internal locks only provide interior
/// mutability, not cross-session coordination. Lock order: `page_map`
/// before `page_counts`, never the reverse.
#[derive(Debug)]
pub struct BufferPool<F: FileManager> {
    file_manager: Arc<F>,
    file_catalog: Arc<FileCatalog>,
    frames: Vec<Arc<BufferFrame>>,
    page_map: Mutex<HashMap<PageId, FrameId>>,
    page_counts: Mutex<HashMap<FileId, u32>>,
}

impl<F: FileManager> BufferPool<F> {
    /// Creates a new empty buffer pool.
    /// Allocates a predefined number of buffer frames.
    pub fn new(file_manager: Arc<F>, file_catalog: Arc<FileCatalog>, pool_size: usize) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            frames.push(Arc::new(BufferFrame::default()));
        }
        Self {
            file_manager,
            file_catalog,
            frames,
            page_map: Mutex::new(HashMap::new()),
            page_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Total number of frames in the pool.
    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    /// Registers `path` in the catalog and creates its backing file.
    /// Fails if the file already exists.
    pub fn create_file(&self, path: impl AsRef<Path>) -> Result<FileId, BufferError> {
        let file_id = self.file_catalog.register(path.as_ref());
        self.file_manager.create_file(file_id)?;
        self.page_counts.lock().unwrap().insert(file_id, 0);
        tracing::info!(file_id, path = %path.as_ref().display(), "created file");
        Ok(file_id)
    }

    /// Registers `path` in the catalog and opens its existing backing file.
    /// Fails if the file does not exist.
    pub fn open_file(&self, path: impl AsRef<Path>) -> Result<FileId, BufferError> {
        let file_id = self.file_catalog.register(path.as_ref());
        let pages = self.file_manager.open_file(file_id)?;
        self.page_counts.lock().unwrap().insert(file_id, pages);
        tracing::info!(file_id, pages, path = %path.as_ref().display(), "opened file");
        Ok(file_id)
    }

    /// Flushes every cached page of `file_id`, releases its frames and closes
    /// the backing file.
    ///
    /// Fails with [`BufferError::PagePinned`] if any page of the file is
    /// still pinned: a leaked pin means some session did not release its
    /// resources, and silently dropping the page could lose dirty state.
    pub fn close_file(&self, file_id: FileId) -> Result<(), BufferError> {
        let mut map = self.page_map.lock().unwrap();

        for (&page_id, &frame_id) in map.iter() {
            if page_id.file_id == file_id {
                let pins = self.frames[frame_id].pin_count.load(Ordering::Relaxed);
                if pins > 0 {
                    return Err(BufferError::PagePinned { page_id, pins });
                }
            }
        }

        let cached: Vec<(PageId, FrameId)> = map
            .iter()
            .filter(|(page_id, _)| page_id.file_id == file_id)
            .map(|(&page_id, &frame_id)| (page_id, frame_id))
            .collect();

        for (page_id, frame_id) in cached {
            let frame = &self.frames[frame_id];
            if frame.dirty.swap(false, Ordering::Relaxed) {
                let data = frame.data.read().unwrap();
                self.file_manager.write_page(page_id, &data[..])?;
            }
            *frame.page_id.write().unwrap() = None;
            map.remove(&page_id);
        }

        self.page_counts.lock().unwrap().remove(&file_id);
        self.file_manager.close_file(file_id)?;
        tracing::info!(file_id, "closed file");
        Ok(())
    }

    /// Number of pages currently in `file_id`.
    pub fn page_count(&self, file_id: FileId) -> Result<u32, BufferError> {
        let counts = self.page_counts.lock().unwrap();
        counts
            .get(&file_id)
            .copied()
            .ok_or(BufferError::FileNotOpen(file_id))
    }

    /// Appends a fresh zeroed page to `file_id` and returns it pinned.
    ///
    /// The new page is born dirty so that it reaches disk even if the caller
    /// never writes into it (an empty data page is still a valid page).
    pub fn allocate_page(&self, file_id: FileId) -> Result<PagePin, BufferError> {
        let mut map = self.page_map.lock().unwrap();
        let mut counts = self.page_counts.lock().unwrap();
        let next = *counts
            .get(&file_id)
            .ok_or(BufferError::FileNotOpen(file_id))?;
        let page_id = PageId::new(file_id, next);

        let frame_id = self.claim_frame(&mut map, page_id)?;

        {
            let mut data = self.frames[frame_id].data.write().unwrap();
            data.fill(0);
        }
        self.frames[frame_id].dirty.store(true, Ordering::Relaxed);

        map.insert(page_id, frame_id);
        counts.insert(file_id, next + 1);

        Ok(PagePin {
            frame: Arc::clone(&self.frames[frame_id]),
            page_id,
        })
    }

    /// Pins the page identified by `page_id`, loading it from disk if it is
    /// not already cached in a frame.
    pub fn fetch_page(&self, page_id: PageId) -> Result<PagePin, BufferError> {
        let mut map = self.page_map.lock().unwrap();

        // Happiest of flows - the page is already cached.
        if let Some(&frame_id) = map.get(&page_id) {
            let frame = &self.frames[frame_id];
            frame.pin_count.fetch_add(1, Ordering::Relaxed);
            return Ok(PagePin {
                frame: Arc::clone(frame),
                page_id,
            });
        }

        // Reject requests for pages past the end before touching a frame.
        {
            let counts = self.page_counts.lock().unwrap();
            let page_count = *counts
                .get(&page_id.file_id)
                .ok_or(BufferError::FileNotOpen(page_id.file_id))?;
            if page_id.page_number >= page_count {
                return Err(FileError::PageOutOfBounds {
                    page_id,
                    page_count,
                }
                .into());
            }
        }

        let frame_id = self.claim_frame(&mut map, page_id)?;

        {
            let mut data = self.frames[frame_id].data.write().unwrap();
            if let Err(e) = self.file_manager.read_page(page_id, &mut data[..]) {
                // rollback claim
                *self.frames[frame_id].page_id.write().unwrap() = None;
                self.frames[frame_id].pin_count.store(0, Ordering::Relaxed);
                return Err(e.into());
            }
        }

        map.insert(page_id, frame_id);
        Ok(PagePin {
            frame: Arc::clone(&self.frames[frame_id]),
            page_id,
        })
    }

    /// Releases one pin. The page bytes stay cached; a dirty page is written
    /// back later, on eviction or when its file is closed.
    pub fn unpin(&self, pin: PagePin) {
        let prev = pin.frame.pin_count.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(prev > 0, "unpin without a matching pin");
    }

    /// Goes through the `frames` to find one that can hold `for_page_id`.
    /// Frames with outstanding pins are skipped. A frame still holding an
    /// unpinned page is evicted: dirty contents are written back through the
    /// file manager first, then the old mapping is dropped.
    ///
    /// # Returns
    /// The `FrameId` for the claimed frame, with its pin count set to 1, or
    /// `BufferError::PoolExhausted` if every frame is pinned.
    fn claim_frame(
        &self,
        map: &mut HashMap<PageId, FrameId>,
        for_page_id: PageId,
    ) -> Result<FrameId, BufferError> {
        for (frame_id, frame) in self.frames.iter().enumerate() {
            if frame.pin_count.load(Ordering::Relaxed) > 0 {
                // Just skip the claimed ones
                continue;
            }

            let mut held_page_id = frame.page_id.write().unwrap();
            if let Some(old_page_id) = *held_page_id {
                if frame.dirty.swap(false, Ordering::Relaxed) {
                    let data = frame.data.read().unwrap();
                    self.file_manager.write_page(old_page_id, &data[..])?;
                    tracing::debug!(%old_page_id, %for_page_id, "evicted dirty page");
                }
                map.remove(&old_page_id);
            }

            *held_page_id = Some(for_page_id);
            frame.pin_count.store(1, Ordering::Relaxed);
            frame.dirty.store(false, Ordering::Relaxed);
            return Ok(frame_id);
        }

        Err(BufferError::PoolExhausted {
            capacity: self.frames.len(),
        })
    }
}

// ------------------------------------------------------------------------------------------------
