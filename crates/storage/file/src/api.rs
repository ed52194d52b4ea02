//! Public API for the `file` crate

use crate::errors::FileError;
use crate::file_catalog::FileCatalog;
use page::page_id::{FileId, PageId};
use std::sync::Arc;

/// File manager public API
///
/// A `FileManager` manages a collection of fixed-size pages addressed by
/// `PageId`, grouped into files addressed by `FileId`. File ids are resolved
/// to concrete paths through the shared [`FileCatalog`]. Implementations are
/// free to choose the backing storage layout; the trait documents
/// method-level expectations.
pub trait FileManager {
    /// Create a new file manager instance bound to the provided catalog.
    fn new(file_catalog: Arc<FileCatalog>) -> Self;

    /// Create the backing file for `file_id`.
    ///
    /// Fails with [`FileError::AlreadyExists`] if the file is already present,
    /// and with [`FileError::NotRegistered`] if the catalog has no path for it.
    fn create_file(&self, file_id: FileId) -> Result<(), FileError>;

    /// Open the existing backing file for `file_id`.
    ///
    /// Returns the number of whole pages the file currently holds. Fails with
    /// [`FileError::NotFound`] if the file does not exist.
    fn open_file(&self, file_id: FileId) -> Result<u32, FileError>;

    /// Close the backing file for `file_id`, releasing any cached OS handle.
    /// Closing a file that was never opened is not an error.
    fn close_file(&self, file_id: FileId) -> Result<(), FileError>;

    /// Read the page identified by `page_id` into `destination`.
    ///
    /// `destination` must be exactly one page long. Reading past the end of
    /// the file fails with [`FileError::PageOutOfBounds`].
    fn read_page(&self, page_id: PageId, destination: &mut [u8]) -> Result<(), FileError>;

    /// Write the contents of `page_data` as the page for `page_id`.
    ///
    /// `page_data` must be exactly one page long. Writing one page past the
    /// current end extends the file.
    fn write_page(&self, page_id: PageId, page_data: &[u8]) -> Result<(), FileError>;
}
