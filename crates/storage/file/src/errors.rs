use page::page_id::{FileId, PageId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by file managers. All of them are fatal to the calling
/// operation; there is no transient-failure model at this layer.
#[derive(Debug, Error)]
pub enum FileError {
    /// Creation was requested for a file that already exists.
    #[error("file already exists: {path}")]
    AlreadyExists { path: PathBuf },
    /// Open was requested for a file that does not exist.
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },
    /// The file id has no path registered in the catalog.
    #[error("file id {0} is not registered in the catalog")]
    NotRegistered(FileId),
    /// A page was requested past the end of its file.
    #[error("page {page_id} is beyond the end of its file ({page_count} pages)")]
    PageOutOfBounds { page_id: PageId, page_count: u32 },
    /// Any other I/O failure from the operating system.
    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
