use crate::api::FileManager;
use crate::errors::FileError;
use crate::file_catalog::FileCatalog;
use page::page_id::{FileId, PageId};
use page::PAGE_SIZE;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// An in-memory file manager holding every page in a per-file page vector.
/// It mirrors the disk manager's contract exactly, which makes it the file
/// backend of choice for buffer and table tests.
#[derive(Debug)]
pub struct InMemoryFileManager {
    files: RwLock<HashMap<FileId, Vec<Box<[u8]>>>>,
    file_catalog: Arc<FileCatalog>,
}

impl FileManager for InMemoryFileManager {
    fn new(file_catalog: Arc<FileCatalog>) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            file_catalog,
        }
    }

    fn create_file(&self, file_id: FileId) -> Result<(), FileError> {
        let mut files = self.files.write().unwrap();
        if files.contains_key(&file_id) {
            return Err(FileError::AlreadyExists {
                path: self.path_for_errors(file_id),
            });
        }
        files.insert(file_id, Vec::new());
        Ok(())
    }

    fn open_file(&self, file_id: FileId) -> Result<u32, FileError> {
        let files = self.files.read().unwrap();
        let pages = files.get(&file_id).ok_or_else(|| FileError::NotFound {
            path: self.path_for_errors(file_id),
        })?;
        Ok(pages.len() as u32)
    }

    fn close_file(&self, _file_id: FileId) -> Result<(), FileError> {
        // Nothing to release; pages stay addressable so a later open sees them.
        Ok(())
    }

    fn read_page(&self, page_id: PageId, destination: &mut [u8]) -> Result<(), FileError> {
        let files = self.files.read().unwrap();
        let pages = files
            .get(&page_id.file_id)
            .ok_or_else(|| FileError::NotFound {
                path: self.path_for_errors(page_id.file_id),
            })?;

        let page = pages
            .get(page_id.page_number as usize)
            .ok_or(FileError::PageOutOfBounds {
                page_id,
                page_count: pages.len() as u32,
            })?;

        destination.copy_from_slice(page);
        Ok(())
    }

    fn write_page(&self, page_id: PageId, page_data: &[u8]) -> Result<(), FileError> {
        let mut files = self.files.write().unwrap();
        let pages = files
            .get_mut(&page_id.file_id)
            .ok_or_else(|| FileError::NotFound {
                path: self.path_for_errors(page_id.file_id),
            })?;

        let index = page_id.page_number as usize;
        while pages.len() <= index {
            pages.push(vec![0u8; PAGE_SIZE].into_boxed_slice());
        }
        pages[index].copy_from_slice(page_data);
        Ok(())
    }
}

impl InMemoryFileManager {
    fn path_for_errors(&self, file_id: FileId) -> PathBuf {
        self.file_catalog
            .get_file_name(file_id)
            .unwrap_or_else(|| PathBuf::from(format!("<in-memory file {file_id}>")))
    }
}
