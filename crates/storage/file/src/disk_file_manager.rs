use crate::api::FileManager;
use crate::errors::FileError;
use crate::file_catalog::FileCatalog;
use page::page_id::{FileId, PageId};
use page::PAGE_SIZE;
use std::collections::HashMap;
use std::fs;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

/// A disk based file manager
#[derive(Debug)]
pub struct DiskFileManager {
    files: RwLock<HashMap<FileId, Arc<File>>>,
    file_catalog: Arc<FileCatalog>,
}

impl FileManager for DiskFileManager {
    fn new(file_catalog: Arc<FileCatalog>) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            file_catalog,
        }
    }

    fn create_file(&self, file_id: FileId) -> Result<(), FileError> {
        let path = self.resolve(file_id)?;
        Self::ensure_parent_dir(&path)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| match source.kind() {
                ErrorKind::AlreadyExists => FileError::AlreadyExists { path: path.clone() },
                _ => FileError::Io {
                    path: path.clone(),
                    source,
                },
            })?;

        let mut files = self.files.write().unwrap();
        files.insert(file_id, Arc::new(file));
        Ok(())
    }

    fn open_file(&self, file_id: FileId) -> Result<u32, FileError> {
        let path = self.resolve(file_id)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => FileError::NotFound { path: path.clone() },
                _ => FileError::Io {
                    path: path.clone(),
                    source,
                },
            })?;

        let len = file
            .metadata()
            .map_err(|source| FileError::Io {
                path: path.clone(),
                source,
            })?
            .len();
        let page_count = (len as usize / PAGE_SIZE) as u32;

        let mut files = self.files.write().unwrap();
        files.insert(file_id, Arc::new(file));
        Ok(page_count)
    }

    fn close_file(&self, file_id: FileId) -> Result<(), FileError> {
        let removed = {
            let mut files = self.files.write().unwrap();
            files.remove(&file_id)
        };

        if let Some(file) = removed {
            let path = self.resolve(file_id)?;
            file.sync_all()
                .map_err(|source| FileError::Io { path, source })?;
        }
        Ok(())
    }

    fn read_page(&self, page_id: PageId, destination: &mut [u8]) -> Result<(), FileError> {
        let file = self.get_open_file(page_id.file_id)?;
        let offset = ((page_id.page_number as usize) * PAGE_SIZE) as u64;

        let n = Self::read_at(file.as_ref(), destination, offset).map_err(|source| {
            FileError::Io {
                path: self.path_for_errors(page_id.file_id),
                source,
            }
        })?;

        if n != PAGE_SIZE {
            let len = file.metadata().map(|m| m.len()).unwrap_or(0);
            return Err(FileError::PageOutOfBounds {
                page_id,
                page_count: (len as usize / PAGE_SIZE) as u32,
            });
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, page_data: &[u8]) -> Result<(), FileError> {
        let file = self.get_open_file(page_id.file_id)?;
        let offset = ((page_id.page_number as usize) * PAGE_SIZE) as u64;

        let mut written = 0;
        while written < PAGE_SIZE {
            let n = Self::write_at(file.as_ref(), &page_data[written..], offset + written as u64)
                .map_err(|source| FileError::Io {
                    path: self.path_for_errors(page_id.file_id),
                    source,
                })?;

            if n == 0 {
                return Err(FileError::Io {
                    path: self.path_for_errors(page_id.file_id),
                    source: std::io::Error::new(ErrorKind::WriteZero, "wrote 0 bytes"),
                });
            }

            written += n;
        }
        Ok(())
    }
}

impl DiskFileManager {
    fn resolve(&self, file_id: FileId) -> Result<PathBuf, FileError> {
        self.file_catalog
            .get_file_name(file_id)
            .ok_or(FileError::NotRegistered(file_id))
    }

    fn path_for_errors(&self, file_id: FileId) -> PathBuf {
        self.file_catalog
            .get_file_name(file_id)
            .unwrap_or_else(|| PathBuf::from(format!("<unregistered file {file_id}>")))
    }

    fn get_open_file(&self, file_id: FileId) -> Result<Arc<File>, FileError> {
        // 1. Fast path — read lock
        {
            let files = self.files.read().unwrap();
            if let Some(file) = files.get(&file_id) {
                return Ok(Arc::clone(file));
            }
        }

        // 2. Slow path — the file was registered but never opened through
        // this manager, so open it now and cache the handle.
        self.open_file(file_id)?;

        let files = self.files.read().unwrap();
        files
            .get(&file_id)
            .map(Arc::clone)
            .ok_or(FileError::NotRegistered(file_id))
    }

    #[inline]
    fn read_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
        #[cfg(unix)]
        {
            file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            file.seek_read(buf, offset)
        }
    }

    #[inline]
    fn write_at(file: &File, buf: &[u8], offset: u64) -> std::io::Result<usize> {
        #[cfg(unix)]
        {
            file.write_at(buf, offset)
        }

        #[cfg(windows)]
        {
            file.seek_write(buf, offset)
        }
    }

    fn ensure_parent_dir(path: &Path) -> Result<(), FileError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| FileError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}
