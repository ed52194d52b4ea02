use crate::config::EngineConfig;
use buffer::pool::BufferPool;
use file::api::FileManager;
use file::disk_file_manager::DiskFileManager;
use file::file_catalog::FileCatalog;
use std::sync::Arc;

/// Owner of the singleton-like instances that are needed for the entire
/// lifetime of the process.
#[derive(Debug)]
pub struct EngineEnvironment {
    pub file_catalog: Arc<FileCatalog>,
    pub file_manager: Arc<DiskFileManager>,
    pub pool: Arc<BufferPool<DiskFileManager>>,
    pub engine_config: EngineConfig,
}

impl EngineEnvironment {
    pub fn new(config: EngineConfig) -> Self {
        let file_catalog = Arc::new(FileCatalog::new());
        let file_manager = Arc::new(DiskFileManager::new(file_catalog.clone()));
        let pool = Arc::new(BufferPool::new(
            file_manager.clone(),
            file_catalog.clone(),
            config.storage.buffer_pages.get(),
        ));
        Self {
            file_catalog,
            file_manager,
            pool,
            engine_config: config,
        }
    }
}
