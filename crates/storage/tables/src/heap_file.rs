//! Unordered heap file.
//!
//! Page 0 holds the `(record_size, record_count, page_count)` header and
//! every later page is a plain data page. Inserts are first-fit: the data
//! pages are scanned in order and the record lands in the first page with
//! room, a new page is appended only when every existing page is full.
//! `page_count` counts data pages only, so a freshly created file reports 1.

use crate::errors::{TableError, TableResult};
use crate::record::{Record, RECORD_SIZE};
use buffer::pin::PagePin;
use buffer::pool::BufferPool;
use file::api::FileManager;
use page::layout::{DataPageMut, DataPageRef, HeapHeaderMut, HeapHeaderRef, DATA_RECORDS_START};
use page::page_id::{FileId, PageId};
use page::PAGE_SIZE;
use std::path::Path;

/// Session handle over one heap file. Holds no pins between calls; header
/// counters are cached and written through on every insert.
#[derive(Debug)]
pub struct HeapFile<'p, F: FileManager> {
    pool: &'p BufferPool<F>,
    file_id: FileId,
    record_size: usize,
    record_count: u32,
    page_count: u32,
}

impl<'p, F: FileManager> HeapFile<'p, F> {
    /// Creates a new heap file at `path` with its header page and one empty
    /// data page, then closes it. Fails if the file already exists.
    pub fn create(pool: &BufferPool<F>, path: impl AsRef<Path>) -> TableResult<()> {
        let file_id = pool.create_file(&path)?;

        let header = pool.allocate_page(file_id)?;
        {
            let mut bytes = header.data_mut();
            let mut view = HeapHeaderMut::new(&mut bytes[..])?;
            view.set_record_size(RECORD_SIZE as u32)?;
            view.set_record_count(0)?;
            view.set_page_count(1)?;
        }
        header.mark_dirty();
        pool.unpin(header);

        // An empty heap still owns one data page, so insert never has to
        // special-case a file without a data page.
        let first_data = pool.allocate_page(file_id)?;
        pool.unpin(first_data);

        pool.close_file(file_id)?;
        tracing::info!(path = %path.as_ref().display(), "created heap file");
        Ok(())
    }

    /// Opens an existing heap file and validates its header.
    pub fn open(pool: &'p BufferPool<F>, path: impl AsRef<Path>) -> TableResult<Self> {
        let file_id = pool.open_file(&path)?;

        let pin = pool.fetch_page(PageId::new(file_id, 0))?;
        let header = Self::read_header(&pin);
        pool.unpin(pin);
        let (record_size, record_count, page_count) = header?;

        if let Err(reason) = Self::validate_header(record_size, page_count) {
            pool.close_file(file_id)?;
            return Err(TableError::MalformedHeader { file_id, reason });
        }

        Ok(Self {
            pool,
            file_id,
            record_size: record_size as usize,
            record_count,
            page_count,
        })
    }

    /// Flushes and closes the backing file, consuming the handle.
    pub fn close(self) -> TableResult<()> {
        self.pool.close_file(self.file_id)?;
        Ok(())
    }

    /// Inserts `record`, first-fit over the existing data pages.
    ///
    /// # Returns
    /// The page number the record was placed in.
    pub fn insert(&mut self, record: &Record) -> TableResult<u32> {
        let encoded = record.encode();

        for page_number in 1..=self.page_count {
            let pin = self.pool.fetch_page(PageId::new(self.file_id, page_number))?;
            let pushed = Self::try_push(&pin, &encoded);
            self.pool.unpin(pin);
            if pushed? {
                self.record_count += 1;
                self.write_header()?;
                tracing::debug!(id = record.id, page_number, "inserted record");
                return Ok(page_number);
            }
        }

        // Every data page is full; append a fresh one. The push is
        // unconditional here: open guarantees at least one record fits a
        // page, and a violation surfaces as a layout error before any
        // counter moves.
        let pin = self.pool.allocate_page(self.file_id)?;
        let page_number = pin.page_id().page_number;
        let pushed = Self::push(&pin, &encoded);
        self.pool.unpin(pin);
        pushed?;

        self.page_count += 1;
        self.record_count += 1;
        self.write_header()?;
        tracing::debug!(id = record.id, page_number, "inserted record into new page");
        Ok(page_number)
    }

    /// Scans every data page and returns all records whose id matches.
    /// Duplicate ids are allowed, so the result can hold more than one entry.
    pub fn find_by_id(&self, id: i32) -> TableResult<Vec<Record>> {
        let mut matches = Vec::new();
        for page_number in 1..=self.page_count {
            let pin = self.pool.fetch_page(PageId::new(self.file_id, page_number))?;
            let scanned = self.collect_matches(&pin, id, &mut matches);
            self.pool.unpin(pin);
            scanned?;
        }
        Ok(matches)
    }

    /// Number of records currently stored.
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// Number of data pages (the header page is not counted).
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Fixed record width this file was created with.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    fn read_header(pin: &PagePin) -> TableResult<(u32, u32, u32)> {
        let bytes = pin.data();
        let view = HeapHeaderRef::new(&bytes[..])?;
        Ok((
            view.get_record_size()?,
            view.get_record_count()?,
            view.get_page_count()?,
        ))
    }

    fn validate_header(record_size: u32, page_count: u32) -> Result<(), String> {
        if record_size == 0 || record_size as usize > PAGE_SIZE - DATA_RECORDS_START {
            return Err(format!("record size {record_size} does not fit a data page"));
        }
        if page_count == 0 {
            return Err("page count is zero".to_string());
        }
        Ok(())
    }

    /// Appends `encoded` to the pinned data page if it has room.
    fn try_push(pin: &PagePin, encoded: &[u8]) -> TableResult<bool> {
        let mut bytes = pin.data_mut();
        let mut view = DataPageMut::new(&mut bytes[..])?;
        if !view.has_space(encoded.len())? {
            return Ok(false);
        }
        view.push_record(encoded)?;
        pin.mark_dirty();
        Ok(true)
    }

    /// Appends `encoded` to the pinned data page, rejecting a full page with
    /// [`page::errors::LayoutError::PageFull`].
    fn push(pin: &PagePin, encoded: &[u8]) -> TableResult<()> {
        let mut bytes = pin.data_mut();
        let mut view = DataPageMut::new(&mut bytes[..])?;
        view.push_record(encoded)?;
        pin.mark_dirty();
        Ok(())
    }

    fn collect_matches(
        &self,
        pin: &PagePin,
        id: i32,
        matches: &mut Vec<Record>,
    ) -> TableResult<()> {
        let bytes = pin.data();
        let view = DataPageRef::new(&bytes[..])?;
        let count = view.get_record_count()? as usize;
        for index in 0..count {
            let record = Record::decode(view.record(index, self.record_size)?)?;
            if record.id == id {
                matches.push(record);
            }
        }
        Ok(())
    }

    /// Writes the cached counters back into the header page.
    fn write_header(&self) -> TableResult<()> {
        let pin = self.pool.fetch_page(PageId::new(self.file_id, 0))?;
        {
            let mut bytes = pin.data_mut();
            let mut view = HeapHeaderMut::new(&mut bytes[..])?;
            view.set_record_count(self.record_count)?;
            view.set_page_count(self.page_count)?;
        }
        pin.mark_dirty();
        self.pool.unpin(pin);
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use buffer::errors::BufferError;
    use file::errors::FileError;
    use file::file_catalog::FileCatalog;
    use file::in_memory_file_manager::InMemoryFileManager;
    use page::layout::max_records_per_page;
    use std::sync::Arc;

    fn create_pool(of_size: usize) -> BufferPool<InMemoryFileManager> {
        let catalog = Arc::new(FileCatalog::new());
        let fm = Arc::new(InMemoryFileManager::new(catalog.clone()));
        BufferPool::new(fm, catalog, of_size)
    }

    fn sample(id: i32) -> Record {
        Record::new(id, format!("name{id}"), "surname", "address", "city")
    }

    #[test]
    fn create_then_open_reads_back_the_header() {
        let pool = create_pool(4);
        HeapFile::create(&pool, "heap.db").unwrap();

        let heap = HeapFile::open(&pool, "heap.db").unwrap();
        assert_eq!(heap.record_size(), RECORD_SIZE);
        assert_eq!(heap.record_count(), 0);
        assert_eq!(heap.page_count(), 1);
        heap.close().unwrap();
    }

    #[test]
    fn create_refuses_to_overwrite_an_existing_file() {
        let pool = create_pool(4);
        HeapFile::create(&pool, "dup.db").unwrap();

        let result = HeapFile::create(&pool, "dup.db");
        assert!(matches!(
            result.unwrap_err(),
            TableError::Buffer(BufferError::File(FileError::AlreadyExists { .. }))
        ));
    }

    #[test]
    fn inserted_records_are_all_found_by_id() {
        let pool = create_pool(4);
        HeapFile::create(&pool, "scan.db").unwrap();
        let mut heap = HeapFile::open(&pool, "scan.db").unwrap();

        heap.insert(&sample(1)).unwrap();
        heap.insert(&sample(2)).unwrap();
        heap.insert(&sample(1)).unwrap();

        let ones = heap.find_by_id(1).unwrap();
        assert_eq!(ones.len(), 2);
        assert!(ones.iter().all(|r| r.id == 1));
        assert_eq!(heap.find_by_id(2).unwrap().len(), 1);
        assert_eq!(heap.record_count(), 3);
        heap.close().unwrap();
    }

    #[test]
    fn lookup_of_a_missing_id_returns_empty_not_error() {
        let pool = create_pool(4);
        HeapFile::create(&pool, "miss.db").unwrap();
        let heap = HeapFile::open(&pool, "miss.db").unwrap();

        assert!(heap.find_by_id(99).unwrap().is_empty());
        heap.close().unwrap();
    }

    #[test]
    fn header_counters_survive_close_and_reopen() {
        let pool = create_pool(4);
        HeapFile::create(&pool, "reopen.db").unwrap();

        let mut heap = HeapFile::open(&pool, "reopen.db").unwrap();
        for id in 0..3 {
            heap.insert(&sample(id)).unwrap();
        }
        heap.close().unwrap();

        let reopened = HeapFile::open(&pool, "reopen.db").unwrap();
        assert_eq!(reopened.record_size(), RECORD_SIZE);
        assert_eq!(reopened.record_count(), 3);
        assert_eq!(reopened.page_count(), 1);
        assert_eq!(reopened.find_by_id(2).unwrap().len(), 1);
        reopened.close().unwrap();
    }

    #[test]
    fn a_full_data_page_forces_a_new_page_without_losing_records() {
        let pool = create_pool(4);
        HeapFile::create(&pool, "grow.db").unwrap();
        let mut heap = HeapFile::open(&pool, "grow.db").unwrap();

        let per_page = max_records_per_page(RECORD_SIZE, DATA_RECORDS_START) as i32;
        for id in 0..per_page {
            assert_eq!(heap.insert(&sample(id)).unwrap(), 1);
        }
        assert_eq!(heap.page_count(), 1);

        // The next insert does not fit page 1 anymore.
        assert_eq!(heap.insert(&sample(per_page)).unwrap(), 2);
        assert_eq!(heap.page_count(), 2);
        assert_eq!(heap.record_count() as i32, per_page + 1);

        for id in 0..=per_page {
            assert_eq!(heap.find_by_id(id).unwrap().len(), 1);
        }
        heap.close().unwrap();
    }

    #[test]
    fn open_rejects_a_header_whose_record_size_exceeds_a_page() {
        let pool = create_pool(4);

        // Hand-craft a heap file whose header claims a record wider than a
        // data page can hold.
        let file_id = pool.create_file("bad.db").unwrap();
        let header = pool.allocate_page(file_id).unwrap();
        {
            let mut bytes = header.data_mut();
            let mut view = HeapHeaderMut::new(&mut bytes[..]).unwrap();
            view.set_record_size(PAGE_SIZE as u32).unwrap();
            view.set_record_count(0).unwrap();
            view.set_page_count(1).unwrap();
        }
        header.mark_dirty();
        pool.unpin(header);
        let data = pool.allocate_page(file_id).unwrap();
        pool.unpin(data);
        pool.close_file(file_id).unwrap();

        let result = HeapFile::open(&pool, "bad.db");
        assert!(matches!(
            result.unwrap_err(),
            TableError::MalformedHeader { .. }
        ));
    }

    #[test]
    fn first_fit_reuses_the_earliest_page_with_room() {
        let pool = create_pool(4);
        HeapFile::create(&pool, "fit.db").unwrap();
        let mut heap = HeapFile::open(&pool, "fit.db").unwrap();

        let per_page = max_records_per_page(RECORD_SIZE, DATA_RECORDS_START) as i32;
        // Fill page 1 and start page 2.
        for id in 0..=per_page {
            heap.insert(&sample(id)).unwrap();
        }
        // Page 1 is full, page 2 has room, so the next record lands there.
        assert_eq!(heap.insert(&sample(100)).unwrap(), 2);
        heap.close().unwrap();
    }
}
