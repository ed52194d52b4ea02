//! Static primary hash table keyed by record id.
//!
//! Page 0 holds the bucket count and page `i + 1` is bucket `i`'s metadata
//! page: the first page of the bucket's chain, carrying the
//! `(record_count, record_size, tail_page)` triple in front of its record
//! area. Overflow pages are appended at the end of the file and become the
//! new chain tail; the metadata page's `tail_page` field always names the
//! page inserts and lookups go to.
//!
//! Both insert and lookup touch only the chain tail. After a bucket
//! overflows, records left on earlier chain pages are no longer reachable
//! through [`find_by_id`](HashTable::find_by_id); a heap file scan is the
//! exhaustive access path.
//!
//! A session handle keeps every bucket metadata page pinned, so opening a
//! table first checks the pool is large enough and fails with
//! [`TableError::PoolTooSmall`] before pinning anything.

use crate::errors::{TableError, TableResult};
use crate::record::{Record, RECORD_SIZE};
use buffer::pin::PagePin;
use buffer::pool::BufferPool;
use file::api::FileManager;
use page::layout::{BucketPageMut, BucketPageRef, TableHeaderMut, TableHeaderRef, BUCKET_RECORDS_START};
use page::page_id::{FileId, PageId};
use page::PAGE_SIZE;
use std::path::Path;

/// Frames an operation may pin on top of the per-bucket pins
/// (a transient chain page plus a freshly allocated overflow page).
pub const TRANSIENT_PINS: usize = 2;

/// Cached state for one bucket, owning the session-long pin on its metadata
/// page. `record_count` only tracks inserts seen through this handle plus
/// whatever the metadata page reported at open time; records that overflowed
/// to earlier chain pages in past sessions are not re-counted.
#[derive(Debug)]
struct Bucket {
    pin: PagePin,
    record_size: u32,
    record_count: u32,
    tail_page: u32,
    /// Chain pages seen by this session. Not persisted, so a reopened
    /// handle starts back at 1 regardless of past overflows.
    chain_length: u32,
}

/// Session handle over one primary hash table file.
#[derive(Debug)]
pub struct HashTable<'p, F: FileManager> {
    pool: &'p BufferPool<F>,
    file_id: FileId,
    bucket_count: u32,
    buckets: Vec<Bucket>,
}

impl<'p, F: FileManager> HashTable<'p, F> {
    /// Creates a new hash table file at `path` with `bucket_count` buckets,
    /// one pre-allocated metadata page per bucket, then closes it.
    pub fn create(
        pool: &BufferPool<F>,
        path: impl AsRef<Path>,
        bucket_count: u32,
    ) -> TableResult<()> {
        if bucket_count == 0 {
            return Err(TableError::ZeroBuckets);
        }

        let file_id = pool.create_file(&path)?;

        let header = pool.allocate_page(file_id)?;
        {
            let mut bytes = header.data_mut();
            let mut view = TableHeaderMut::new(&mut bytes[..])?;
            view.set_bucket_count(bucket_count)?;
        }
        header.mark_dirty();
        pool.unpin(header);

        // Each bucket starts as a one-page chain that is its own tail.
        for bucket in 0..bucket_count {
            let pin = pool.allocate_page(file_id)?;
            let page_number = pin.page_id().page_number;
            debug_assert_eq!(page_number, bucket + 1);
            {
                let mut bytes = pin.data_mut();
                let mut view = BucketPageMut::new(&mut bytes[..])?;
                view.init(RECORD_SIZE as u32, page_number)?;
            }
            pin.mark_dirty();
            pool.unpin(pin);
        }

        pool.close_file(file_id)?;
        tracing::info!(
            path = %path.as_ref().display(),
            bucket_count,
            "created hash table"
        );
        Ok(())
    }

    /// Opens an existing hash table and pins every bucket metadata page for
    /// the lifetime of the handle.
    pub fn open(pool: &'p BufferPool<F>, path: impl AsRef<Path>) -> TableResult<Self> {
        let file_id = pool.open_file(&path)?;

        let header_pin = pool.fetch_page(PageId::new(file_id, 0))?;
        let bucket_count = Self::read_bucket_count(&header_pin);
        pool.unpin(header_pin);
        let bucket_count = bucket_count?;

        let page_count = pool.page_count(file_id)?;
        if let Err(reason) = Self::validate_header(bucket_count, page_count) {
            pool.close_file(file_id)?;
            return Err(TableError::MalformedHeader { file_id, reason });
        }

        // Fail before pinning: a session that cannot hold all its bucket pins
        // plus working pages would deadlock against the pool mid-operation.
        let required = bucket_count as usize + TRANSIENT_PINS;
        if required > pool.capacity() {
            pool.close_file(file_id)?;
            return Err(TableError::PoolTooSmall {
                buckets: bucket_count as usize,
                required,
                capacity: pool.capacity(),
            });
        }

        let mut buckets: Vec<Bucket> = Vec::with_capacity(bucket_count as usize);
        for bucket in 0..bucket_count {
            let pin = match pool.fetch_page(PageId::new(file_id, bucket + 1)) {
                Ok(pin) => pin,
                Err(e) => {
                    Self::release(pool, buckets);
                    pool.close_file(file_id)?;
                    return Err(e.into());
                }
            };
            match Self::read_bucket(pin, page_count) {
                Ok(loaded) => buckets.push(loaded),
                Err(e) => {
                    Self::release(pool, buckets);
                    pool.close_file(file_id)?;
                    return Err(match e {
                        TableError::MalformedHeader { reason, .. } => {
                            TableError::MalformedHeader { file_id, reason }
                        }
                        other => other,
                    });
                }
            }
        }

        Ok(Self {
            pool,
            file_id,
            bucket_count,
            buckets,
        })
    }

    /// Releases every bucket pin and closes the backing file, consuming the
    /// handle.
    pub fn close(self) -> TableResult<()> {
        let Self {
            pool,
            file_id,
            buckets,
            ..
        } = self;
        Self::release(pool, buckets);
        pool.close_file(file_id)?;
        Ok(())
    }

    /// Inserts `record` at the tail of its bucket's chain, allocating a new
    /// tail page when the current one is full.
    ///
    /// # Returns
    /// The page number the record was placed in, usable as a locator by a
    /// secondary index.
    pub fn insert(&mut self, record: &Record) -> TableResult<u32> {
        let encoded = record.encode();
        let bucket_index = self.bucket_index(record.id);
        let tail_page = self.buckets[bucket_index].tail_page;

        let pin = self.pool.fetch_page(PageId::new(self.file_id, tail_page))?;
        let pushed = Self::try_push(&pin, &encoded);
        self.pool.unpin(pin);
        if pushed? {
            self.buckets[bucket_index].record_count += 1;
            tracing::debug!(id = record.id, bucket_index, tail_page, "inserted record");
            return Ok(tail_page);
        }

        // The tail is full. Append a new chain page that is its own tail and
        // point the bucket's metadata page at it.
        let pin = self.pool.allocate_page(self.file_id)?;
        let new_tail = pin.page_id().page_number;
        let initialized = Self::init_and_push(
            &pin,
            self.buckets[bucket_index].record_size,
            new_tail,
            &encoded,
        );
        self.pool.unpin(pin);
        initialized?;

        self.set_tail_page(bucket_index, new_tail)?;
        self.buckets[bucket_index].tail_page = new_tail;
        self.buckets[bucket_index].record_count += 1;
        self.buckets[bucket_index].chain_length += 1;
        tracing::debug!(
            id = record.id,
            bucket_index,
            old_tail = tail_page,
            new_tail,
            "bucket overflowed into new tail page"
        );
        Ok(new_tail)
    }

    /// Returns all records with the given id found on the tail page of the
    /// id's bucket. Records pushed off the tail by an overflow are not
    /// visited.
    pub fn find_by_id(&self, id: i32) -> TableResult<Vec<Record>> {
        let bucket_index = self.bucket_index(id);
        let tail_page = self.buckets[bucket_index].tail_page;

        let pin = self.pool.fetch_page(PageId::new(self.file_id, tail_page))?;
        let mut matches = Vec::new();
        let scanned = scan_chain_page(&pin, &mut matches, |record| record.id == id);
        self.pool.unpin(pin);
        scanned?;
        Ok(matches)
    }

    /// Number of buckets this table was created with.
    pub fn bucket_count(&self) -> u32 {
        self.bucket_count
    }

    /// Current chain tail page of bucket `bucket_index`.
    pub fn bucket_tail_page(&self, bucket_index: usize) -> u32 {
        self.buckets[bucket_index].tail_page
    }

    /// Records inserted into bucket `bucket_index`, as tracked by this
    /// session (see [`Bucket`]).
    pub fn bucket_record_count(&self, bucket_index: usize) -> u32 {
        self.buckets[bucket_index].record_count
    }

    /// Chain pages bucket `bucket_index` has grown during this session,
    /// including its metadata page.
    pub fn bucket_chain_length(&self, bucket_index: usize) -> u32 {
        self.buckets[bucket_index].chain_length
    }

    /// Bucket an id hashes to.
    pub fn bucket_index(&self, id: i32) -> usize {
        id.rem_euclid(self.bucket_count as i32) as usize
    }

    pub(crate) fn pool(&self) -> &'p BufferPool<F> {
        self.pool
    }

    pub(crate) fn file_id(&self) -> FileId {
        self.file_id
    }

    fn read_bucket_count(pin: &PagePin) -> TableResult<u32> {
        let bytes = pin.data();
        let view = TableHeaderRef::new(&bytes[..])?;
        Ok(view.get_bucket_count()?)
    }

    fn validate_header(bucket_count: u32, page_count: u32) -> Result<(), String> {
        if bucket_count == 0 {
            return Err("bucket count is zero".to_string());
        }
        if page_count < bucket_count + 1 {
            return Err(format!(
                "file has {page_count} pages, too few for {bucket_count} buckets"
            ));
        }
        Ok(())
    }

    /// Loads one bucket's cached state from its pinned metadata page,
    /// validating the stored triple. Consumes the pin on failure paths too;
    /// the caller releases it via the returned [`Bucket`] on success.
    fn read_bucket(pin: PagePin, page_count: u32) -> TableResult<Bucket> {
        let (record_count, record_size, tail_page) = {
            let bytes = pin.data();
            let view = BucketPageRef::new(&bytes[..])?;
            (
                view.get_record_count()?,
                view.get_record_size()?,
                view.get_tail_page()?,
            )
        };

        let file_id = pin.page_id().file_id;
        if record_size == 0 || record_size as usize > PAGE_SIZE - BUCKET_RECORDS_START {
            return Err(TableError::MalformedHeader {
                file_id,
                reason: format!("bucket record size {record_size} does not fit a chain page"),
            });
        }
        if tail_page == 0 || tail_page >= page_count {
            return Err(TableError::MalformedHeader {
                file_id,
                reason: format!("bucket tail page {tail_page} is outside the file"),
            });
        }

        Ok(Bucket {
            pin,
            record_size,
            record_count,
            tail_page,
            chain_length: 1,
        })
    }

    fn release(pool: &BufferPool<F>, buckets: Vec<Bucket>) {
        for bucket in buckets {
            pool.unpin(bucket.pin);
        }
    }

    /// Appends `encoded` to the pinned chain page if it has room.
    fn try_push(pin: &PagePin, encoded: &[u8]) -> TableResult<bool> {
        let mut bytes = pin.data_mut();
        let mut view = BucketPageMut::new(&mut bytes[..])?;
        if !view.has_space(encoded.len())? {
            return Ok(false);
        }
        view.push_record(encoded)?;
        pin.mark_dirty();
        Ok(true)
    }

    /// Initializes a freshly allocated chain page as its own tail and places
    /// the overflowing record in it.
    fn init_and_push(
        pin: &PagePin,
        record_size: u32,
        page_number: u32,
        encoded: &[u8],
    ) -> TableResult<()> {
        let mut bytes = pin.data_mut();
        let mut view = BucketPageMut::new(&mut bytes[..])?;
        view.init(record_size, page_number)?;
        view.push_record(encoded)?;
        pin.mark_dirty();
        Ok(())
    }

    /// Writes the new tail into the bucket's own metadata page, through the
    /// pin this handle already holds.
    fn set_tail_page(&mut self, bucket_index: usize, new_tail: u32) -> TableResult<()> {
        let bucket = &self.buckets[bucket_index];
        {
            let mut bytes = bucket.pin.data_mut();
            let mut view = BucketPageMut::new(&mut bytes[..])?;
            view.set_tail_page(new_tail)?;
        }
        bucket.pin.mark_dirty();
        Ok(())
    }
}

/// Scans one chain page and pushes every decoded record matching `keep`.
/// Shared with the secondary index, which scans chain pages it reaches
/// through its own locators.
pub(crate) fn scan_chain_page(
    pin: &PagePin,
    matches: &mut Vec<Record>,
    keep: impl Fn(&Record) -> bool,
) -> TableResult<()> {
    let bytes = pin.data();
    let view = BucketPageRef::new(&bytes[..])?;
    let count = view.get_record_count()? as usize;
    for index in 0..count {
        let record = Record::decode(view.record(index, RECORD_SIZE)?)?;
        if keep(&record) {
            matches.push(record);
        }
    }
    Ok(())
}

// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
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

    fn chain_page_capacity() -> i32 {
        max_records_per_page(RECORD_SIZE, BUCKET_RECORDS_START) as i32
    }

    #[test]
    fn create_rejects_zero_buckets() {
        let pool = create_pool(8);
        let result = HashTable::create(&pool, "zero.db", 0);
        assert!(matches!(result.unwrap_err(), TableError::ZeroBuckets));
    }

    #[test]
    fn create_lays_out_one_metadata_page_per_bucket() {
        let pool = create_pool(8);
        HashTable::create(&pool, "layout.db", 4).unwrap();

        let table = HashTable::open(&pool, "layout.db").unwrap();
        assert_eq!(table.bucket_count(), 4);
        for bucket in 0..4usize {
            assert_eq!(table.bucket_tail_page(bucket), bucket as u32 + 1);
            assert_eq!(table.bucket_record_count(bucket), 0);
        }
        table.close().unwrap();
    }

    #[test]
    fn ids_with_the_same_residue_share_a_bucket() {
        let pool = create_pool(8);
        HashTable::create(&pool, "residue.db", 4).unwrap();
        let mut table = HashTable::open(&pool, "residue.db").unwrap();

        for id in [1, 5, 9] {
            // All three land on bucket 1's metadata page.
            assert_eq!(table.insert(&sample(id)).unwrap(), 2);
        }

        assert_eq!(table.bucket_record_count(1), 3);
        assert_eq!(table.bucket_record_count(0), 0);

        let found = table.find_by_id(5).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], sample(5));
        table.close().unwrap();
    }

    #[test]
    fn negative_ids_hash_to_a_valid_bucket() {
        let pool = create_pool(8);
        HashTable::create(&pool, "neg.db", 4).unwrap();
        let mut table = HashTable::open(&pool, "neg.db").unwrap();

        let locator = table.insert(&sample(-3)).unwrap();
        assert_eq!(table.bucket_index(-3), 1);
        assert_eq!(locator, 2);
        assert_eq!(table.find_by_id(-3).unwrap().len(), 1);
        table.close().unwrap();
    }

    #[test]
    fn lookup_of_a_missing_id_returns_empty_not_error() {
        let pool = create_pool(8);
        HashTable::create(&pool, "miss.db", 4).unwrap();
        let table = HashTable::open(&pool, "miss.db").unwrap();

        assert!(table.find_by_id(123).unwrap().is_empty());
        table.close().unwrap();
    }

    #[test]
    fn overflow_appends_a_tail_page_and_redirects_the_bucket() {
        let pool = create_pool(8);
        HashTable::create(&pool, "overflow.db", 4).unwrap();
        let mut table = HashTable::open(&pool, "overflow.db").unwrap();

        let capacity = chain_page_capacity();
        // ids 0, 4, 8, ... all hash to bucket 0 (metadata page 1).
        for i in 0..capacity {
            assert_eq!(table.insert(&sample(i * 4)).unwrap(), 1);
        }

        // The next record does not fit page 1; pages 0..=4 exist, so the new
        // tail is page 5.
        let overflow_id = capacity * 4;
        assert_eq!(table.insert(&sample(overflow_id)).unwrap(), 5);
        assert_eq!(table.bucket_tail_page(0), 5);
        assert_eq!(table.bucket_chain_length(0), 2);
        assert_eq!(table.bucket_chain_length(1), 1);

        // Lookups now only see the new tail.
        assert_eq!(table.find_by_id(overflow_id).unwrap().len(), 1);
        assert!(table.find_by_id(0).unwrap().is_empty());
        table.close().unwrap();
    }

    #[test]
    fn overflow_leaves_other_buckets_untouched() {
        let pool = create_pool(8);
        HashTable::create(&pool, "isolated.db", 4).unwrap();
        let mut table = HashTable::open(&pool, "isolated.db").unwrap();

        table.insert(&sample(3)).unwrap();

        for i in 0..=chain_page_capacity() {
            table.insert(&sample(i * 4)).unwrap();
        }

        // Bucket 0 overflowed; bucket 3 must still point at its original
        // tail and keep its record reachable.
        assert_eq!(table.bucket_tail_page(3), 4);
        assert_eq!(table.find_by_id(3).unwrap().len(), 1);
        table.close().unwrap();
    }

    #[test]
    fn tail_redirect_survives_close_and_reopen() {
        let pool = create_pool(8);
        HashTable::create(&pool, "persist.db", 4).unwrap();

        let mut table = HashTable::open(&pool, "persist.db").unwrap();
        let capacity = chain_page_capacity();
        for i in 0..=capacity {
            table.insert(&sample(i * 4)).unwrap();
        }
        let overflow_id = capacity * 4;
        table.close().unwrap();

        let reopened = HashTable::open(&pool, "persist.db").unwrap();
        assert_eq!(reopened.bucket_count(), 4);
        assert_eq!(reopened.bucket_tail_page(0), 5);
        assert_eq!(reopened.find_by_id(overflow_id).unwrap().len(), 1);
        reopened.close().unwrap();
    }

    #[test]
    fn opening_a_table_larger_than_the_pool_fails_fast() {
        let pool = create_pool(4);
        HashTable::create(&pool, "big.db", 4).unwrap();

        let result = HashTable::open(&pool, "big.db");
        assert!(matches!(
            result.unwrap_err(),
            TableError::PoolTooSmall {
                buckets: 4,
                required: 6,
                capacity: 4,
            }
        ));

        // The failed open must leave the pool usable.
        HashTable::create(&pool, "small.db", 2).unwrap();
        let table = HashTable::open(&pool, "small.db").unwrap();
        table.close().unwrap();
    }
}
