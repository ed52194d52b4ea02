//! Static secondary hash index keyed by record name.
//!
//! The index maps a name to the primary hash table page the record was last
//! inserted into. Page 0 of the backing file persists only the bucket
//! count; the slot array itself lives in memory and is rebuilt by re-running
//! inserts, so a freshly opened index starts empty.
//!
//! Each slot holds at most one entry and a later insert overwrites it, both
//! for repeated inserts of the same name and for different names hashing to
//! the same slot. A lookup therefore yields the records of the *last*
//! recorded page for that slot; entries displaced by a colliding name are no
//! longer reachable through the index.

use crate::errors::{TableError, TableResult};
use crate::hash_table::{scan_chain_page, HashTable};
use crate::record::Record;
use buffer::pin::PagePin;
use buffer::pool::BufferPool;
use file::api::FileManager;
use page::layout::{TableHeaderMut, TableHeaderRef};
use page::page_id::{FileId, PageId};
use std::path::Path;

/// One occupied slot: the name that was last written and the primary-table
/// page its record went to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    pub name: String,
    pub page_number: u32,
}

/// Session handle over one secondary index file.
#[derive(Debug)]
pub struct SecondaryIndex<'p, F: FileManager> {
    pool: &'p BufferPool<F>,
    file_id: FileId,
    bucket_count: u32,
    slots: Vec<Option<SlotEntry>>,
}

impl<'p, F: FileManager> SecondaryIndex<'p, F> {
    /// Creates a new secondary index file at `path` with `bucket_count`
    /// slots, then closes it.
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

        pool.close_file(file_id)?;
        tracing::info!(
            path = %path.as_ref().display(),
            bucket_count,
            "created secondary index"
        );
        Ok(())
    }

    /// Opens an existing secondary index with an empty slot array.
    pub fn open(pool: &'p BufferPool<F>, path: impl AsRef<Path>) -> TableResult<Self> {
        let file_id = pool.open_file(&path)?;

        let pin = pool.fetch_page(PageId::new(file_id, 0))?;
        let bucket_count = Self::read_bucket_count(&pin);
        pool.unpin(pin);
        let bucket_count = bucket_count?;

        if bucket_count == 0 {
            pool.close_file(file_id)?;
            return Err(TableError::MalformedHeader {
                file_id,
                reason: "bucket count is zero".to_string(),
            });
        }

        Ok(Self {
            pool,
            file_id,
            bucket_count,
            slots: vec![None; bucket_count as usize],
        })
    }

    /// Closes the backing file, consuming the handle. The slot array is
    /// discarded.
    pub fn close(self) -> TableResult<()> {
        self.pool.close_file(self.file_id)?;
        Ok(())
    }

    /// Records that `record` was placed in primary-table page `page_number`,
    /// overwriting whatever the slot held before.
    pub fn insert_entry(&mut self, record: &Record, page_number: u32) {
        let slot = self.slot_index(&record.name);
        if let Some(displaced) = &self.slots[slot] {
            if displaced.name != record.name {
                tracing::debug!(
                    slot,
                    displaced = %displaced.name,
                    name = %record.name,
                    "slot collision, earlier entry displaced"
                );
            }
        }
        self.slots[slot] = Some(SlotEntry {
            name: record.name.clone(),
            page_number,
        });
    }

    /// The primary-table page the slot for `name` currently points at, if
    /// the slot is occupied. The entry may have been written by a colliding
    /// name; callers filter by textual match when scanning the page.
    pub fn candidate_page(&self, name: &str) -> Option<u32> {
        self.slots[self.slot_index(name)]
            .as_ref()
            .map(|entry| entry.page_number)
    }

    /// Looks up records named `name` through the primary table.
    ///
    /// The slot narrows the search to one candidate page; only buckets whose
    /// current tail is that page are scanned, so a locator left stale by a
    /// bucket overflow yields an empty result even though the page still
    /// holds the record. Every textual match is resolved through
    /// [`HashTable::find_by_id`], which surfaces all same-id records on the
    /// tail.
    pub fn find_by_name(&self, primary: &HashTable<'p, F>, name: &str) -> TableResult<Vec<Record>> {
        let Some(candidate) = self.candidate_page(name) else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for bucket in 0..primary.bucket_count() as usize {
            if primary.bucket_tail_page(bucket) != candidate {
                continue;
            }

            let pin = primary
                .pool()
                .fetch_page(PageId::new(primary.file_id(), candidate))?;
            let mut named = Vec::new();
            let scanned = scan_chain_page(&pin, &mut named, |record| record.name == name);
            primary.pool().unpin(pin);
            scanned?;

            for record in named {
                results.extend(primary.find_by_id(record.id)?);
            }
        }
        Ok(results)
    }

    /// Number of slots this index was created with.
    pub fn bucket_count(&self) -> u32 {
        self.bucket_count
    }

    fn read_bucket_count(pin: &PagePin) -> TableResult<u32> {
        let bytes = pin.data();
        let view = TableHeaderRef::new(&bytes[..])?;
        Ok(view.get_bucket_count()?)
    }

    /// djb2 over the name bytes, reduced to a slot.
    fn slot_index(&self, name: &str) -> usize {
        let mut hash: u32 = 5381;
        for byte in name.bytes() {
            hash = hash.wrapping_mul(33).wrapping_add(u32::from(byte));
        }
        (hash % self.bucket_count) as usize
    }
}

// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use file::file_catalog::FileCatalog;
    use file::in_memory_file_manager::InMemoryFileManager;
    use std::sync::Arc;

    fn create_pool(of_size: usize) -> BufferPool<InMemoryFileManager> {
        let catalog = Arc::new(FileCatalog::new());
        let fm = Arc::new(InMemoryFileManager::new(catalog.clone()));
        BufferPool::new(fm, catalog, of_size)
    }

    fn named(id: i32, name: &str) -> Record {
        Record::new(id, name, "surname", "address", "city")
    }

    /// Finds a generated name that shares `index`'s slot with `first` but is
    /// a different string.
    fn colliding_name(index: &SecondaryIndex<'_, InMemoryFileManager>, first: &str) -> String {
        let target = index.slot_index(first);
        (0..)
            .map(|i| format!("gen{i}"))
            .find(|candidate| candidate != first && index.slot_index(candidate) == target)
            .unwrap()
    }

    #[test]
    fn create_rejects_zero_buckets() {
        let pool = create_pool(8);
        let result = SecondaryIndex::create(&pool, "zero.sidx", 0);
        assert!(matches!(result.unwrap_err(), TableError::ZeroBuckets));
    }

    #[test]
    fn insert_entry_then_candidate_page_roundtrips() {
        let pool = create_pool(8);
        SecondaryIndex::create(&pool, "basic.sidx", 8).unwrap();
        let mut index = SecondaryIndex::open(&pool, "basic.sidx").unwrap();

        assert_eq!(index.candidate_page("alice"), None);
        index.insert_entry(&named(1, "alice"), 3);
        assert_eq!(index.candidate_page("alice"), Some(3));

        // Re-inserting the same name overwrites the locator.
        index.insert_entry(&named(2, "alice"), 7);
        assert_eq!(index.candidate_page("alice"), Some(7));
        index.close().unwrap();
    }

    #[test]
    fn colliding_name_displaces_the_earlier_entry() {
        let pool = create_pool(8);
        SecondaryIndex::create(&pool, "collide.sidx", 4).unwrap();
        let mut index = SecondaryIndex::open(&pool, "collide.sidx").unwrap();

        let first = "alice";
        let second = colliding_name(&index, first);

        index.insert_entry(&named(1, first), 2);
        index.insert_entry(&named(2, &second), 5);

        // One slot, last write wins: both names now resolve to page 5.
        assert_eq!(index.candidate_page(first), Some(5));
        assert_eq!(index.candidate_page(&second), Some(5));
        index.close().unwrap();
    }

    #[test]
    fn slot_array_is_not_persisted_across_sessions() {
        let pool = create_pool(8);
        SecondaryIndex::create(&pool, "volatile.sidx", 4).unwrap();

        let mut index = SecondaryIndex::open(&pool, "volatile.sidx").unwrap();
        index.insert_entry(&named(1, "alice"), 2);
        index.close().unwrap();

        let reopened = SecondaryIndex::open(&pool, "volatile.sidx").unwrap();
        assert_eq!(reopened.bucket_count(), 4);
        assert_eq!(reopened.candidate_page("alice"), None);
        reopened.close().unwrap();
    }

    #[test]
    fn find_by_name_returns_records_from_the_primary_table() {
        let pool = create_pool(12);
        HashTable::create(&pool, "primary.db", 4).unwrap();
        SecondaryIndex::create(&pool, "names.sidx", 8).unwrap();

        let mut table = HashTable::open(&pool, "primary.db").unwrap();
        let mut index = SecondaryIndex::open(&pool, "names.sidx").unwrap();

        for (id, name) in [(1, "alice"), (2, "bob"), (5, "carol")] {
            let page_number = table.insert(&named(id, name)).unwrap();
            index.insert_entry(&named(id, name), page_number);
        }

        let found = index.find_by_name(&table, "bob").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], named(2, "bob"));

        assert!(index.find_by_name(&table, "nobody").unwrap().is_empty());

        index.close().unwrap();
        table.close().unwrap();
    }

    #[test]
    fn displaced_entry_is_no_longer_reachable_through_the_index() {
        let pool = create_pool(12);
        HashTable::create(&pool, "primary2.db", 4).unwrap();
        SecondaryIndex::create(&pool, "names2.sidx", 4).unwrap();

        let mut table = HashTable::open(&pool, "primary2.db").unwrap();
        let mut index = SecondaryIndex::open(&pool, "names2.sidx").unwrap();

        let first = "alice";
        let second = colliding_name(&index, first);

        // ids 1 and 2 land in different primary buckets, so the two names
        // live on different pages.
        let first_page = table.insert(&named(1, first)).unwrap();
        index.insert_entry(&named(1, first), first_page);
        let second_page = table.insert(&named(2, &second)).unwrap();
        index.insert_entry(&named(2, &second), second_page);
        assert_ne!(first_page, second_page);

        // The slot now points at the second name's page; a lookup for the
        // first name scans that page, finds no textual match and comes back
        // empty. The record itself is still in the primary table.
        assert!(index.find_by_name(&table, first).unwrap().is_empty());
        assert_eq!(table.find_by_id(1).unwrap().len(), 1);

        index.close().unwrap();
        table.close().unwrap();
    }

    #[test]
    fn locator_left_stale_by_an_overflow_yields_an_empty_result() {
        let pool = create_pool(12);
        HashTable::create(&pool, "stale.db", 4).unwrap();
        SecondaryIndex::create(&pool, "stale.sidx", 4).unwrap();

        let mut table = HashTable::open(&pool, "stale.db").unwrap();
        let mut index = SecondaryIndex::open(&pool, "stale.sidx").unwrap();

        let page = table.insert(&named(1, "alice")).unwrap();
        index.insert_entry(&named(1, "alice"), page);

        // Overflow bucket 1 so its tail moves off the locator page.
        let capacity = page::layout::max_records_per_page(
            crate::record::RECORD_SIZE,
            page::layout::BUCKET_RECORDS_START,
        ) as i32;
        for i in 1..=capacity {
            table.insert(&named(1 + i * 4, "filler")).unwrap();
        }
        assert_ne!(table.bucket_tail_page(1), page);

        // The slot still points at the old page, which no bucket has as its
        // tail anymore, so the lookup comes back empty.
        assert_eq!(index.candidate_page("alice"), Some(page));
        assert!(index.find_by_name(&table, "alice").unwrap().is_empty());

        index.close().unwrap();
        table.close().unwrap();
    }

    #[test]
    fn colliding_names_on_the_same_page_are_both_found() {
        let pool = create_pool(12);
        HashTable::create(&pool, "primary3.db", 4).unwrap();
        SecondaryIndex::create(&pool, "names3.sidx", 4).unwrap();

        let mut table = HashTable::open(&pool, "primary3.db").unwrap();
        let mut index = SecondaryIndex::open(&pool, "names3.sidx").unwrap();

        let first = "alice";
        let second = colliding_name(&index, first);

        // Same primary bucket (ids share a residue), same page, one slot.
        let first_page = table.insert(&named(1, first)).unwrap();
        index.insert_entry(&named(1, first), first_page);
        let second_page = table.insert(&named(5, &second)).unwrap();
        index.insert_entry(&named(5, &second), second_page);
        assert_eq!(first_page, second_page);

        // The overwrite is harmless here: both names scan the shared page.
        assert_eq!(index.find_by_name(&table, first).unwrap().len(), 1);
        assert_eq!(index.find_by_name(&table, &second).unwrap().len(), 1);

        index.close().unwrap();
        table.close().unwrap();
    }
}
