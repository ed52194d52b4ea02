//! # recdb
//!
//! Entry point for the **recdb** record storage engine. The binary wires the
//! disk file manager and the buffer pool together, then runs a small driver
//! against the three record stores: the heap file, the primary hash table
//! and the secondary name index.
//!
//! An optional first argument names a TOML config file; without one the
//! built-in defaults are used.

use crate::config::EngineConfig;
use crate::engine_environment::EngineEnvironment;
use std::error::Error;
use tables::hash_table::HashTable;
use tables::heap_file::HeapFile;
use tables::record::Record;
use tables::secondary_index::SecondaryIndex;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

mod config;
mod engine_environment;

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };
    std::fs::create_dir_all(&config.storage.data_dir)?;

    let environment = EngineEnvironment::new(config);
    run_driver(&environment)?;

    tracing::info!("done");
    Ok(())
}

fn run_driver(environment: &EngineEnvironment) -> Result<(), Box<dyn Error>> {
    let data_dir = &environment.engine_config.storage.data_dir;
    let heap_path = data_dir.join("records.heap");
    let table_path = data_dir.join("records.ht");
    let index_path = data_dir.join("names.sht");

    let pool = environment.pool.as_ref();
    if !heap_path.exists() {
        HeapFile::create(pool, &heap_path)?;
    }
    if !table_path.exists() {
        HashTable::create(pool, &table_path, 16)?;
    }
    if !index_path.exists() {
        SecondaryIndex::create(pool, &index_path, 32)?;
    }

    let mut heap = HeapFile::open(pool, &heap_path)?;
    let mut table = HashTable::open(pool, &table_path)?;
    let mut index = SecondaryIndex::open(pool, &index_path)?;

    let people = [
        Record::new(1, "alice", "liddell", "4 Rabbit Hole", "Oxford"),
        Record::new(2, "bob", "gray", "29 Neibolt Street", "Derry"),
        Record::new(17, "carol", "danvers", "1 Hala Plaza", "Boston"),
        Record::new(18, "dave", "lister", "3 Deck Row", "Liverpool"),
    ];

    for person in &people {
        heap.insert(person)?;
        let page_number = table.insert(person)?;
        index.insert_entry(person, page_number);
    }
    tracing::info!(
        inserted = people.len(),
        heap_records = heap.record_count(),
        "loaded sample records"
    );

    for record in table.find_by_id(17)? {
        tracing::info!(%record, "primary lookup by id 17");
    }
    for record in index.find_by_name(&table, "bob")? {
        tracing::info!(%record, "secondary lookup by name bob");
    }
    for record in heap.find_by_id(1)? {
        tracing::info!(%record, "heap scan for id 1");
    }

    index.close()?;
    table.close()?;
    heap.close()?;
    Ok(())
}

/// Console logging, filtered through `RUST_LOG` with an INFO default.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
