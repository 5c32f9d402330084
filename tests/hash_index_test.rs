//! Integration tests for the hash index.
//!
//! These tests drive inserts and lookups through the public API and inspect
//! the resulting chains and data file.

use bucketdb::common::config::PAGE_SIZE;
use bucketdb::{Error, HashIndex, IndexConfig, Page, PageBuf, PageId, PagedStore, Record};
use tempfile::tempdir;

fn create_index() -> (HashIndex, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let index = HashIndex::create(dir.path().join("test.db")).unwrap();
    (index, dir)
}

fn employee(id: i32, bio_len: usize) -> Record {
    Record::new(id, format!("emp-{}", id), "x".repeat(bio_len), id / 2)
}

/// Same-bucket records that fit one page share a single-page chain.
#[test]
fn test_same_bucket_single_page() {
    let (mut index, _dir) = create_index();

    for id in [0, 256, 512] {
        index.insert(employee(id, 20)).unwrap();
    }

    assert_eq!(index.bucket_of(0), index.bucket_of(256));
    assert_eq!(index.chain(0).unwrap(), vec![PageId::new(0)]);
    assert_eq!(index.page_count(), 1);

    let found = index.lookup(256).unwrap().unwrap();
    assert_eq!(found, employee(256, 20));
}

/// A record too big for the remaining space starts an overflow page.
#[test]
fn test_second_record_overflows() {
    let (mut index, _dir) = create_index();

    let first = employee(5, 100);
    let second = employee(5 + 256, 4000);
    assert_eq!(index.insert(first.clone()).unwrap(), PageId::new(0));
    assert_eq!(index.insert(second.clone()).unwrap(), PageId::new(1));

    let bucket = index.bucket_of(5);
    assert_eq!(index.chain(bucket).unwrap(), vec![PageId::new(0), PageId::new(1)]);

    // The head page only holds the first record
    let dir = index.config().path.clone();
    let store = PagedStore::open(&dir, index.page_count()).unwrap();
    let head = Page::from_buf(&store.read_page(PageId::new(0)).unwrap().unwrap()).unwrap();
    assert_eq!(head.records(), &[first.clone()]);
    assert_eq!(head.overflow(), Some(PageId::new(1)));

    assert_eq!(index.lookup(5).unwrap(), Some(first));
    assert_eq!(index.lookup(5 + 256).unwrap(), Some(second));
}

/// Enough same-bucket records grow a long chain, all reachable.
#[test]
fn test_long_chain_is_complete() {
    let (mut index, _dir) = create_index();

    let ids: Vec<i32> = (0..200).map(|i| 7 + 256 * i).collect();
    for &id in &ids {
        index.insert(employee(id, 150)).unwrap();
    }

    let chain = index.chain(7).unwrap();
    assert!(chain.len() > 1, "expected overflow, got {:?}", chain);
    assert_eq!(index.page_count() as usize, chain.len());

    for &id in &ids {
        assert_eq!(index.lookup(id).unwrap(), Some(employee(id, 150)), "id {}", id);
    }
}

/// Only the tail page changes once a chain has grown.
#[test]
fn test_inserts_only_touch_tail() {
    let (mut index, _dir) = create_index();

    index.insert(employee(1, 3000)).unwrap();
    index.insert(employee(257, 3000)).unwrap();

    let path = index.config().path.clone();
    let head_before = std::fs::read(&path).unwrap()[..PAGE_SIZE].to_vec();

    // Small enough to have fit in the head page, but the head is no longer the tail
    assert_eq!(index.insert(employee(513, 1)).unwrap(), PageId::new(1));

    let head_after = std::fs::read(&path).unwrap()[..PAGE_SIZE].to_vec();
    assert_eq!(head_before, head_after);
}

/// Lookups across many buckets, plus misses.
#[test]
fn test_lookup_completeness_and_misses() {
    let (mut index, _dir) = create_index();

    for id in 0..2000 {
        index.insert(employee(id * 3, 40)).unwrap();
    }

    for id in 0..2000 {
        assert_eq!(index.lookup(id * 3).unwrap().unwrap().id(), id * 3);
    }
    assert!(index.lookup(1).unwrap().is_none());
    assert!(index.lookup(-3).unwrap().is_none());
    assert!(index.lookup(6001).unwrap().is_none());
}

#[test]
fn test_unused_bucket_is_not_found() {
    let (index, _dir) = create_index();
    assert!(index.lookup(42).unwrap().is_none());
    assert!(index.chain(42).unwrap().is_empty());
}

#[test]
fn test_negative_ids() {
    let (mut index, _dir) = create_index();

    index.insert(employee(-1, 10)).unwrap();
    index.insert(employee(255, 10)).unwrap();

    assert_eq!(index.bucket_of(-1), 255);
    assert_eq!(index.chain(255).unwrap().len(), 1);
    assert_eq!(index.lookup(-1).unwrap().unwrap().id(), -1);
    assert_eq!(index.lookup(255).unwrap().unwrap().id(), 255);
}

/// Duplicate ids are kept; lookup returns the earliest insert.
#[test]
fn test_duplicates_return_first_inserted() {
    let (mut index, _dir) = create_index();

    index.insert(Record::new(9, "first", "", 0)).unwrap();
    index.insert(Record::new(9, "second", "", 0)).unwrap();

    assert_eq!(index.lookup(9).unwrap().unwrap().name(), "first");
}

#[test]
fn test_oversized_record_rejected_without_allocating() {
    let (mut index, _dir) = create_index();

    let err = index.insert(employee(3, PAGE_SIZE)).unwrap_err();
    assert!(matches!(err, Error::RecordTooLarge { id: 3, .. }));
    assert_eq!(index.page_count(), 0);
    assert!(index.directory().head(3).is_none());
}

#[test]
fn test_custom_bucket_count() {
    let dir = tempdir().unwrap();
    let config = IndexConfig::builder()
        .path(dir.path().join("test.db"))
        .bucket_count(4)
        .build();
    let mut index = HashIndex::open(config).unwrap();

    for id in 0..40 {
        index.insert(employee(id, 10)).unwrap();
    }

    assert_eq!(index.directory().bucket_count(), 4);
    assert_eq!(index.directory().allocated(), 4);
    assert_eq!(index.bucket_of(13), 1);
    for id in 0..40 {
        assert!(index.lookup(id).unwrap().is_some());
    }
}

/// Without directory persistence, reopening starts from scratch.
#[test]
fn test_reopen_without_persistence_rebuilds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    {
        let mut index = HashIndex::create(&path).unwrap();
        index.insert(employee(1, 10)).unwrap();
        index.close().unwrap();
    }

    let index = HashIndex::create(&path).unwrap();
    assert!(index.lookup(1).unwrap().is_none());
    assert_eq!(index.page_count(), 0);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
}

/// With directory persistence, a reopened index finds earlier records and
/// keeps allocating after them.
#[test]
fn test_reopen_with_persistence() {
    let dir = tempdir().unwrap();
    let config = IndexConfig::builder()
        .path(dir.path().join("test.db"))
        .persist_directory(true)
        .build();

    {
        let mut index = HashIndex::open(config.clone()).unwrap();
        for id in 0..300 {
            index.insert(employee(id, 30)).unwrap();
        }
        index.close().unwrap();
    }
    assert!(config.directory_path().exists());

    let mut index = HashIndex::open(config.clone()).unwrap();
    assert_eq!(index.page_count(), 256);
    assert_eq!(index.lookup(299).unwrap(), Some(employee(299, 30)));

    index.insert(employee(1000, 4000)).unwrap();
    assert_eq!(index.chain(index.bucket_of(1000)).unwrap().len(), 2);
    assert_eq!(index.lookup(1000).unwrap(), Some(employee(1000, 4000)));
    assert_eq!(index.lookup(232).unwrap(), Some(employee(232, 30)));
}

#[test]
fn test_persisted_bucket_count_mismatch() {
    let dir = tempdir().unwrap();
    let config = IndexConfig::builder()
        .path(dir.path().join("test.db"))
        .persist_directory(true)
        .build();

    HashIndex::open(config.clone()).unwrap().close().unwrap();

    let other = IndexConfig {
        bucket_count: 128,
        ..config
    };
    assert!(matches!(HashIndex::open(other), Err(Error::Config(_))));
}

#[test]
fn test_non_persistent_open_discards_saved_directory() {
    let dir = tempdir().unwrap();
    let config = IndexConfig::builder()
        .path(dir.path().join("test.db"))
        .persist_directory(true)
        .build();

    HashIndex::open(config.clone()).unwrap().close().unwrap();
    assert!(config.directory_path().exists());

    let plain = IndexConfig {
        persist_directory: false,
        ..config.clone()
    };
    HashIndex::open(plain).unwrap();
    assert!(!config.directory_path().exists());
}

/// A saved directory older than the data file must not hand out pages that
/// are already part of a chain.
#[test]
fn test_stale_saved_directory_does_not_reuse_pages() {
    let dir = tempdir().unwrap();
    let config = IndexConfig::builder()
        .path(dir.path().join("test.db"))
        .persist_directory(true)
        .build();

    {
        let mut index = HashIndex::open(config.clone()).unwrap();
        index.insert(employee(1, 3000)).unwrap();
        index.close().unwrap();
    }
    let old_directory = std::fs::read(config.directory_path()).unwrap();

    {
        let mut index = HashIndex::open(config.clone()).unwrap();
        assert_eq!(index.insert(employee(257, 3000)).unwrap(), PageId::new(1));
        index.close().unwrap();
    }

    // Put back the snapshot taken before page 1 existed
    std::fs::write(config.directory_path(), old_directory).unwrap();

    let mut index = HashIndex::open(config.clone()).unwrap();
    assert_eq!(index.page_count(), 2);
    assert_eq!(index.insert(employee(2, 10)).unwrap(), PageId::new(2));

    assert_eq!(index.chain(1).unwrap(), vec![PageId::new(0), PageId::new(1)]);
    assert_eq!(index.chain(2).unwrap(), vec![PageId::new(2)]);
    assert_eq!(index.lookup(257).unwrap(), Some(employee(257, 3000)));
}

/// Dropping an index after inserting without `close` leaves no saved
/// directory, so the next open starts over rather than sharing pages.
#[test]
fn test_drop_without_close_discards_saved_directory() {
    let dir = tempdir().unwrap();
    let config = IndexConfig::builder()
        .path(dir.path().join("test.db"))
        .persist_directory(true)
        .build();

    {
        let mut index = HashIndex::open(config.clone()).unwrap();
        index.insert(employee(1, 3000)).unwrap();
        index.close().unwrap();
    }

    {
        let mut index = HashIndex::open(config.clone()).unwrap();
        index.insert(employee(257, 3000)).unwrap();
        assert!(!config.directory_path().exists());
    }

    let mut index = HashIndex::open(config.clone()).unwrap();
    assert_eq!(index.page_count(), 0);
    assert!(index.chain(1).unwrap().is_empty());

    assert_eq!(index.insert(employee(2, 10)).unwrap(), PageId::new(0));
    assert!(index.lookup(1).unwrap().is_none());
}

/// Lookups alone leave the saved directory in place.
#[test]
fn test_lookup_only_session_keeps_saved_directory() {
    let dir = tempdir().unwrap();
    let config = IndexConfig::builder()
        .path(dir.path().join("test.db"))
        .persist_directory(true)
        .build();

    {
        let mut index = HashIndex::open(config.clone()).unwrap();
        index.insert(employee(1, 10)).unwrap();
        index.close().unwrap();
    }

    {
        let index = HashIndex::open(config.clone()).unwrap();
        assert!(index.lookup(1).unwrap().is_some());
    }

    assert!(config.directory_path().exists());
    let index = HashIndex::open(config).unwrap();
    assert_eq!(index.lookup(1).unwrap(), Some(employee(1, 10)));
}

#[test]
fn test_chain_of_unknown_bucket_is_config_error() {
    let (index, _dir) = create_index();

    assert!(matches!(index.chain(300), Err(Error::Config(_))));
    assert!(index.chain(255).unwrap().is_empty());
    assert!(index.directory().head(300).is_none());
}

/// A chain whose link points past the end of the file stops there.
#[test]
fn test_dangling_link_ends_chain() {
    let (mut index, _dir) = create_index();
    index.insert(employee(2, 10)).unwrap();

    // Rewrite the head page with a link to a page that was never written
    let path = index.config().path.clone();
    let store = PagedStore::open(&path, 1).unwrap();
    let mut head = Page::from_buf(&store.read_page(PageId::new(0)).unwrap().unwrap()).unwrap();
    head.set_overflow(Some(PageId::new(50)));
    store.write_page(PageId::new(0), &head.to_buf()).unwrap();

    assert_eq!(index.lookup(2).unwrap().unwrap().id(), 2);
    assert!(index.lookup(258).unwrap().is_none());
    assert_eq!(index.chain(2).unwrap(), vec![PageId::new(0), PageId::new(50)]);

    // The next insert still lands in the head page
    assert_eq!(index.insert(employee(258, 10)).unwrap(), PageId::new(0));
    assert!(index.lookup(258).unwrap().is_some());
}

#[test]
fn test_self_referencing_chain_is_corruption() {
    let (mut index, _dir) = create_index();
    index.insert(employee(4, 10)).unwrap();

    let path = index.config().path.clone();
    let store = PagedStore::open(&path, 1).unwrap();
    let mut head = Page::from_buf(&store.read_page(PageId::new(0)).unwrap().unwrap()).unwrap();
    head.set_overflow(Some(PageId::new(0)));
    store.write_page(PageId::new(0), &head.to_buf()).unwrap();

    assert!(matches!(index.lookup(260), Err(Error::Corrupted(_))));
    assert!(matches!(index.insert(employee(260, 10)), Err(Error::Corrupted(_))));
}

#[test]
fn test_every_page_fits_file_slot() {
    let (mut index, _dir) = create_index();

    for id in 0..500 {
        index.insert(employee(id % 3 + 256 * id, 333)).unwrap();
    }

    let raw = std::fs::read(&index.config().path).unwrap();
    assert_eq!(raw.len(), index.page_count() as usize * PAGE_SIZE);

    for chunk in raw.chunks(PAGE_SIZE) {
        let mut buf = PageBuf::new();
        buf.as_mut_slice().copy_from_slice(chunk);
        let page = Page::from_buf(&buf).unwrap();
        assert!(page.occupied_bytes() < PAGE_SIZE);
        assert!(!page.is_empty());
    }
}
