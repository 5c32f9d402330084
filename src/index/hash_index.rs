//! Hash Index - static hashing over overflow-chained pages.
//!
//! The [`HashIndex`] provides:
//! - Bucket routing by `id mod bucket_count`
//! - Inserts that append to the tail of a bucket's chain
//! - Lookups that walk the chain and scan each page

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::common::{Error, IndexConfig, PageId, Result};
use crate::index::BucketDirectory;
use crate::storage::page::Page;
use crate::storage::{PagedStore, Record, StoreMeta};

/// A disk-resident static hash index.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                          HashIndex                           │
/// │  ┌───────────────┐                                           │
/// │  │  directory    │   bucket b ──▶ Page 3 ──▶ Page 9 ──▶ none │
/// │  │ [b] → PageId  │   bucket c ──▶ Page 0 ──▶ none            │
/// │  └───────────────┘                                           │
/// │  ┌───────────────┐                                           │
/// │  │ PagedStore    │   one file, page i at i × 4096            │
/// │  └───────────────┘                                           │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// Pages are never cached: every insert and lookup reads the chain fresh
/// from disk. Only the tail page of a chain is ever modified.
///
/// # Thread Safety
/// Single writer, single reader. `insert` takes `&mut self`; callers that
/// share an index across threads must wrap it in a lock, since the directory
/// update, the tail page's read-modify-write and the allocation counter are
/// not atomic with respect to each other.
///
/// # Usage
/// ```no_run
/// use bucketdb::{HashIndex, Record};
///
/// let mut index = HashIndex::create("EmployeeIndex.dat").unwrap();
/// index.insert(Record::new(7, "Ada", "Engineer", 1)).unwrap();
///
/// let found = index.lookup(7).unwrap();
/// assert_eq!(found.unwrap().name(), "Ada");
/// ```
pub struct HashIndex {
    store: PagedStore,
    directory: BucketDirectory,
    config: IndexConfig,
    /// The sidecar on disk matches `directory` and the page counter.
    saved: bool,
}

impl HashIndex {
    /// Create a fresh index at `path` with default settings.
    ///
    /// Any existing file at `path` is truncated.
    pub fn create<P: Into<std::path::PathBuf>>(path: P) -> Result<Self> {
        Self::open(IndexConfig::builder().path(path).build())
    }

    /// Open an index according to `config`.
    ///
    /// With `persist_directory` set and a saved directory present, the data
    /// file is reopened as-is and the directory and counter are restored.
    /// Otherwise the data file is truncated and the directory starts empty.
    ///
    /// The saved directory is removed by the first insert and written again
    /// by [`sync`](Self::sync) or [`close`](Self::close). An index dropped
    /// without either leaves no directory behind, and the next open starts
    /// over instead of trusting a snapshot older than the data file.
    ///
    /// # Errors
    /// - `Error::Config` for invalid settings or a bucket count that differs
    ///   from the saved directory
    /// - `Error::Corrupted` if the saved directory fails its checksum
    /// - I/O errors opening the data file
    pub fn open(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let meta_path = config.directory_path();

        if config.persist_directory {
            if let Some(meta) = StoreMeta::load(&meta_path)? {
                if meta.buckets.len() != config.bucket_count {
                    return Err(Error::Config(format!(
                        "saved directory has {} buckets, config asks for {}",
                        meta.buckets.len(),
                        config.bucket_count
                    )));
                }

                let store = PagedStore::open(&config.path, meta.next_free_page)?
                    .with_sync_writes(config.sync_writes);
                let directory = BucketDirectory::from_heads(meta.buckets);

                tracing::info!(
                    "Reopened index {} ({} pages, {} of {} buckets in use)",
                    config.path.display(),
                    store.page_count(),
                    directory.allocated(),
                    directory.bucket_count()
                );
                return Ok(Self {
                    store,
                    directory,
                    config,
                    saved: true,
                });
            }
        } else {
            // The data file is about to be truncated; a saved directory
            // would point into pages that no longer exist.
            remove_saved_directory(&meta_path)?;
        }

        let store = PagedStore::create(&config.path)?.with_sync_writes(config.sync_writes);
        let directory = BucketDirectory::new(config.bucket_count);

        tracing::info!(
            "Created index {} with {} buckets",
            config.path.display(),
            config.bucket_count
        );
        Ok(Self {
            store,
            directory,
            config,
            saved: false,
        })
    }

    // ========================================================================
    // Public API: Insert and lookup
    // ========================================================================

    /// Insert a record into its bucket's chain.
    ///
    /// Returns the page the record was written to. Duplicate ids are not
    /// checked; both copies are stored.
    ///
    /// # Errors
    /// - `Error::RecordTooLarge` if the record cannot fit even an empty page
    /// - `Error::PageLimitExceeded` if no more pages can be allocated
    /// - I/O and corruption errors from reading the chain
    ///
    /// A failed insert leaves the directory unchanged.
    pub fn insert(&mut self, record: Record) -> Result<PageId> {
        if !Page::fits_empty(&record) {
            return Err(Error::RecordTooLarge {
                id: record.id(),
                size: record.encoded_len(),
            });
        }
        self.invalidate_saved_directory()?;

        let bucket = self.directory.bucket_for(record.id());
        let head = match self.directory.head(bucket) {
            Some(page_id) => page_id,
            None => return self.start_bucket(bucket, &record),
        };

        let (tail_id, mut tail) = self.find_tail(head)?;

        match tail.insert(&record) {
            Ok(()) => {
                self.write_page(tail_id, &tail)?;
                Ok(tail_id)
            }
            Err(Error::PageFull) => {
                let new_id = self.store.allocate_page()?;
                let mut overflow = Page::new();
                overflow.insert(&record)?;

                // New page first, so the link never points at an unwritten page
                self.write_page(new_id, &overflow)?;
                tail.set_overflow(Some(new_id));
                self.write_page(tail_id, &tail)?;

                tracing::debug!(
                    "Bucket {} overflowed: {} -> {}",
                    bucket,
                    tail_id,
                    new_id
                );
                Ok(new_id)
            }
            Err(e) => Err(e),
        }
    }

    /// Find a record by id.
    ///
    /// Walks the bucket's chain from the head, scanning each page in
    /// insertion order. Returns the first match, or `None` once the chain
    /// ends.
    pub fn lookup(&self, id: i32) -> Result<Option<Record>> {
        let bucket = self.directory.bucket_for(id);
        let mut next = self.directory.head(bucket);
        let mut hops = 0u32;

        while let Some(page_id) = next {
            self.check_hops(&mut hops, page_id)?;

            let page = match self.load_page(page_id)? {
                Some(page) => page,
                None => break,
            };
            if let Some(record) = page.find(id) {
                return Ok(Some(record.clone()));
            }
            next = page.overflow();
        }

        Ok(None)
    }

    // ========================================================================
    // Public API: Inspection
    // ========================================================================

    /// Bucket an id routes to.
    #[inline]
    pub fn bucket_of(&self, id: i32) -> usize {
        self.directory.bucket_for(id)
    }

    /// Pages of a bucket's chain, head first. Empty for an unused bucket.
    ///
    /// # Errors
    /// Returns `Error::Config` if `bucket` is not below the bucket count.
    pub fn chain(&self, bucket: usize) -> Result<Vec<PageId>> {
        if !self.directory.contains(bucket) {
            return Err(Error::Config(format!(
                "bucket {} out of range (index has {} buckets)",
                bucket,
                self.directory.bucket_count()
            )));
        }

        let mut pages = Vec::new();
        let mut next = self.directory.head(bucket);
        let mut hops = 0u32;

        while let Some(page_id) = next {
            self.check_hops(&mut hops, page_id)?;
            pages.push(page_id);
            next = match self.load_page(page_id)? {
                Some(page) => page.overflow(),
                None => None,
            };
        }

        Ok(pages)
    }

    /// Number of pages allocated so far.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.store.page_count()
    }

    /// The bucket directory.
    #[inline]
    pub fn directory(&self) -> &BucketDirectory {
        &self.directory
    }

    /// The settings this index was opened with.
    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    // ========================================================================
    // Public API: Durability
    // ========================================================================

    /// Flush the data file and, if enabled, save the directory.
    pub fn sync(&mut self) -> Result<()> {
        self.store.sync()?;

        if self.config.persist_directory {
            let meta = StoreMeta {
                next_free_page: self.store.page_count(),
                buckets: self.directory.heads().to_vec(),
            };
            meta.save(self.config.directory_path())?;
            self.saved = true;
            tracing::debug!(
                "Saved directory to {}",
                self.config.directory_path().display()
            );
        }

        Ok(())
    }

    /// Sync and close the index.
    pub fn close(mut self) -> Result<()> {
        self.sync()?;
        tracing::info!(
            "Closed index {} ({} pages)",
            self.config.path.display(),
            self.store.page_count()
        );
        Ok(())
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Give an unused bucket its first page.
    ///
    /// The directory only points at the page once it has been written.
    fn start_bucket(&mut self, bucket: usize, record: &Record) -> Result<PageId> {
        let page_id = self.store.allocate_page()?;
        let mut page = Page::new();
        page.insert(record)?;

        self.write_page(page_id, &page)?;
        self.directory.set_head(bucket, page_id);

        tracing::debug!("Bucket {} starts at {}", bucket, page_id);
        Ok(page_id)
    }

    /// Drop the saved directory before the first change after it was saved.
    fn invalidate_saved_directory(&mut self) -> Result<()> {
        if self.saved {
            remove_saved_directory(&self.config.directory_path())?;
            self.saved = false;
        }
        Ok(())
    }

    /// Walk from `head` to the last readable page of the chain.
    ///
    /// A link to an unreadable page ends the walk; the page holding that link
    /// becomes the tail and its link is replaced if the chain has to grow.
    fn find_tail(&self, head: PageId) -> Result<(PageId, Page)> {
        let mut tail_id = head;
        let mut tail = self.load_page(head)?.unwrap_or_default();
        let mut hops = 0u32;

        while let Some(next) = tail.overflow() {
            self.check_hops(&mut hops, next)?;
            match self.load_page(next)? {
                Some(page) => {
                    tail_id = next;
                    tail = page;
                }
                None => {
                    tracing::warn!("{} links to unreadable {}", tail_id, next);
                    break;
                }
            }
        }

        Ok((tail_id, tail))
    }

    fn load_page(&self, page_id: PageId) -> Result<Option<Page>> {
        self.store
            .read_page(page_id)?
            .map(|buf| Page::from_buf(&buf))
            .transpose()
    }

    fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        self.store.write_page(page_id, &page.to_buf())
    }

    /// A chain visits each allocated page at most once, plus one dangling
    /// link at the end; more hops means the links form a cycle.
    fn check_hops(&self, hops: &mut u32, page_id: PageId) -> Result<()> {
        *hops += 1;
        if *hops > self.store.page_count() + 1 {
            return Err(Error::Corrupted(format!(
                "overflow chain loops back through {}",
                page_id
            )));
        }
        Ok(())
    }
}

fn remove_saved_directory(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed saved directory {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
