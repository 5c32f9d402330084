//! Configuration for bucketdb.
//!
//! Layout constants are compile-time; everything an operator may choose per
//! index lives in [`IndexConfig`].

use std::path::PathBuf;

use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// Every page of the data file occupies exactly this many bytes, and page `i`
/// starts at file offset `i × PAGE_SIZE`. The size is fixed; there is no
/// per-file override.
pub const PAGE_SIZE: usize = 4096;

/// Number of buckets when the caller does not choose one.
pub const DEFAULT_BUCKET_COUNT: usize = 256;

/// Largest page index an overflow link can address.
///
/// Links are stored as signed 32-bit integers with `-1` meaning "none", so the
/// non-negative range bounds the file at `2^31` pages (8TB).
pub const MAX_PAGE_INDEX: u32 = i32::MAX as u32;

/// Default data file name used by the command-line tool.
pub const DEFAULT_INDEX_FILE: &str = "EmployeeIndex.dat";

/// Settings for one [`HashIndex`](crate::index::HashIndex) instance.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    // -------------------------------------------------------------------------
    // Storage
    // -------------------------------------------------------------------------
    /// Data file holding the pages.
    pub path: PathBuf,

    /// `fsync` after every page write.
    pub sync_writes: bool,

    // -------------------------------------------------------------------------
    // Directory
    // -------------------------------------------------------------------------
    /// Number of buckets. Fixed at construction; the directory never resizes,
    /// skew is absorbed by overflow chains.
    pub bucket_count: usize,

    /// Save the bucket directory and allocation counter to `<path>.dir` on
    /// close and reload them on open. When false every open starts from an
    /// empty directory and truncates the data file.
    pub persist_directory: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_INDEX_FILE),
            sync_writes: false,
            bucket_count: DEFAULT_BUCKET_COUNT,
            persist_directory: false,
        }
    }
}

impl IndexConfig {
    /// Create a new config builder.
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    /// Path of the directory sidecar file for this index.
    pub fn directory_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".dir");
        PathBuf::from(name)
    }

    /// Check the settings for values the index cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 {
            return Err(Error::Config("bucket_count must be at least 1".into()));
        }
        if self.bucket_count > MAX_PAGE_INDEX as usize {
            return Err(Error::Config(format!(
                "bucket_count {} exceeds the addressable page range",
                self.bucket_count
            )));
        }
        Ok(())
    }
}

/// Builder for [`IndexConfig`].
#[derive(Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    /// Set the data file path.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the number of buckets.
    pub fn bucket_count(mut self, count: usize) -> Self {
        self.config.bucket_count = count;
        self
    }

    /// Persist the directory across runs.
    pub fn persist_directory(mut self, persist: bool) -> Self {
        self.config.persist_directory = persist;
        self
    }

    /// `fsync` after every page write.
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    pub fn build(self) -> IndexConfig {
        self.config
    }
}
