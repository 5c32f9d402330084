//! bucketdb - a static-hashing, disk-resident record index.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            bucketdb                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐           ┌─────────────────────┐      │
//! │  │  ingest (CSV rows)  │           │ report (lookups)    │      │
//! │  └─────────────────────┘           └─────────────────────┘      │
//! │                ↓                              ↑                 │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Index Layer (index/)                     │   │
//! │  │   HashIndex: id mod N → BucketDirectory → overflow chain │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Storage Layer (storage/)                   │   │
//! │  │   PagedStore + Page (slotted) + Record codec + StoreMeta │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, Error, config)
//! - [`storage`] - Page file I/O, page layout and record encoding
//! - [`index`] - Bucket directory and hash index
//! - [`ingest`] - Comma-separated row loading
//! - [`report`] - Lookup output formatting
//!
//! # Quick Start
//! ```no_run
//! use bucketdb::{HashIndex, LookupReport, Record};
//!
//! let mut index = HashIndex::create("EmployeeIndex.dat").unwrap();
//! index.insert(Record::new(11432121, "Ada", "Engineer", 11430000)).unwrap();
//!
//! let found = index.lookup(11432121).unwrap();
//! println!("{}", LookupReport::new(11432121, found.as_ref()));
//! ```

pub mod common;
pub mod index;
pub mod ingest;
pub mod report;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_BUCKET_COUNT, PAGE_SIZE};
pub use common::{Error, IndexConfig, PageId, Result};

pub use index::{BucketDirectory, HashIndex};
pub use ingest::IngestSummary;
pub use report::LookupReport;
pub use storage::page::{Page, PageBuf, PageTrailer};
pub use storage::{PagedStore, Record, StoreMeta};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
