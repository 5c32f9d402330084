//! Error types for bucketdb.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in bucketdb.
///
/// "Record not found" is deliberately absent: a lookup miss is an ordinary
/// outcome and is reported as `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    // -------------------------------------------------------------------------
    // I/O
    // -------------------------------------------------------------------------
    /// I/O error from the data file or directory sidecar.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Pages
    // -------------------------------------------------------------------------
    /// The record does not fit in the remaining space of this page.
    ///
    /// Expected during inserts; the index reacts by growing the overflow chain.
    #[error("Page is full")]
    PageFull,

    /// The record would not fit even in an empty page.
    #[error("Record {id} is too large for a page ({size} bytes)")]
    RecordTooLarge { id: i32, size: usize },

    /// Write to a page index the store never handed out.
    #[error("Page {0} has not been allocated")]
    PageNotAllocated(u32),

    /// The allocation counter reached the largest linkable page index.
    #[error("Page limit exceeded")]
    PageLimitExceeded,

    /// On-disk bytes failed a bounds or checksum check.
    #[error("Corrupted data: {0}")]
    Corrupted(String),

    // -------------------------------------------------------------------------
    // Setup and ingest
    // -------------------------------------------------------------------------
    /// Invalid or mismatched configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A delimited-text row could not be turned into a record.
    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}
