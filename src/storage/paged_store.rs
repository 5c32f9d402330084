//! Paged Store - whole-page I/O against one backing file.
//!
//! The [`PagedStore`] handles all direct file operations:
//! - Reading and writing whole pages by index
//! - Handing out page indexes from a monotonically increasing counter

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::common::config::{MAX_PAGE_INDEX, PAGE_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::PageBuf;

/// Maps page indexes to fixed 4KB slots of a single file.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// No file header, version tag or checksum; page 0 is allocatable.
///
/// # Allocation
/// `allocate_page` only advances the counter. Space is never reclaimed and the
/// file grows when a page is first written.
///
/// # Thread Safety
/// The file handle is opened once and kept behind a mutex that is held only
/// for each seek+read or seek+write pair. The allocation counter needs
/// `&mut self`; callers serialize inserts.
pub struct PagedStore {
    file: Mutex<File>,
    /// Next page index to hand out.
    next_free_page: u32,
    /// `fsync` after each write.
    sync_writes: bool,
}

impl PagedStore {
    /// Create a store, truncating any existing file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or opened.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Self::from_file(file, 0)
    }

    /// Open an existing store and resume allocation at `next_free_page`.
    ///
    /// The counter never starts below the number of pages already in the
    /// file, so a stale `next_free_page` cannot hand out a page that is in
    /// use.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, next_free_page: u32) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Self::from_file(file, next_free_page)
    }

    /// Wrap an already opened file.
    pub(crate) fn from_file(file: File, next_free_page: u32) -> Result<Self> {
        let on_disk = file.metadata()?.len().div_ceil(PAGE_SIZE as u64);
        let on_disk = u32::try_from(on_disk).map_err(|_| Error::PageLimitExceeded)?;

        if on_disk > next_free_page {
            tracing::warn!(
                "File holds {} pages but counter was {}; resuming after the file end",
                on_disk,
                next_free_page
            );
        }

        Ok(Self {
            file: Mutex::new(file),
            next_free_page: next_free_page.max(on_disk),
            sync_writes: false,
        })
    }

    /// `fsync` after each page write.
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Read a whole page.
    ///
    /// Returns `Ok(None)` when fewer than `PAGE_SIZE` bytes are available at
    /// the page's offset; the page is treated as absent. Other I/O failures
    /// are returned as errors.
    pub fn read_page(&self, page_id: PageId) -> Result<Option<PageBuf>> {
        let mut buf = PageBuf::new();

        let filled = {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(page_id.file_offset()))?;
            read_full(&mut *file, buf.as_mut_slice())?
        };

        if filled == PAGE_SIZE {
            return Ok(Some(buf));
        }

        if filled > 0 {
            tracing::warn!(
                "Incomplete read of {}: expected {} bytes, got {}",
                page_id,
                PAGE_SIZE,
                filled
            );
        } else {
            tracing::debug!("{} not present on disk", page_id);
        }
        Ok(None)
    }

    /// Write a whole page.
    ///
    /// # Errors
    /// Returns `Error::PageNotAllocated` if the page hasn't been allocated.
    pub fn write_page(&self, page_id: PageId, buf: &PageBuf) -> Result<()> {
        if page_id.0 >= self.next_free_page {
            return Err(Error::PageNotAllocated(page_id.0));
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_id.file_offset()))?;
        file.write_all(buf.as_slice())?;
        if self.sync_writes {
            file.sync_data()?;
        }

        Ok(())
    }

    /// Hand out the next page index.
    ///
    /// # Errors
    /// Returns `Error::PageLimitExceeded` once the counter passes the largest
    /// index an overflow link can hold.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        if self.next_free_page > MAX_PAGE_INDEX {
            return Err(Error::PageLimitExceeded);
        }

        let page_id = PageId::new(self.next_free_page);
        self.next_free_page += 1;
        tracing::trace!("Allocated {}", page_id);
        Ok(page_id)
    }

    /// Number of pages handed out so far.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.next_free_page
    }

    /// Current length of the backing file in bytes.
    pub fn file_size(&self) -> Result<u64> {
        Ok(self.file.lock().metadata()?.len())
    }

    /// Flush file contents to disk.
    pub fn sync(&self) -> Result<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }
}

/// Read until `buf` is full or EOF; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
