//! Store metadata - the state that lives outside the data file.
//!
//! The bucket directory and the page allocation counter are not recorded in
//! the data file. [`StoreMeta`] snapshots both so an index can optionally
//! save them to a sidecar file on close and pick them up again on open.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::common::{Error, PageId, Result};

/// Snapshot of the bucket directory and allocation counter.
///
/// # Sidecar Layout (little-endian)
/// ```text
/// Offset    Size  Field
/// ------    ----  -----
/// 0         4     magic "BKTD"
/// 4         4     bucket_count (u32)
/// 8         4     next_free_page (u32)
/// 12        4×n   bucket heads (u32, u32::MAX = unallocated)
/// 12+4n     4     CRC32 of bytes [0, 12+4n)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreMeta {
    /// Next page index the store will hand out.
    pub next_free_page: u32,
    /// Head page of each bucket's chain.
    pub buckets: Vec<Option<PageId>>,
}

impl StoreMeta {
    const MAGIC: [u8; 4] = *b"BKTD";
    const FIXED_SIZE: usize = 16;

    /// Serialize to the sidecar format.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::FIXED_SIZE + 4 * self.buckets.len());
        out.extend_from_slice(&Self::MAGIC);
        out.extend_from_slice(&(self.buckets.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.next_free_page.to_le_bytes());
        for head in &self.buckets {
            let raw = head.unwrap_or(PageId::INVALID).0;
            out.extend_from_slice(&raw.to_le_bytes());
        }

        let checksum = crc32fast::hash(&out);
        out.extend_from_slice(&checksum.to_le_bytes());
        out
    }

    /// Parse the sidecar format.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` on a bad magic, length or checksum.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::FIXED_SIZE || bytes[..4] != Self::MAGIC {
            return Err(Error::Corrupted("directory file has no valid header".into()));
        }

        let bucket_count = read_u32(bytes, 4) as usize;
        let expected = Self::FIXED_SIZE + 4 * bucket_count;
        if bytes.len() != expected {
            return Err(Error::Corrupted(format!(
                "directory file is {} bytes, expected {}",
                bytes.len(),
                expected
            )));
        }

        let body = &bytes[..expected - 4];
        let stored = read_u32(bytes, expected - 4);
        if crc32fast::hash(body) != stored {
            return Err(Error::Corrupted("directory file checksum mismatch".into()));
        }

        let next_free_page = read_u32(bytes, 8);
        let buckets = (0..bucket_count)
            .map(|i| {
                let pid = PageId::new(read_u32(bytes, 12 + 4 * i));
                pid.is_valid().then_some(pid)
            })
            .collect();

        Ok(Self {
            next_free_page,
            buckets,
        })
    }

    /// Write the snapshot to `path`, replacing any previous one.
    ///
    /// The bytes go to a temporary file first and are renamed into place, so
    /// a crash mid-save leaves the previous snapshot intact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");

        {
            let mut file = File::create(&tmp_name)?;
            file.write_all(&self.encode())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_name, path)?;
        Ok(())
    }

    /// Load a snapshot. Returns `Ok(None)` if `path` does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        match fs::read(path) {
            Ok(bytes) => Self::decode(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
