//! PageBuf - the raw 4KB unit of I/O.
//!
//! A [`PageBuf`] holds the serialized bytes of one page exactly as they sit in
//! the data file. The structured view lives in [`Page`](super::Page).

use crate::common::config::PAGE_SIZE;

/// A page of raw bytes (4KB, 4KB-aligned).
///
/// # Memory Layout
/// - Size: 4096 bytes (4KB)
/// - Alignment: 4096 bytes
///
/// All integer accessors are little-endian, independent of the host.
///
/// # Example
/// ```
/// use bucketdb::storage::page::PageBuf;
///
/// let mut buf = PageBuf::new();
/// buf.put_i32(100, -1);
/// assert_eq!(buf.get_i32(100), -1);
/// ```
#[repr(align(4096))]
pub struct PageBuf {
    data: [u8; PAGE_SIZE],
}

impl PageBuf {
    /// Create a new zeroed buffer.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read a little-endian `u32` at `offset`.
    ///
    /// # Panics
    /// Panics if `offset + 4 > PAGE_SIZE`.
    #[inline]
    pub fn get_u32(&self, offset: usize) -> u32 {
        let b = &self.data[offset..offset + 4];
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    /// Write a little-endian `u32` at `offset`.
    #[inline]
    pub fn put_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn get_i32(&self, offset: usize) -> i32 {
        self.get_u32(offset) as i32
    }

    #[inline]
    pub fn put_i32(&mut self, offset: usize, value: i32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}

impl Default for PageBuf {
    fn default() -> Self {
        Self::new()
    }
}
