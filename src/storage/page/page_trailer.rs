//! Page trailer - the fixed fields at the end of every page.

use crate::common::config::PAGE_SIZE;
use crate::common::PageId;

use super::PageBuf;

/// Metadata packed backward from the end of every page.
///
/// # Layout (12 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 4084    4     overflow link (i32, -1 = none)
/// 4088    4     slot_count (u32)
/// 4092    4     free_space cursor (u32)
/// ```
///
/// The slot directory grows backward from offset 4084.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageTrailer {
    /// First unused byte of the record area.
    pub free_space: u32,
    /// Number of slot directory entries.
    pub slot_count: u32,
    /// Next page of the bucket's chain.
    pub overflow: Option<PageId>,
}

impl PageTrailer {
    /// Size of the trailer in bytes.
    pub const SIZE: usize = 12;

    /// Offset of each field within the page.
    pub const OFFSET_FREE_SPACE: usize = PAGE_SIZE - 4;
    pub const OFFSET_SLOT_COUNT: usize = PAGE_SIZE - 8;
    pub const OFFSET_OVERFLOW: usize = PAGE_SIZE - 12;

    /// Read the trailer of a page.
    pub fn from_page(buf: &PageBuf) -> Self {
        Self {
            free_space: buf.get_u32(Self::OFFSET_FREE_SPACE),
            slot_count: buf.get_u32(Self::OFFSET_SLOT_COUNT),
            overflow: PageId::from_link(buf.get_i32(Self::OFFSET_OVERFLOW)),
        }
    }

    /// Write this trailer into a page.
    pub fn write_to(&self, buf: &mut PageBuf) {
        buf.put_u32(Self::OFFSET_FREE_SPACE, self.free_space);
        buf.put_u32(Self::OFFSET_SLOT_COUNT, self.slot_count);
        buf.put_i32(Self::OFFSET_OVERFLOW, PageId::to_link(self.overflow));
    }
}
