//! Page identifier type.

use std::fmt;

use crate::common::config::MAX_PAGE_INDEX;

/// Identifies a page in the data file.
///
/// Page `n` lives at byte offset `n × PAGE_SIZE`. Page 0 is an ordinary page;
/// the file has no reserved header.
///
/// # Example
/// ```
/// use bucketdb::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Invalid/sentinel page ID.
    ///
    /// Its little-endian bytes are identical to the signed `-1` that marks
    /// "no overflow page" in a page trailer.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Byte offset of this page in the data file.
    #[inline]
    pub fn file_offset(&self) -> u64 {
        (self.0 as u64) * (crate::common::config::PAGE_SIZE as u64)
    }

    /// Encode an optional link as the signed on-disk value (`-1` for none).
    pub fn to_link(link: Option<PageId>) -> i32 {
        match link {
            Some(pid) => pid.0 as i32,
            None => -1,
        }
    }

    /// Decode a signed on-disk link. Returns `None` for any negative value.
    pub fn from_link(raw: i32) -> Option<PageId> {
        if raw < 0 {
            None
        } else {
            debug_assert!(raw as u32 <= MAX_PAGE_INDEX);
            Some(PageId(raw as u32))
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_new() {
        let pid = PageId::new(42);
        assert_eq!(pid.0, 42);
        assert!(pid.is_valid());
    }

    #[test]
    fn test_page_id_invalid() {
        assert!(!PageId::INVALID.is_valid());
        assert_eq!(PageId::INVALID.0.to_le_bytes(), (-1i32).to_le_bytes());
    }

    #[test]
    fn test_file_offset() {
        assert_eq!(PageId::new(0).file_offset(), 0);
        assert_eq!(PageId::new(3).file_offset(), 3 * 4096);
    }

    #[test]
    fn test_link_encoding() {
        assert_eq!(PageId::to_link(None), -1);
        assert_eq!(PageId::to_link(Some(PageId::new(0))), 0);
        assert_eq!(PageId::from_link(-1), None);
        assert_eq!(PageId::from_link(0), Some(PageId::new(0)));
        assert_eq!(PageId::from_link(17), Some(PageId::new(17)));
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(42)), "Page(42)");
        assert_eq!(format!("{}", PageId::INVALID), "Page(INVALID)");
    }
}
