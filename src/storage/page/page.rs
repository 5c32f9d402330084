//! Page - a slotted container of records.
//!
//! A [`Page`] is the structured, in-memory form of one 4KB page. It is built
//! by inserts, serialized into a [`PageBuf`] for writing, and rebuilt from a
//! [`PageBuf`] on every read.

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::record::Record;

use super::{PageBuf, PageTrailer};

/// Size of one slot directory entry (offset + length).
pub const SLOT_SIZE: usize = 8;

/// Location of one record inside the record area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: u32,
    pub len: u32,
}

/// A page of records with a slot directory and an overflow link.
///
/// # On-disk Layout
/// ```text
/// ┌────────────────────────────────────────────────────────────────┐
/// │ rec 0 │ rec 1 │ ... │ rec n-1 │   free   │ slot n-1 │ ... │ slot 0 │ overflow │ count │ free_ptr │
/// └────────────────────────────────────────────────────────────────┘
/// 0       records grow forward →       ← slots grow backward    4084     4088    4092     4096
/// ```
///
/// Slot 0 (the first record inserted) sits right below the overflow link.
///
/// # Capacity
/// `occupied_bytes` counts the trailer, every record, and every slot entry.
/// An insert is rejected when `occupied + record + slot >= PAGE_SIZE`, so a
/// record that would land exactly on the page boundary is refused and the
/// serialized page always fits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    records: Vec<Record>,
    slots: Vec<Slot>,
    occupied: usize,
    free_space: usize,
    overflow: Option<PageId>,
}

impl Page {
    /// Create an empty page with no overflow link.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            slots: Vec::new(),
            occupied: PageTrailer::SIZE,
            free_space: 0,
            overflow: None,
        }
    }

    /// Bytes a record consumes in a page, including its slot entry.
    #[inline]
    pub fn footprint(record: &Record) -> usize {
        record.encoded_len() + SLOT_SIZE
    }

    /// Whether `record` could be stored in an empty page.
    #[inline]
    pub fn fits_empty(record: &Record) -> bool {
        PageTrailer::SIZE + Self::footprint(record) < PAGE_SIZE
    }

    /// Append a record.
    ///
    /// # Errors
    /// Returns `Error::PageFull` if the record does not fit; the page is left
    /// untouched.
    pub fn insert(&mut self, record: &Record) -> Result<()> {
        let size = record.encoded_len();
        if self.occupied + size + SLOT_SIZE >= PAGE_SIZE {
            return Err(Error::PageFull);
        }

        self.slots.push(Slot {
            offset: self.free_space as u32,
            len: size as u32,
        });
        self.records.push(record.clone());
        self.free_space += size;
        self.occupied += size + SLOT_SIZE;

        Ok(())
    }

    /// Records in insertion order.
    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Slot directory in insertion order.
    #[inline]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bytes accounted against capacity (trailer + records + slots).
    #[inline]
    pub fn occupied_bytes(&self) -> usize {
        self.occupied
    }

    /// Offset of the first free byte in the record area.
    #[inline]
    pub fn free_space_offset(&self) -> usize {
        self.free_space
    }

    /// Next page of the chain, if any.
    #[inline]
    pub fn overflow(&self) -> Option<PageId> {
        self.overflow
    }

    pub fn set_overflow(&mut self, link: Option<PageId>) {
        self.overflow = link;
    }

    /// First record with the given id, scanning in insertion order.
    pub fn find(&self, id: i32) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Serialize the page into a fresh buffer.
    pub fn to_buf(&self) -> PageBuf {
        let mut buf = PageBuf::new();
        let data = buf.as_mut_slice();

        // Record area, packed from the start
        for (record, slot) in self.records.iter().zip(&self.slots) {
            let start = slot.offset as usize;
            let bytes = record.encode();
            data[start..start + bytes.len()].copy_from_slice(&bytes);
        }

        // Slot directory, packed backward from the overflow link
        for (i, slot) in self.slots.iter().enumerate() {
            let at = Self::slot_position(i);
            buf.put_u32(at, slot.offset);
            buf.put_u32(at + 4, slot.len);
        }

        PageTrailer {
            free_space: self.free_space as u32,
            slot_count: self.slots.len() as u32,
            overflow: self.overflow,
        }
        .write_to(&mut buf);

        buf
    }

    /// Rebuild a page from its serialized bytes.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the trailer or any slot points outside the
    /// page, or a record fails to decode.
    pub fn from_buf(buf: &PageBuf) -> Result<Self> {
        let trailer = PageTrailer::from_page(buf);
        let slot_count = trailer.slot_count as usize;
        let free_space = trailer.free_space as usize;

        let max_slots = (PAGE_SIZE - PageTrailer::SIZE) / SLOT_SIZE;
        if slot_count > max_slots {
            return Err(Error::Corrupted(format!(
                "slot count {} exceeds page capacity",
                slot_count
            )));
        }

        let directory_start = PageTrailer::OFFSET_OVERFLOW - slot_count * SLOT_SIZE;
        if free_space > directory_start {
            return Err(Error::Corrupted(format!(
                "free space cursor {} overlaps slot directory at {}",
                free_space, directory_start
            )));
        }

        let mut slots = Vec::with_capacity(slot_count);
        let mut records = Vec::with_capacity(slot_count);
        let mut used = 0usize;

        for i in 0..slot_count {
            let at = Self::slot_position(i);
            let slot = Slot {
                offset: buf.get_u32(at),
                len: buf.get_u32(at + 4),
            };

            let start = slot.offset as usize;
            let end = start + slot.len as usize;
            if end > free_space {
                return Err(Error::Corrupted(format!(
                    "slot {} ({}..{}) extends past free space cursor {}",
                    i, start, end, free_space
                )));
            }

            let record = Record::decode(&buf.as_slice()[start..end])?;
            if record.encoded_len() != slot.len as usize {
                return Err(Error::Corrupted(format!(
                    "slot {} length {} disagrees with record size {}",
                    i,
                    slot.len,
                    record.encoded_len()
                )));
            }

            used += slot.len as usize;
            slots.push(slot);
            records.push(record);
        }

        Ok(Self {
            records,
            slots,
            occupied: PageTrailer::SIZE + used + slot_count * SLOT_SIZE,
            free_space,
            overflow: trailer.overflow,
        })
    }

    /// Byte position of slot `i`; slot 0 is adjacent to the overflow link.
    #[inline]
    fn slot_position(i: usize) -> usize {
        PageTrailer::OFFSET_OVERFLOW - (i + 1) * SLOT_SIZE
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record_with_bio(id: i32, bio_len: usize) -> Record {
        Record::new(id, "", "b".repeat(bio_len), 0)
    }

    #[test]
    fn test_new_page_is_empty() {
        let page = Page::new();
        assert!(page.is_empty());
        assert_eq!(page.occupied_bytes(), PageTrailer::SIZE);
        assert_eq!(page.free_space_offset(), 0);
        assert_eq!(page.overflow(), None);
    }

    #[test]
    fn test_insert_updates_bookkeeping() {
        let mut page = Page::new();
        let a = Record::new(1, "Ann", "bio", 10);
        let b = Record::new(2, "Bob", "longer bio", 10);
        let (a_len, b_len) = (a.encoded_len(), b.encoded_len());

        page.insert(&a).unwrap();
        page.insert(&b).unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page.slots().len(), page.records().len());
        assert_eq!(page.slots()[0], Slot { offset: 0, len: a_len as u32 });
        assert_eq!(
            page.slots()[1],
            Slot { offset: a_len as u32, len: b_len as u32 }
        );
        assert_eq!(page.free_space_offset(), a_len + b_len);
        assert_eq!(
            page.occupied_bytes(),
            PageTrailer::SIZE + a_len + b_len + 2 * SLOT_SIZE
        );
    }

    #[test]
    fn test_insert_boundary_is_inclusive() {
        // trailer (12) + fixed record (36) + slot (8) + bio = 4096 exactly
        let exact = 4096 - PageTrailer::SIZE - 36 - SLOT_SIZE;

        let mut page = Page::new();
        assert!(matches!(
            page.insert(&record_with_bio(1, exact)),
            Err(Error::PageFull)
        ));
        assert!(page.is_empty());
        assert!(!Page::fits_empty(&record_with_bio(1, exact)));

        page.insert(&record_with_bio(1, exact - 1)).unwrap();
        assert_eq!(page.occupied_bytes(), 4095);
        assert!(Page::fits_empty(&record_with_bio(1, exact - 1)));

        // Not even an empty record fits now
        assert!(matches!(
            page.insert(&Record::new(2, "", "", 0)),
            Err(Error::PageFull)
        ));
    }

    #[test]
    fn test_serialized_layout() {
        let mut page = Page::new();
        let a = Record::new(1, "a", "", 0);
        let b = Record::new(2, "b", "", 0);
        let a_len = a.encoded_len() as u32;
        page.insert(&a).unwrap();
        page.insert(&b).unwrap();
        page.set_overflow(Some(PageId::new(7)));

        let buf = page.to_buf();

        // Records from the start
        assert_eq!(&buf.as_slice()[..a_len as usize], a.encode().as_slice());

        // Trailer
        assert_eq!(buf.get_u32(4092), 2 * a_len);
        assert_eq!(buf.get_u32(4088), 2);
        assert_eq!(buf.get_i32(4084), 7);

        // First slot closest to the overflow link
        assert_eq!(buf.get_u32(4076), 0);
        assert_eq!(buf.get_u32(4080), a_len);
        assert_eq!(buf.get_u32(4068), a_len);
        assert_eq!(buf.get_u32(4072), a_len);
    }

    #[test]
    fn test_roundtrip_empty_page() {
        let page = Page::new();
        let restored = Page::from_buf(&page.to_buf()).unwrap();
        assert_eq!(restored, page);
        assert_eq!(restored.overflow(), None);
    }

    #[test]
    fn test_roundtrip_full_page() {
        let mut page = Page::new();
        let mut id = 0;
        while page.insert(&Record::new(id, "name", "some bio text", id + 1)).is_ok() {
            id += 1;
        }
        page.set_overflow(Some(PageId::new(3)));

        let restored = Page::from_buf(&page.to_buf()).unwrap();
        assert_eq!(restored, page);
        assert!(restored.occupied_bytes() < PAGE_SIZE);
    }

    #[test]
    fn test_find_returns_first_match() {
        let mut page = Page::new();
        page.insert(&Record::new(4, "first", "", 0)).unwrap();
        page.insert(&Record::new(4, "second", "", 0)).unwrap();

        assert_eq!(page.find(4).unwrap().name(), "first");
        assert!(page.find(5).is_none());
    }

    #[test]
    fn test_from_buf_rejects_huge_slot_count() {
        let mut buf = PageBuf::new();
        PageTrailer {
            free_space: 0,
            slot_count: 10_000,
            overflow: None,
        }
        .write_to(&mut buf);

        assert!(matches!(Page::from_buf(&buf), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_from_buf_rejects_slot_past_cursor() {
        let mut page = Page::new();
        page.insert(&Record::new(1, "x", "y", 2)).unwrap();
        let mut buf = page.to_buf();
        buf.put_u32(PageTrailer::OFFSET_FREE_SPACE, 4);

        assert!(matches!(Page::from_buf(&buf), Err(Error::Corrupted(_))));
    }

    proptest! {
        #[test]
        fn prop_page_roundtrip(
            rows in proptest::collection::vec((any::<i32>(), "[a-z]{0,24}", ".{0,200}"), 0..40),
            link in proptest::option::of(0u32..1_000_000),
        ) {
            let mut page = Page::new();
            for (id, name, bio) in rows {
                if page.insert(&Record::new(id, name, bio, id.wrapping_add(1))).is_err() {
                    break;
                }
            }
            page.set_overflow(link.map(PageId::new));

            prop_assert!(page.occupied_bytes() < PAGE_SIZE);
            let restored = Page::from_buf(&page.to_buf()).unwrap();
            prop_assert_eq!(restored, page);
        }
    }
}
