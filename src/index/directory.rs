//! Bucket directory - fixed table from bucket number to chain head.

use crate::common::PageId;

/// Maps each bucket to the first page of its chain.
///
/// The number of buckets is fixed when the directory is created and never
/// changes. There is no splitting or rehashing; a skewed key distribution
/// simply produces longer overflow chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketDirectory {
    heads: Vec<Option<PageId>>,
}

impl BucketDirectory {
    /// Create a directory with every bucket unallocated.
    ///
    /// # Panics
    /// Panics if `bucket_count` is 0.
    pub fn new(bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "bucket_count must be > 0");
        Self {
            heads: vec![None; bucket_count],
        }
    }

    /// Rebuild a directory from saved heads.
    pub fn from_heads(heads: Vec<Option<PageId>>) -> Self {
        assert!(!heads.is_empty(), "bucket_count must be > 0");
        Self { heads }
    }

    /// Number of buckets.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.heads.len()
    }

    /// Bucket for a key: `id mod bucket_count`.
    ///
    /// Uses the Euclidean remainder so negative ids land in range too.
    #[inline]
    pub fn bucket_for(&self, id: i32) -> usize {
        (id as i64).rem_euclid(self.heads.len() as i64) as usize
    }

    /// Head page of a bucket, `None` if the bucket has never been used or is
    /// out of range.
    #[inline]
    pub fn head(&self, bucket: usize) -> Option<PageId> {
        self.heads.get(bucket).copied().flatten()
    }

    /// Whether `bucket` is one of this directory's buckets.
    #[inline]
    pub fn contains(&self, bucket: usize) -> bool {
        bucket < self.heads.len()
    }

    /// Point a bucket at the first page of its chain.
    ///
    /// # Panics
    /// Panics if `bucket` is not less than `bucket_count()`.
    pub fn set_head(&mut self, bucket: usize, page_id: PageId) {
        self.heads[bucket] = Some(page_id);
    }

    /// Number of buckets with a page.
    pub fn allocated(&self) -> usize {
        self.heads.iter().filter(|h| h.is_some()).count()
    }

    /// Raw heads, for snapshotting.
    pub fn heads(&self) -> &[Option<PageId>] {
        &self.heads
    }
}
