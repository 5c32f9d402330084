//! Index structures.
//!
//! - [`BucketDirectory`] - Fixed bucket-to-chain-head table
//! - [`HashIndex`] - Static hash index with overflow chaining

mod directory;
mod hash_index;

pub use directory::BucketDirectory;
pub use hash_index::HashIndex;
