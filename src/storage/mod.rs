//! Storage layer - disk I/O, page formats and record encoding.
//!
//! This module handles persistent storage:
//! - [`PagedStore`] - Whole-page file I/O and page allocation
//! - [`StoreMeta`] - Optional sidecar snapshot of directory and counter
//! - [`page`] - Page buffer, trailer and slotted page
//! - [`record`] - Record type and its byte layout

pub mod page;
mod paged_store;
pub mod record;
mod store_meta;

pub use paged_store::PagedStore;
pub use record::Record;
pub use store_meta::StoreMeta;
