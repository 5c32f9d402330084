//! Page types and layout.
//!
//! This module contains:
//! - [`PageBuf`] - The raw 4KB byte buffer read from and written to disk
//! - [`PageTrailer`] - Fixed metadata packed at the end of every page
//! - [`Page`] - The slotted record container built on top of both

#[allow(clippy::module_inception)]
mod page;
mod page_buf;
mod page_trailer;

pub use page::{Page, Slot, SLOT_SIZE};
pub use page_buf::PageBuf;
pub use page_trailer::PageTrailer;
