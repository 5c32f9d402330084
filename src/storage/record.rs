//! Record - one employee row and its self-describing byte layout.
//!
//! # Layout
//! ```text
//! Offset  Size   Field
//! ------  -----  -----
//! 0       4      offset of id          (always 20)
//! 4       4      offset of name_len
//! 8       4      offset of bio_len
//! 12      4      offset of manager_id
//! 16      4      offset of end         (== encoded length)
//! 20      4      id                    (i32)
//! 24      4      name_len              (u32)
//! 28      n      name bytes
//! 28+n    4      bio_len               (u32)
//! 32+n    b      bio bytes
//! 32+n+b  4      manager_id            (i32)
//! ```
//! All integers are little-endian. Offsets are relative to the record start,
//! so any field can be located without walking the variable-length ones.

use crate::common::{Error, Result};

/// Size of the five-offset header.
pub const RECORD_HEADER_SIZE: usize = 5 * 4;

/// Encoded size of a record with empty name and bio.
pub const RECORD_FIXED_SIZE: usize = RECORD_HEADER_SIZE + 4 * 4;

/// One employee row. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: i32,
    name: String,
    bio: String,
    manager_id: i32,
}

impl Record {
    pub fn new(id: i32, name: impl Into<String>, bio: impl Into<String>, manager_id: i32) -> Self {
        Self {
            id,
            name: name.into(),
            bio: bio.into(),
            manager_id,
        }
    }

    #[inline]
    pub fn id(&self) -> i32 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn bio(&self) -> &str {
        &self.bio
    }

    #[inline]
    pub fn manager_id(&self) -> i32 {
        self.manager_id
    }

    /// Number of bytes [`encode`](Self::encode) produces.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        RECORD_FIXED_SIZE + self.name.len() + self.bio.len()
    }

    /// Serialize into a fresh buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Append the serialized record to `out`.
    ///
    /// Lengths are written as `u32`; callers only store records that fit in a
    /// page, far below that limit.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let name_len = self.name.len() as u32;
        let bio_len = self.bio.len() as u32;

        let off_id = RECORD_HEADER_SIZE as u32;
        let off_name = off_id + 4;
        let off_bio = off_name + 4 + name_len;
        let off_manager = off_bio + 4 + bio_len;
        let off_end = off_manager + 4;

        for offset in [off_id, off_name, off_bio, off_manager, off_end] {
            out.extend_from_slice(&offset.to_le_bytes());
        }

        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&name_len.to_le_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(&bio_len.to_le_bytes());
        out.extend_from_slice(self.bio.as_bytes());
        out.extend_from_slice(&self.manager_id.to_le_bytes());
    }

    /// Deserialize a record from the start of `data`.
    ///
    /// Every offset and length is checked against `data`; nothing relies on
    /// terminators.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < RECORD_HEADER_SIZE {
            return Err(Error::Corrupted(format!(
                "record header needs {} bytes, have {}",
                RECORD_HEADER_SIZE,
                data.len()
            )));
        }

        let off_id = read_u32(data, 0)? as usize;
        let off_name = read_u32(data, 4)? as usize;
        let off_bio = read_u32(data, 8)? as usize;
        let off_manager = read_u32(data, 12)? as usize;
        let off_end = read_u32(data, 16)? as usize;

        if off_end > data.len() {
            return Err(Error::Corrupted(format!(
                "record end offset {} past buffer of {} bytes",
                off_end,
                data.len()
            )));
        }
        let data = &data[..off_end];

        let id = read_i32(data, off_id)?;
        let name = read_text(data, off_name, "name")?;
        let bio = read_text(data, off_bio, "bio")?;
        let manager_id = read_i32(data, off_manager)?;

        Ok(Self {
            id,
            name,
            bio,
            manager_id,
        })
    }
}

fn field(data: &[u8], at: usize, len: usize) -> Result<&[u8]> {
    at.checked_add(len)
        .and_then(|end| data.get(at..end))
        .ok_or_else(|| {
            Error::Corrupted(format!(
                "record field at {}+{} outside {} bytes",
                at,
                len,
                data.len()
            ))
        })
}

fn read_u32(data: &[u8], at: usize) -> Result<u32> {
    let bytes = field(data, at, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_i32(data: &[u8], at: usize) -> Result<i32> {
    read_u32(data, at).map(|v| v as i32)
}

fn read_text(data: &[u8], at: usize, what: &str) -> Result<String> {
    let len = read_u32(data, at)? as usize;
    let bytes = field(data, at + 4, len)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::Corrupted(format!("record {} is not valid UTF-8", what)))
}

// ============================================================================
// TESTS
// ============================================================================
