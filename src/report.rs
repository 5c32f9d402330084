//! Lookup reports for display.

use std::fmt;

use crate::storage::Record;

/// Printable outcome of one lookup.
///
/// # Example
/// ```
/// use bucketdb::{LookupReport, Record};
///
/// let r = Record::new(1, "Ann", "Engineer", 0);
/// let found = LookupReport::new(1, Some(&r)).to_string();
/// assert!(found.starts_with("\tID: 1\n"));
///
/// let missing = LookupReport::new(2, None).to_string();
/// assert_eq!(missing, "Employee not found with id 2");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LookupReport<'a> {
    id: i32,
    record: Option<&'a Record>,
}

impl<'a> LookupReport<'a> {
    pub fn new(id: i32, record: Option<&'a Record>) -> Self {
        Self { id, record }
    }

    /// Whether the lookup matched.
    pub fn found(&self) -> bool {
        self.record.is_some()
    }
}

impl fmt::Display for LookupReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record {
            Some(r) => {
                writeln!(f, "\tID: {}", r.id())?;
                writeln!(f, "\tNAME: {}", r.name())?;
                writeln!(f, "\tBIO: {}", r.bio())?;
                write!(f, "\tMANAGER_ID: {}", r.manager_id())
            }
            None => write!(f, "Employee not found with id {}", self.id),
        }
    }
}
