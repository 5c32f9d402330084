//! Ingest - load comma-separated employee rows into an index.
//!
//! Each row is exactly four fields in fixed order:
//! ```text
//! id,name,bio,manager_id
//! ```
//! There is no quoting or escaping. A comma inside the name or bio splits the
//! row into extra fields, and such a row is rejected rather than guessed at.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::{Error, Result};
use crate::index::HashIndex;
use crate::storage::Record;

/// Number of fields in a row.
pub const FIELD_COUNT: usize = 4;

/// Outcome of a bulk load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    /// Records inserted.
    pub records: usize,
    /// Pages allocated by the index after the load.
    pub pages: u32,
}

/// Parse one row. `line` is the 1-based line number used in errors.
pub fn parse_line(text: &str, line: usize) -> Result<Record> {
    let text = text.strip_suffix('\r').unwrap_or(text);
    let fields: Vec<&str> = text.split(',').collect();

    if fields.len() != FIELD_COUNT {
        return Err(Error::MalformedRow {
            line,
            reason: format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
        });
    }

    let id = parse_int(fields[0], "id", line)?;
    let manager_id = parse_int(fields[3], "manager_id", line)?;

    Ok(Record::new(id, fields[1], fields[2], manager_id))
}

fn parse_int(field: &str, what: &str, line: usize) -> Result<i32> {
    field.trim().parse().map_err(|_| Error::MalformedRow {
        line,
        reason: format!("{} {:?} is not a 32-bit integer", what, field),
    })
}

/// Insert every row from `reader` into `index`.
///
/// Blank lines are skipped. The load stops at the first malformed row; rows
/// before it stay inserted.
pub fn load_csv<R: BufRead>(index: &mut HashIndex, reader: R) -> Result<IngestSummary> {
    let mut records = 0;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = parse_line(&line, line_no).map_err(|e| {
            tracing::warn!("Rejected row: {}", e);
            e
        })?;
        index.insert(record)?;
        records += 1;
    }

    let summary = IngestSummary {
        records,
        pages: index.page_count(),
    };
    tracing::info!(
        "Loaded {} records into {} pages",
        summary.records,
        summary.pages
    );
    Ok(summary)
}

/// Open `path` and [`load_csv`] from it.
pub fn load_csv_path<P: AsRef<Path>>(index: &mut HashIndex, path: P) -> Result<IngestSummary> {
    let file = File::open(path)?;
    load_csv(index, BufReader::new(file))
}
