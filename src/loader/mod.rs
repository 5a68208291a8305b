//! Record loaders for the civic datasets
//!
//! Each loader owns one source path and an injected [`AccessLog`]. The first
//! `load()` logs the file name, streams the rows through [`CsvReader`] and
//! caches the typed records; later calls return the cache without touching
//! the file.
//!
//! Rows are looked up by header name. A row is skipped when it has fewer than
//! `max(required position) + 1` fields or fails domain validation. A format
//! error or I/O failure aborts the whole load.

mod population;
mod property;
mod vaccination;

pub use population::PopulationLoader;
pub use property::PropertyLoader;
pub use vaccination::{SourceFormat, VaccinationLoader};

use crate::access_log::AccessLog;
use crate::csv_reader::CsvReader;
use crate::error::Result;
use std::path::Path;

/// Stream a CSV file into records
///
/// `parse` receives the trimmed `columns` fields of each data row in the
/// order given and returns `None` to skip the row.
pub(crate) fn load_csv<T, F, const N: usize>(
    path: &Path,
    log: &dyn AccessLog,
    columns: [&str; N],
    mut parse: F,
) -> Result<Vec<T>>
where
    F: FnMut([&str; N]) -> Option<T>,
{
    log.log(&path.display().to_string());

    let mut reader = CsvReader::open(path)?.has_header(true);
    let header = match reader.read_header()? {
        Some(header) => header,
        None => {
            tracing::debug!(path = %path.display(), "empty CSV file");
            return Ok(Vec::new());
        }
    };

    let required = match header.require(columns) {
        Ok(required) => required,
        Err(missing) => {
            tracing::warn!(path = %path.display(), column = missing, "missing required column");
            return Ok(Vec::new());
        }
    };

    let mut records = Vec::new();
    let mut skipped = 0u64;
    while let Some(row) = reader.read_row()? {
        let record = required
            .extract(&row)
            .and_then(|fields| parse(fields.map(str::trim)));
        match record {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    tracing::debug!(
        path = %path.display(),
        loaded = records.len(),
        skipped,
        "loaded CSV records"
    );
    Ok(records)
}
