//! Population counts per ZIP Code (CSV only)

use super::load_csv;
use crate::access_log::AccessLog;
use crate::error::Result;
use crate::types::{is_valid_zip, parse_count, PopulationRecord};
use std::path::PathBuf;
use std::sync::Arc;

/// Loads `zip_code,population` rows
///
/// A row is skipped unless the ZIP Code is exactly five digits and the
/// population is a plain non-negative integer.
pub struct PopulationLoader {
    path: PathBuf,
    log: Arc<dyn AccessLog>,
    cache: Option<Vec<PopulationRecord>>,
}

impl PopulationLoader {
    pub fn new(path: impl Into<PathBuf>, log: Arc<dyn AccessLog>) -> Self {
        PopulationLoader {
            path: path.into(),
            log,
            cache: None,
        }
    }

    /// Parsed records, read from disk on the first call only
    pub fn load(&mut self) -> Result<&[PopulationRecord]> {
        let records = match self.cache.take() {
            Some(cached) => {
                tracing::debug!(path = %self.path.display(), "population cache hit");
                cached
            }
            None => load_csv(
                &self.path,
                self.log.as_ref(),
                ["zip_code", "population"],
                |[zip, population]| {
                    if !is_valid_zip(zip) {
                        return None;
                    }
                    Some(PopulationRecord {
                        zip_code: zip.to_string(),
                        population: parse_count(population)?,
                    })
                },
            )?,
        };
        Ok(self.cache.insert(records).as_slice())
    }

    /// Load (if needed) and hand over the records
    pub fn into_records(mut self) -> Result<Vec<PopulationRecord>> {
        self.load()?;
        Ok(self.cache.unwrap_or_default())
    }
}
