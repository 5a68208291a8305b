//! Property assessments (CSV only)

use super::load_csv;
use crate::access_log::AccessLog;
use crate::error::Result;
use crate::types::{parse_finite, zip_prefix, PropertyRecord};
use std::path::PathBuf;
use std::sync::Arc;

/// Loads `zip_code`, `market_value` and `total_livable_area` columns
///
/// The ZIP Code is the first five characters of the field and must be all
/// digits (ZIP+4 values are accepted). Unparsable numbers become `None`.
pub struct PropertyLoader {
    path: PathBuf,
    log: Arc<dyn AccessLog>,
    cache: Option<Vec<PropertyRecord>>,
}

impl PropertyLoader {
    pub fn new(path: impl Into<PathBuf>, log: Arc<dyn AccessLog>) -> Self {
        PropertyLoader {
            path: path.into(),
            log,
            cache: None,
        }
    }

    /// Parsed records, read from disk on the first call only
    pub fn load(&mut self) -> Result<&[PropertyRecord]> {
        let records = match self.cache.take() {
            Some(cached) => cached,
            None => load_csv(
                &self.path,
                self.log.as_ref(),
                ["zip_code", "market_value", "total_livable_area"],
                |[zip, market_value, livable_area]| {
                    Some(PropertyRecord {
                        zip_code: zip_prefix(zip)?.to_string(),
                        market_value: parse_finite(market_value),
                        livable_area: parse_finite(livable_area),
                    })
                },
            )?,
        };
        Ok(self.cache.insert(records).as_slice())
    }

    pub fn into_records(mut self) -> Result<Vec<PropertyRecord>> {
        self.load()?;
        Ok(self.cache.unwrap_or_default())
    }
}
