//! Vaccination counts per ZIP Code and day (CSV or JSON)

use super::load_csv;
use crate::access_log::AccessLog;
use crate::error::{CivicError, Result};
use crate::types::{is_valid_zip, parse_count_or_zero, parse_etl_date, VaccinationRecord};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const COLUMNS: [&str; 4] = [
    "zip_code",
    "etl_timestamp",
    "partially_vaccinated",
    "fully_vaccinated",
];

/// Source layout, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// `.csv` or `.json`, case-insensitive
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }
}

/// JSON element; absent keys read as `null`
#[derive(Debug, Deserialize)]
struct RawVaccination {
    #[serde(default)]
    zip_code: Value,
    #[serde(default)]
    etl_timestamp: Value,
    #[serde(default)]
    partially_vaccinated: Value,
    #[serde(default)]
    fully_vaccinated: Value,
}

/// Loads vaccination records from CSV or a JSON array of objects
///
/// Rows need a five-digit ZIP Code and a `YYYY-MM-DD hh:mm:ss` timestamp;
/// missing or malformed counts read as 0.
pub struct VaccinationLoader {
    path: PathBuf,
    log: Arc<dyn AccessLog>,
    cache: Option<Vec<VaccinationRecord>>,
}

impl VaccinationLoader {
    pub fn new(path: impl Into<PathBuf>, log: Arc<dyn AccessLog>) -> Self {
        VaccinationLoader {
            path: path.into(),
            log,
            cache: None,
        }
    }

    /// Parsed records, read from disk on the first call only
    pub fn load(&mut self) -> Result<&[VaccinationRecord]> {
        let records = match self.cache.take() {
            Some(cached) => cached,
            None => match SourceFormat::from_path(&self.path) {
                Some(SourceFormat::Csv) => load_csv(
                    &self.path,
                    self.log.as_ref(),
                    COLUMNS,
                    |[zip, timestamp, partial, full]| to_record(zip, timestamp, partial, full),
                )?,
                Some(SourceFormat::Json) => self.load_json()?,
                None => return Err(CivicError::UnsupportedFormat(self.path.clone())),
            },
        };
        Ok(self.cache.insert(records).as_slice())
    }

    pub fn into_records(mut self) -> Result<Vec<VaccinationRecord>> {
        self.load()?;
        Ok(self.cache.unwrap_or_default())
    }

    fn load_json(&self) -> Result<Vec<VaccinationRecord>> {
        self.log.log(&self.path.display().to_string());

        let file = File::open(&self.path).map_err(|e| CivicError::io(&self.path, e))?;
        let raw: Vec<RawVaccination> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| CivicError::Json {
                path: self.path.clone(),
                source: e,
            })?;

        let total = raw.len();
        let records: Vec<VaccinationRecord> = raw
            .iter()
            .filter_map(|item| {
                to_record(
                    json_text(&item.zip_code).trim(),
                    json_text(&item.etl_timestamp).trim(),
                    json_text(&item.partially_vaccinated).trim(),
                    json_text(&item.fully_vaccinated).trim(),
                )
            })
            .collect();

        tracing::debug!(
            path = %self.path.display(),
            loaded = records.len(),
            skipped = total - records.len(),
            "loaded JSON records"
        );
        Ok(records)
    }
}

fn to_record(zip: &str, timestamp: &str, partial: &str, full: &str) -> Option<VaccinationRecord> {
    if !is_valid_zip(zip) {
        return None;
    }
    Some(VaccinationRecord {
        zip_code: zip.to_string(),
        date: parse_etl_date(timestamp)?,
        partial: parse_count_or_zero(partial),
        full: parse_count_or_zero(full),
    })
}

/// JSON scalar as text: strings verbatim, everything else in JSON spelling
fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
