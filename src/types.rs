//! Type definitions for civic records

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// Timestamp layout used by the vaccination sources
pub const ETL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Population count for one ZIP Code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationRecord {
    pub zip_code: String,
    pub population: u64,
}

/// One property assessment
///
/// Numeric fields that could not be parsed are `None`; the property still
/// counts toward anything that does not need the missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    pub zip_code: String,
    pub market_value: Option<f64>,
    pub livable_area: Option<f64>,
}

/// Vaccination counts for one ZIP Code on one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaccinationRecord {
    pub zip_code: String,
    pub date: NaiveDate,
    pub partial: u64,
    pub full: u64,
}

impl VaccinationRecord {
    /// Count for the requested dose kind
    pub fn count(&self, kind: VaccinationKind) -> u64 {
        match kind {
            VaccinationKind::Partial => self.partial,
            VaccinationKind::Full => self.full,
        }
    }
}

/// Dose kind selected in per-capita queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaccinationKind {
    Partial,
    Full,
}

impl FromStr for VaccinationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "partial" => Ok(VaccinationKind::Partial),
            "full" => Ok(VaccinationKind::Full),
            other => Err(format!("unknown vaccination type: {}", other)),
        }
    }
}

impl fmt::Display for VaccinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaccinationKind::Partial => write!(f, "partial"),
            VaccinationKind::Full => write!(f, "full"),
        }
    }
}

/// Property value averaged by ZIP Code queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyMetric {
    MarketValue,
    LivableArea,
}

impl PropertyMetric {
    /// The metric's value on `property`, if present
    pub fn value(&self, property: &PropertyRecord) -> Option<f64> {
        match self {
            PropertyMetric::MarketValue => property.market_value,
            PropertyMetric::LivableArea => property.livable_area,
        }
    }
}

/// Exactly five ASCII digits
pub fn is_valid_zip(raw: &str) -> bool {
    raw.len() == 5 && raw.bytes().all(|b| b.is_ascii_digit())
}

/// First five characters of `raw` when they are all digits (ZIP+4 friendly)
pub fn zip_prefix(raw: &str) -> Option<&str> {
    let prefix = raw.get(..5)?;
    if is_valid_zip(prefix) {
        Some(prefix)
    } else {
        None
    }
}

/// Parse a non-negative integer made only of ASCII digits
pub fn parse_count(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Parse a finite floating point value
pub fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Count that defaults to 0 when empty, `null` or malformed
pub fn parse_count_or_zero(raw: &str) -> u64 {
    if raw.is_empty() || raw == "null" {
        return 0;
    }
    raw.parse().unwrap_or(0)
}

/// Date part of an ETL timestamp; one pair of surrounding quotes is tolerated
pub fn parse_etl_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let unquoted = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let unquoted = unquoted.strip_suffix('"').unwrap_or(unquoted);
    NaiveDateTime::parse_from_str(unquoted.trim(), ETL_TIMESTAMP_FORMAT)
        .ok()
        .map(|ts| ts.date())
}
