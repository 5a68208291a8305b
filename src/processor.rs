//! Aggregate queries over the loaded datasets
//!
//! [`DataProcessor`] owns the parsed records and memoizes derived values in
//! explicit cache fields, so repeated menu queries do not rescan the data.

use crate::access_log::AccessLog;
use crate::config::Config;
use crate::error::Result;
use crate::loader::{PopulationLoader, PropertyLoader, VaccinationLoader};
use crate::types::{
    PopulationRecord, PropertyMetric, PropertyRecord, VaccinationKind, VaccinationRecord,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Query engine over population, property and vaccination records
pub struct DataProcessor {
    population: HashMap<String, u64>,
    properties: Vec<PropertyRecord>,
    vaccinations: Vec<VaccinationRecord>,

    // Memoized results
    total_population: Option<u64>,
    averages: HashMap<(PropertyMetric, String), i64>,
    value_per_capita: HashMap<String, i64>,
}

impl DataProcessor {
    /// Build from already-parsed records
    ///
    /// A ZIP Code listed twice in the population data keeps its last count.
    pub fn new(
        population: Vec<PopulationRecord>,
        properties: Vec<PropertyRecord>,
        vaccinations: Vec<VaccinationRecord>,
    ) -> Self {
        DataProcessor {
            population: population
                .into_iter()
                .map(|r| (r.zip_code, r.population))
                .collect(),
            properties,
            vaccinations,
            total_population: None,
            averages: HashMap::new(),
            value_per_capita: HashMap::new(),
        }
    }

    /// Load every dataset named in `config`
    ///
    /// Each file gets its own loader and tokenizer; with the `parallel`
    /// feature they are read concurrently.
    pub fn load(config: &Config, log: Arc<dyn AccessLog>) -> Result<Self> {
        let population = || {
            load_optional(config.population.as_deref(), |path| {
                PopulationLoader::new(path, log.clone()).into_records()
            })
        };
        let properties = || {
            load_optional(config.properties.as_deref(), |path| {
                PropertyLoader::new(path, log.clone()).into_records()
            })
        };
        let vaccinations = || {
            load_optional(config.covid.as_deref(), |path| {
                VaccinationLoader::new(path, log.clone()).into_records()
            })
        };

        #[cfg(feature = "parallel")]
        let (population, (properties, vaccinations)) =
            rayon::join(population, || rayon::join(properties, vaccinations));

        #[cfg(not(feature = "parallel"))]
        let (population, properties, vaccinations) = (population(), properties(), vaccinations());

        let processor = Self::new(population?, properties?, vaccinations?);
        tracing::debug!(
            zip_codes = processor.population.len(),
            properties = processor.properties.len(),
            vaccinations = processor.vaccinations.len(),
            "datasets loaded"
        );
        Ok(processor)
    }

    /// Sum of the population over all ZIP Codes, saturating at `u64::MAX`
    pub fn total_population(&mut self) -> u64 {
        let population = &self.population;
        *self.total_population.get_or_insert_with(|| {
            population
                .values()
                .fold(0u64, |total, &count| total.saturating_add(count))
        })
    }

    /// Vaccinations of `kind` on `date` divided by population, per ZIP Code
    ///
    /// Only ZIP Codes with a known, non-zero population and a positive count
    /// appear. Values are rounded to four decimal places. When several
    /// records exist for one ZIP Code and day, the last positive one wins.
    pub fn vaccinations_per_capita(
        &self,
        kind: VaccinationKind,
        date: NaiveDate,
    ) -> BTreeMap<String, f64> {
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for record in self.vaccinations.iter().filter(|r| r.date == date) {
            let count = record.count(kind);
            if count > 0 && self.population.contains_key(&record.zip_code) {
                counts.insert(&record.zip_code, count);
            }
        }

        counts
            .into_iter()
            .filter_map(|(zip, count)| {
                let population = self.population.get(zip).copied().unwrap_or(0);
                if population == 0 {
                    return None;
                }
                let ratio = count as f64 / population as f64;
                Some((zip.to_string(), (ratio * 10_000.0).round() / 10_000.0))
            })
            .collect()
    }

    /// Mean of `metric` over properties in `zip`, truncated; 0 if none have it
    pub fn average(&mut self, zip: &str, metric: PropertyMetric) -> i64 {
        let key = (metric, zip.to_string());
        if let Some(&cached) = self.averages.get(&key) {
            return cached;
        }

        let (sum, count) = self
            .properties_in(zip)
            .filter_map(|p| metric.value(p))
            .fold((0.0, 0u64), |(sum, count), v| (sum + v, count + 1));
        let average = if count == 0 {
            0
        } else {
            (sum / count as f64) as i64
        };

        self.averages.insert(key, average);
        average
    }

    /// Total market value in `zip` divided by its population, truncated
    ///
    /// 0 when the population is unknown or zero, or nothing has a value.
    pub fn market_value_per_capita(&mut self, zip: &str) -> i64 {
        if let Some(&cached) = self.value_per_capita.get(zip) {
            return cached;
        }

        let total: f64 = self
            .properties_in(zip)
            .filter_map(|p| p.market_value)
            .sum();
        let population = self.population.get(zip).copied().unwrap_or(0);
        let result = if population == 0 || total == 0.0 {
            0
        } else {
            (total / population as f64) as i64
        };

        self.value_per_capita.insert(zip.to_string(), result);
        result
    }

    /// Market value per square foot of livable area in `zip`, truncated
    ///
    /// Only properties with both values and a positive area count.
    pub fn market_value_per_sq_ft(&self, zip: &str) -> i64 {
        let (value, area) = self
            .properties_in(zip)
            .filter_map(|p| match (p.market_value, p.livable_area) {
                (Some(value), Some(area)) if area > 0.0 => Some((value, area)),
                _ => None,
            })
            .fold((0.0, 0.0), |(v, a), (value, area)| (v + value, a + area));

        if area == 0.0 {
            0
        } else {
            (value / area) as i64
        }
    }

    fn properties_in<'a>(&'a self, zip: &'a str) -> impl Iterator<Item = &'a PropertyRecord> + 'a {
        self.properties.iter().filter(move |p| p.zip_code == zip)
    }
}

fn load_optional<T, F>(path: Option<&Path>, load: F) -> Result<Vec<T>>
where
    F: FnOnce(&Path) -> Result<Vec<T>>,
{
    match path {
        Some(path) => load(path),
        None => Ok(Vec::new()),
    }
}
