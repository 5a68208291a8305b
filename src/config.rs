//! Command-line configuration
//!
//! Arguments use the `--name=value` form. Unknown names, repeated names and
//! positional arguments are rejected by the parser.

use crate::error::{CivicError, Result};
use crate::loader::SourceFormat;
use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Data sources and log destination
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "civicstream",
    about = "Query civic population, property and vaccination datasets"
)]
pub struct Config {
    /// Population CSV (zip_code, population)
    #[arg(long, value_name = "FILE")]
    pub population: Option<PathBuf>,

    /// Property CSV (zip_code, market_value, total_livable_area)
    #[arg(long, value_name = "FILE")]
    pub properties: Option<PathBuf>,

    /// Vaccination data, .csv or .json
    #[arg(long, value_name = "FILE")]
    pub covid: Option<PathBuf>,

    /// Access log file (appended); stderr when absent
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

/// Which datasets were supplied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sources {
    pub population: bool,
    pub properties: bool,
    pub covid: bool,
}

impl Config {
    /// Check that every data file is readable and the vaccination format is known
    pub fn validate(&self) -> Result<()> {
        for path in self.data_files() {
            let readable = File::open(path)
                .and_then(|f| f.metadata())
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !readable {
                return Err(CivicError::InvalidArgument(format!(
                    "Cannot read file: {}",
                    path.display()
                )));
            }
        }

        if let Some(covid) = &self.covid {
            if SourceFormat::from_path(covid).is_none() {
                return Err(CivicError::InvalidArgument(format!(
                    "COVID file must be .csv or .json: {}",
                    covid.display()
                )));
            }
        }
        Ok(())
    }

    /// Supplied data files, in population, properties, covid order
    pub fn data_files(&self) -> impl Iterator<Item = &Path> {
        [&self.population, &self.properties, &self.covid]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }

    pub fn sources(&self) -> Sources {
        Sources {
            population: self.population.is_some(),
            properties: self.properties.is_some(),
            covid: self.covid.is_some(),
        }
    }
}
