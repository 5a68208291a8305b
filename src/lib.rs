//! # civicstream
//!
//! Streaming ingestion and ad-hoc queries over civic datasets: population
//! counts, property assessments and vaccination records.
//!
//! The core is a character-by-character CSV tokenizer that never holds a
//! whole file in memory. It handles quoted fields with embedded delimiters,
//! newlines and doubled quotes, and it normalizes `\r`, `\n` and `\r\n` line
//! endings.
//!
//! ## Quick Start - Tokenizing
//!
//! ```no_run
//! use civicstream::csv::CsvParser;
//!
//! let mut parser = CsvParser::open("population.csv")?;
//! while let Some(row) = parser.read_row()? {
//!     println!("{:?}", row);
//! }
//! # Ok::<(), civicstream::CivicError>(())
//! ```
//!
//! ## Quick Start - Loading and Querying
//!
//! ```no_run
//! use civicstream::{AccessLog, DataProcessor, FileAccessLog, PropertyMetric};
//! use civicstream::config::Config;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let config = Config {
//!     properties: Some(PathBuf::from("properties.csv")),
//!     ..Config::default()
//! };
//! let log: Arc<dyn AccessLog> = Arc::new(FileAccessLog::stderr());
//! let mut processor = DataProcessor::load(&config, log)?;
//! println!("{}", processor.average("19104", PropertyMetric::MarketValue));
//! # Ok::<(), civicstream::CivicError>(())
//! ```
//!
//! ## Error kinds
//!
//! I/O failures and quoting-grammar violations are distinct variants of
//! [`CivicError`]; see [`CivicError::is_format_error`].

pub mod access_log;
pub mod config;
pub mod csv;
pub mod csv_reader;
pub mod error;
pub mod loader;
pub mod menu;
pub mod processor;
pub mod types;

pub use access_log::{AccessLog, FileAccessLog, MemoryAccessLog};
pub use csv_reader::{CsvReader, HeaderIndex};
pub use error::{CivicError, FormatErrorKind, Result};
pub use processor::DataProcessor;
pub use types::{PropertyMetric, VaccinationKind};
