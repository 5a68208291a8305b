//! CSV file reading with streaming support
//!
//! [`CsvReader`] wraps the row tokenizer with header handling, and
//! [`HeaderIndex`] turns a header row into a name-to-position lookup so
//! loaders can address columns by name.

use crate::csv::{CharSource, CsvParser};
use crate::error::Result;
use indexmap::IndexMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// CSV file reader with streaming capabilities
///
/// Reads CSV files row by row using an iterator pattern.
/// Memory usage is bounded by the largest single row.
///
/// # Examples
///
/// ```no_run
/// use civicstream::csv_reader::CsvReader;
///
/// let mut reader = CsvReader::open("data.csv")?;
///
/// for row_result in reader.rows() {
///     let row = row_result?;
///     println!("{:?}", row);
/// }
/// # Ok::<(), civicstream::CivicError>(())
/// ```
///
/// # With Headers
///
/// ```no_run
/// use civicstream::csv_reader::CsvReader;
///
/// let mut reader = CsvReader::open("data.csv")?.has_header(true);
///
/// if let Some(header) = reader.read_header()? {
///     println!("zip_code at {:?}", header.position("zip_code"));
/// }
///
/// while let Some(row) = reader.read_row()? {
///     // Data rows only, header already consumed
/// }
/// # Ok::<(), civicstream::CivicError>(())
/// ```
pub struct CsvReader<R = File> {
    parser: CsvParser<R>,
    row_count: u64,
    has_header: bool,
    header_read: bool,
    headers: Vec<String>,
    failed: bool,
}

impl CsvReader<File> {
    /// Open a CSV file for streaming reads
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_parser(CsvParser::open(path)?))
    }
}

impl<R: Read> CsvReader<R> {
    /// Read CSV from any reader
    pub fn from_reader(reader: R) -> Self {
        Self::with_parser(CsvParser::new(CharSource::from_reader(reader)))
    }

    fn with_parser(parser: CsvParser<R>) -> Self {
        CsvReader {
            parser,
            row_count: 0,
            has_header: false,
            header_read: false,
            headers: Vec::new(),
            failed: false,
        }
    }

    /// Indicate that the first row contains headers (builder pattern)
    ///
    /// When set to `true`, the first row is stored and accessible via
    /// `headers()`; `read_row()` and the iterator only yield data rows.
    pub fn has_header(mut self, has: bool) -> Self {
        self.has_header = has;
        self
    }

    /// Header row if it has been read
    pub fn headers(&self) -> Option<&[String]> {
        if self.header_read {
            Some(&self.headers)
        } else {
            None
        }
    }

    /// Read the header row (if not already read) and build its lookup
    ///
    /// Returns `Ok(None)` for an empty input.
    pub fn read_header(&mut self) -> Result<Option<HeaderIndex>> {
        if !self.header_read {
            match self.parser.read_row()? {
                Some(row) => {
                    self.headers = row;
                    self.header_read = true;
                }
                None => return Ok(None),
            }
        }
        Ok(Some(HeaderIndex::from_row(&self.headers)))
    }

    /// Read a single data row
    ///
    /// Returns `Ok(None)` when EOF is reached.
    pub fn read_row(&mut self) -> Result<Option<Vec<String>>> {
        if self.has_header && !self.header_read && self.read_header()?.is_none() {
            return Ok(None);
        }

        let row = self.parser.read_row()?;
        if row.is_some() {
            self.row_count += 1;
        }
        Ok(row)
    }

    /// Get iterator over data rows
    ///
    /// The iterator stops after the first error; the tokenizer cannot
    /// resynchronize mid-stream.
    pub fn rows(&mut self) -> CsvRowIterator<'_, R> {
        CsvRowIterator { reader: self }
    }

    /// Number of data rows read so far
    pub fn row_count(&self) -> u64 {
        self.row_count
    }
}

/// Iterator over CSV rows
pub struct CsvRowIterator<'a, R> {
    reader: &'a mut CsvReader<R>,
}

impl<'a, R: Read> Iterator for CsvRowIterator<'a, R> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.failed {
            return None;
        }
        match self.reader.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => {
                self.reader.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Name-to-position lookup built from a header row
///
/// Names are trimmed and lower-cased; a leading byte-order mark on the first
/// column is dropped. When a name repeats, the first position wins.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: IndexMap<String, usize>,
}

impl HeaderIndex {
    pub fn from_row(row: &[String]) -> Self {
        let mut columns = IndexMap::with_capacity(row.len());
        for (i, name) in row.iter().enumerate() {
            let name = name.trim_start_matches('\u{FEFF}').trim().to_lowercase();
            columns.entry(name).or_insert(i);
        }
        HeaderIndex { columns }
    }

    /// Position of column `name` (case-insensitive)
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.get(name.trim().to_lowercase().as_str()).copied()
    }

    /// Positions of all `names`, or the first missing name
    pub fn require<'n, const N: usize>(
        &self,
        names: [&'n str; N],
    ) -> std::result::Result<RequiredColumns<N>, &'n str> {
        let mut positions = [0usize; N];
        for (slot, name) in positions.iter_mut().zip(names) {
            *slot = self.position(name).ok_or(name)?;
        }
        Ok(RequiredColumns { positions })
    }

    /// Column names in header order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Resolved positions of the columns a loader needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredColumns<const N: usize> {
    positions: [usize; N],
}

impl<const N: usize> RequiredColumns<N> {
    pub fn positions(&self) -> [usize; N] {
        self.positions
    }

    /// Minimum field count a row needs: `max(position) + 1`
    pub fn min_fields(&self) -> usize {
        self.positions.iter().max().map_or(0, |m| m + 1)
    }

    /// Fields of `row` in required-column order, or `None` if the row is too short
    pub fn extract<'r>(&self, row: &'r [String]) -> Option<[&'r str; N]> {
        if row.len() < self.min_fields() {
            return None;
        }
        Some(self.positions.map(|i| row[i].as_str()))
    }
}
