//! Streaming CSV row tokenizer with RFC 4180-like quoting
//!
//! Rows are pulled one at a time from a [`CharSource`]; the whole input is
//! never held in memory. Quoted fields may contain delimiters, line
//! terminators and doubled quotes (`""` for a literal `"`). Unquoted line
//! terminators (`\n`, `\r`, `\r\n`) all end a row.

use super::source::CharSource;
use crate::error::{CivicError, FormatErrorKind, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Where the tokenizer is inside the current field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Nothing consumed for the current field yet
    StartField,
    /// Inside a field that did not start with a quote
    UnquotedField,
    /// Inside a quoted field, after the opening quote
    QuotedField,
}

/// Stateful CSV tokenizer producing one logical row per call
///
/// # Examples
///
/// ```
/// use civicstream::csv::{CharSource, CsvParser};
/// use std::io::Cursor;
///
/// let input = Cursor::new("zip_code,population\n19104,50000\n");
/// let mut parser = CsvParser::new(CharSource::from_reader(input));
///
/// assert_eq!(parser.read_row()?, Some(vec!["zip_code".to_string(), "population".to_string()]));
/// assert_eq!(parser.read_row()?, Some(vec!["19104".to_string(), "50000".to_string()]));
/// assert_eq!(parser.read_row()?, None);
/// # Ok::<(), civicstream::CivicError>(())
/// ```
pub struct CsvParser<R> {
    source: CharSource<R>,
    state: ParseState,
    field: String,
    row: Vec<String>,
    rows_read: u64,
}

impl CsvParser<File> {
    /// Open a CSV file and tokenize it
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(CharSource::open(path)?))
    }
}

impl<R: Read> CsvParser<R> {
    /// Create a tokenizer that owns `source`
    pub fn new(source: CharSource<R>) -> Self {
        Self {
            source,
            state: ParseState::StartField,
            field: String::with_capacity(64),
            row: Vec::new(),
            rows_read: 0,
        }
    }

    /// Read the next logical row
    ///
    /// Returns `Ok(None)` once the stream is exhausted. A terminator followed
    /// directly by end of stream does not produce an extra empty row.
    ///
    /// A format error aborts only this row, but the position in the stream is
    /// then undefined; callers should abandon the input.
    pub fn read_row(&mut self) -> Result<Option<Vec<String>>> {
        // Discard anything left behind by a failed call
        self.reset();

        let mut consumed_any = false;
        loop {
            let c = match self.source.next_char()? {
                Some(c) => c,
                None => return self.finish_at_eof(consumed_any),
            };
            consumed_any = true;

            match self.state {
                ParseState::StartField => match c {
                    QUOTE => self.state = ParseState::QuotedField,
                    DELIMITER => self.row.push(String::new()),
                    '\r' | '\n' => {
                        self.end_of_line(c)?;
                        return Ok(Some(self.emit_row()));
                    }
                    _ => {
                        self.state = ParseState::UnquotedField;
                        self.field.push(c);
                    }
                },
                ParseState::UnquotedField => match c {
                    DELIMITER => {
                        self.close_field();
                        self.state = ParseState::StartField;
                    }
                    '\r' | '\n' => {
                        self.end_of_line(c)?;
                        return Ok(Some(self.emit_row()));
                    }
                    QUOTE => return Err(self.format_error(FormatErrorKind::UnexpectedQuote)),
                    _ => self.field.push(c),
                },
                ParseState::QuotedField => match c {
                    QUOTE => match self.source.next_char()? {
                        // File may end right after a closing quote
                        None => return Ok(Some(self.emit_row())),
                        Some(QUOTE) => self.field.push(QUOTE),
                        Some(DELIMITER) => {
                            self.close_field();
                            self.state = ParseState::StartField;
                        }
                        Some(t @ ('\r' | '\n')) => {
                            self.end_of_line(t)?;
                            return Ok(Some(self.emit_row()));
                        }
                        Some(other) => {
                            return Err(self.format_error(
                                FormatErrorKind::InvalidAfterClosingQuote(other),
                            ))
                        }
                    },
                    '\r' => {
                        // Embedded terminators are kept verbatim
                        self.field.push('\r');
                        match self.source.next_char()? {
                            Some('\n') => self.field.push('\n'),
                            Some(other) => self.source.push_back(other),
                            None => {}
                        }
                    }
                    _ => self.field.push(c),
                },
            }
        }
    }

    /// Number of rows returned so far
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Current state of the field state machine
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Bytes consumed from the underlying stream so far
    pub fn offset(&self) -> u64 {
        self.source.offset()
    }

    fn finish_at_eof(&mut self, consumed_any: bool) -> Result<Option<Vec<String>>> {
        if !consumed_any {
            return Ok(None);
        }
        if self.state == ParseState::QuotedField {
            return Err(self.format_error(FormatErrorKind::EofInQuotedField));
        }
        Ok(Some(self.emit_row()))
    }

    /// Consume the `\n` of a `\r\n` pair; anything else goes back to the source
    fn end_of_line(&mut self, terminator: char) -> Result<()> {
        if terminator == '\r' {
            match self.source.next_char()? {
                Some('\n') | None => {}
                Some(other) => self.source.push_back(other),
            }
        }
        Ok(())
    }

    fn close_field(&mut self) {
        self.row.push(std::mem::take(&mut self.field));
    }

    fn emit_row(&mut self) -> Vec<String> {
        self.close_field();
        self.state = ParseState::StartField;
        self.rows_read += 1;
        std::mem::take(&mut self.row)
    }

    fn reset(&mut self) {
        self.state = ParseState::StartField;
        self.field.clear();
        self.row.clear();
    }

    fn format_error(&self, kind: FormatErrorKind) -> CivicError {
        CivicError::Format {
            kind,
            row: self.rows_read + 1,
            offset: self.source.offset(),
        }
    }
}
