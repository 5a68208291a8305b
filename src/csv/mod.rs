//! CSV tokenizing: character source and row parser

mod parser;
mod source;

pub use parser::{CsvParser, ParseState};
pub use source::CharSource;
