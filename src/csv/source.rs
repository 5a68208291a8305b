//! Character stream with one character of pushback
//!
//! Decodes the underlying byte stream as UTF-8, one scalar value per call.
//! Invalid sequences come back as U+FFFD rather than failing the read, and a
//! byte-order mark is returned as an ordinary character.

use crate::error::{CivicError, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Character source over a file (or any reader)
///
/// Owns its reader exclusively; the file handle is released when the source is
/// dropped, whichever way the owning parser finishes.
pub struct CharSource<R> {
    reader: BufReader<R>,
    pushback: Option<char>,
    offset: u64,
    path: Option<PathBuf>,
}

impl CharSource<File> {
    /// Open a file for character-by-character reading
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use civicstream::csv::CharSource;
    ///
    /// let mut source = CharSource::open("population.csv")?;
    /// while let Some(c) = source.next_char()? {
    ///     print!("{}", c);
    /// }
    /// # Ok::<(), civicstream::CivicError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|e| CivicError::io(path_ref, e))?;

        Ok(CharSource {
            reader: BufReader::new(file),
            pushback: None,
            offset: 0,
            path: Some(path_ref.to_path_buf()),
        })
    }
}

impl<R: Read> CharSource<R> {
    /// Wrap an arbitrary reader (in-memory buffers, sockets, decompressors)
    pub fn from_reader(reader: R) -> Self {
        CharSource {
            reader: BufReader::new(reader),
            pushback: None,
            offset: 0,
            path: None,
        }
    }

    /// Next character, or `None` once the stream is exhausted
    ///
    /// A pushed-back character is returned (and cleared) before anything new
    /// is read from the underlying stream.
    pub fn next_char(&mut self) -> Result<Option<char>> {
        if let Some(c) = self.pushback.take() {
            return Ok(Some(c));
        }

        let lead = match self.take_byte()? {
            Some(b) => b,
            None => return Ok(None),
        };
        if lead.is_ascii() {
            return Ok(Some(lead as char));
        }

        let width = match lead {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Ok(Some(char::REPLACEMENT_CHARACTER)),
        };

        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            // Continuation bytes are only consumed when they fit the sequence,
            // so a truncated sequence never swallows the next character.
            match self.peek_byte()? {
                Some(b) if b & 0xC0 == 0x80 => {
                    *slot = b;
                    self.consume_byte();
                }
                _ => return Ok(Some(char::REPLACEMENT_CHARACTER)),
            }
        }

        let decoded = std::str::from_utf8(&bytes[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        Ok(Some(decoded))
    }

    /// Store `c` to be returned by the next `next_char()` call
    ///
    /// Holds a single character. Pushing twice without an intervening
    /// `next_char()` is a caller bug; the second character replaces the first.
    pub fn push_back(&mut self, c: char) {
        self.pushback = Some(c);
    }

    /// Bytes consumed from the underlying stream so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Path this source was opened from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn take_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.consume_byte();
        }
        Ok(byte)
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.wrap_io(e)),
            }
        }
    }

    fn consume_byte(&mut self) {
        self.reader.consume(1);
        self.offset += 1;
    }

    fn wrap_io(&self, e: io::Error) -> CivicError {
        match &self.path {
            Some(path) => CivicError::io(path.clone(), e),
            None => CivicError::IoError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain(input: &[u8]) -> Result<String> {
        let mut source = CharSource::from_reader(Cursor::new(input.to_vec()));
        let mut out = String::new();
        while let Some(c) = source.next_char()? {
            out.push(c);
        }
        Ok(out)
    }

    #[test]
    fn test_ascii_stream() -> Result<()> {
        assert_eq!(drain(b"a,b\r\n")?, "a,b\r\n");
        Ok(())
    }

    #[test]
    fn test_multibyte_utf8() -> Result<()> {
        assert_eq!(drain("Zoë,北京,🚀".as_bytes())?, "Zoë,北京,🚀");
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_replaced() -> Result<()> {
        // Truncated 2-byte lead followed by ASCII: the ASCII must survive
        assert_eq!(drain(&[b'a', 0xC3, b'b'])?, "a\u{FFFD}b");
        assert_eq!(drain(&[0xFF, b'x'])?, "\u{FFFD}x");
        Ok(())
    }

    #[test]
    fn test_bom_is_data() -> Result<()> {
        assert_eq!(drain(b"\xEF\xBB\xBFzip")?, "\u{FEFF}zip");
        Ok(())
    }

    #[test]
    fn test_pushback() -> Result<()> {
        let mut source = CharSource::from_reader(Cursor::new(b"xy".to_vec()));
        assert_eq!(source.next_char()?, Some('x'));
        source.push_back('x');
        assert_eq!(source.next_char()?, Some('x'));
        assert_eq!(source.next_char()?, Some('y'));
        assert_eq!(source.next_char()?, None);

        // Pushback after end of stream is still returned
        source.push_back('z');
        assert_eq!(source.next_char()?, Some('z'));
        assert_eq!(source.next_char()?, None);
        Ok(())
    }

    #[test]
    fn test_pushback_last_write_wins() -> Result<()> {
        let mut source = CharSource::from_reader(Cursor::new(b"".to_vec()));
        source.push_back('a');
        source.push_back('b');
        assert_eq!(source.next_char()?, Some('b'));
        assert_eq!(source.next_char()?, None);
        Ok(())
    }

    #[test]
    fn test_offset_counts_bytes() -> Result<()> {
        let mut source = CharSource::from_reader(Cursor::new("é1".as_bytes().to_vec()));
        source.next_char()?;
        assert_eq!(source.offset(), 2);
        source.next_char()?;
        assert_eq!(source.offset(), 3);
        Ok(())
    }

    /// Fails with `Interrupted` on the first read, then behaves
    struct InterruptedOnce {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    /// Yields its bytes, then fails
    struct BrokenAfter {
        inner: Cursor<Vec<u8>>,
    }

    impl Read for BrokenAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.inner.read(buf)? {
                0 => Err(io::Error::other("disk gone")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_interrupted_read_is_retried() -> Result<()> {
        let mut source = CharSource::from_reader(InterruptedOnce {
            interrupted: false,
            inner: Cursor::new(b"ok".to_vec()),
        });
        assert_eq!(source.next_char()?, Some('o'));
        assert_eq!(source.next_char()?, Some('k'));
        assert_eq!(source.next_char()?, None);
        Ok(())
    }

    #[test]
    fn test_read_failure_after_data() {
        let mut source = CharSource::from_reader(BrokenAfter {
            inner: Cursor::new(b"abc".to_vec()),
        });
        for expected in ['a', 'b', 'c'] {
            assert_eq!(source.next_char().unwrap(), Some(expected));
        }
        assert_eq!(source.offset(), 3);

        let err = source.next_char().unwrap_err();
        assert!(!err.is_format_error());
        assert!(matches!(err, CivicError::IoError(_)));
    }

    #[test]
    fn test_read_failure_names_opened_path() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        std::fs::write(file.path(), "x")?;
        let source = CharSource::open(file.path())?;
        assert_eq!(source.path(), Some(file.path()));

        let detached = CharSource::from_reader(Cursor::new(Vec::new()));
        assert_eq!(detached.path(), None);

        let err = source.wrap_io(io::Error::other("disk gone"));
        assert!(matches!(err, CivicError::Io { ref path, .. } if path == file.path()));
        assert!(!err.is_format_error());
        Ok(())
    }

    #[test]
    fn test_open_missing_file() {
        let err = CharSource::open("definitely/not/here.csv")
            .err()
            .map(|e| e.is_format_error());
        assert_eq!(err, Some(false));
    }
}
