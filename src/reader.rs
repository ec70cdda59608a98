//! A reader for line-oriented prediction files.

use std::io::BufRead;
use std::io::{self};
use std::iter;
use std::str::FromStr;

/// The new line character.
const NEW_LINE: char = '\n';

/// The carriage return character.
const CARRIAGE_RETURN: char = '\r';

/// An error related to a [`Reader`].
#[derive(Debug)]
pub enum Error<E> {
    /// An I/O error.
    Io(io::Error),

    /// A line could not be parsed.
    Line {
        /// The one-based number of the offending line.
        line_no: usize,

        /// The inner parse error.
        inner: E,
    },
}

impl<E> std::fmt::Display for Error<E>
where
    E: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::Line { line_no, inner } => write!(f, "line {line_no}: {inner}"),
        }
    }
}

impl<E> std::error::Error for Error<E> where E: std::error::Error {}

/// A line-oriented reader.
///
/// Each line is parsed into some type `L` through its [`FromStr`]
/// implementation. Every prediction format within this crate provides such a
/// line type.
#[derive(Clone, Debug)]
pub struct Reader<T>
where
    T: BufRead,
{
    /// The inner reader.
    inner: T,

    /// The number of lines read so far.
    line_no: usize,
}

impl<T> Reader<T>
where
    T: BufRead,
{
    /// Creates a reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"# SignalP-6.0\n5B_000001\tSP\n";
    /// let reader = secretome::Reader::new(&data[..]);
    /// ```
    pub fn new(inner: T) -> Self {
        Self::from(inner)
    }

    /// Gets a reference to the inner reader.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Consumes self and returns the inner reader.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Gets the number of lines read so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Reads a raw, textual line from the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// let data = b"# SignalP-6.0\r\n5B_000001\tSP";
    /// let mut reader = secretome::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 15);
    /// assert_eq!(buffer, "# SignalP-6.0");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 12);
    /// assert_eq!(buffer, "5B_000001\tSP");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 0);
    ///
    /// # Ok::<(), io::Error>(())
    /// ```
    pub fn read_line_raw(&mut self, buffer: &mut String) -> io::Result<usize> {
        let read = read_line(&mut self.inner, buffer)?;

        if read > 0 {
            self.line_no += 1;
        }

        Ok(read)
    }

    /// Attempts to read and parse a line from the underlying reader.
    ///
    /// The outer [`Result`] carries I/O errors, while the inner [`Result`]
    /// carries the parse result for the line itself so that callers can decide
    /// whether a malformed line is fatal.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::prediction::signalp::Line;
    ///
    /// let data = b"# SignalP-6.0\n5B_000001\tSP\n";
    /// let mut reader = secretome::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    /// assert!(matches!(
    ///     reader.read_line::<Line>(&mut buffer)?,
    ///     Some(Ok(Line::Comment(_)))
    /// ));
    /// assert!(matches!(
    ///     reader.read_line::<Line>(&mut buffer)?,
    ///     Some(Ok(Line::Prediction(_)))
    /// ));
    /// assert!(reader.read_line::<Line>(&mut buffer)?.is_none());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_line<L>(
        &mut self,
        buffer: &mut String,
    ) -> io::Result<Option<std::result::Result<L, L::Err>>>
    where
        L: FromStr,
    {
        match self.read_line_raw(buffer)? {
            0 => Ok(None),
            _ => Ok(Some(buffer.parse::<L>())),
        }
    }

    /// Returns an iterator over the parsed lines in the underlying reader.
    ///
    /// Malformed lines are reported as [`Error::Line`] with their line number;
    /// iteration may continue past them.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::prediction::signalp::Line;
    ///
    /// let data = b"# SignalP-6.0\n5B_000001\tSP\n5B_000002\n";
    /// let mut reader = secretome::Reader::new(&data[..]);
    ///
    /// let lines = reader.lines::<Line>().collect::<Vec<_>>();
    /// assert_eq!(lines.len(), 3);
    /// assert!(lines[2].is_err());
    /// ```
    pub fn lines<'a, L>(&'a mut self) -> impl Iterator<Item = Result<L, Error<L::Err>>> + 'a
    where
        L: FromStr + 'a,
    {
        let mut buffer = String::new();

        iter::from_fn(move || match self.read_line::<L>(&mut buffer) {
            Ok(None) => None,
            Ok(Some(Ok(line))) => Some(Ok(line)),
            Ok(Some(Err(inner))) => Some(Err(Error::Line {
                line_no: self.line_no,
                inner,
            })),
            Err(err) => Some(Err(Error::Io(err))),
        })
    }
}

impl<T> From<T> for Reader<T>
where
    T: BufRead,
{
    fn from(inner: T) -> Self {
        Self { inner, line_no: 0 }
    }
}

/// Reads a line from a buffered reader, dropping the line ending.
fn read_line<T>(reader: &mut T, buffer: &mut String) -> io::Result<usize>
where
    T: BufRead,
{
    buffer.clear();

    match reader.read_line(buffer) {
        Ok(0) => Ok(0),
        Ok(n) => {
            if buffer.ends_with(NEW_LINE) {
                buffer.pop();

                if buffer.ends_with(CARRIAGE_RETURN) {
                    buffer.pop();
                }
            }

            Ok(n)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_read_line() {
        let data = b"hello\r\nworld!";
        let mut cursor = io::Cursor::new(data);

        let mut buffer = String::new();
        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "hello");
        assert_eq!(len, 7);

        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "world!");
        assert_eq!(len, 6);
    }

    #[test]
    fn test_line_numbers_are_tracked() -> Result<(), Box<dyn std::error::Error>> {
        let data = b"a\nb\n\nc";
        let mut reader = Reader::new(&data[..]);

        let mut buffer = String::new();
        while reader.read_line_raw(&mut buffer)? > 0 {}

        assert_eq!(reader.line_no(), 4);
        Ok(())
    }
}
