//! FASTA input and output.
//!
//! Thin helpers over [`noodles::fasta`] that transparently handle gzipped
//! inputs (by the `.gz` extension) and create parent directories for outputs.

use std::borrow::Cow;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write as _;
use std::io::{self};
use std::path::Path;
use std::path::PathBuf;

use flate2::read::MultiGzDecoder;
pub use noodles::fasta::Record;

/// A FASTA reader.
pub type Reader<R> = noodles::fasta::io::Reader<R>;

/// A FASTA writer.
pub type Writer<W> = noodles::fasta::io::Writer<W>;

/// The extension that marks a gzipped file.
const GZIP_EXTENSION: &str = "gz";

/// Returns whether a path names a gzipped file.
pub fn is_gzipped(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(GZIP_EXTENSION)
}

/// Gets the name (the identifier up to the first whitespace) of a record.
///
/// # Examples
///
/// ```
/// use secretome::fasta;
///
/// let data = b">5B_000001 hypothetical protein\nMKV\n";
/// let mut reader = fasta::Reader::new(&data[..]);
/// let record = reader.records().next().unwrap()?;
///
/// assert_eq!(fasta::name(&record), "5B_000001");
///
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn name(record: &Record) -> Cow<'_, str> {
    String::from_utf8_lossy(record.name())
}

/// Opens a FASTA file for reading.
pub fn open(path: &Path) -> io::Result<Reader<Box<dyn BufRead>>> {
    let file = File::open(path)?;

    let inner: Box<dyn BufRead> = if is_gzipped(path) {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(Reader::new(inner))
}

/// Reads every record from a FASTA file.
pub fn read_all(path: &Path) -> io::Result<Vec<Record>> {
    open(path)?.records().collect()
}

/// Creates (or truncates) a FASTA file for writing, creating its parent
/// directories as needed.
pub fn create(path: &Path) -> io::Result<Writer<BufWriter<File>>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    Ok(Writer::new(BufWriter::new(File::create(path)?)))
}

/// Writes records to a new FASTA file.
pub fn write_all<'a>(path: &Path, records: impl IntoIterator<Item = &'a Record>) -> io::Result<()> {
    let mut writer = create(path)?;

    for record in records {
        writer.write_record(record)?;
    }

    writer.get_mut().flush()
}

/// Gets a plain (uncompressed) copy of a FASTA file for tools that cannot
/// read gzipped input.
///
/// A plain file is returned as-is. A gzipped file is decompressed to
/// `{dir}/{name}.faa`, which is rewritten on every call.
pub fn plain(source: &Path, dir: &Path, name: &str) -> io::Result<PathBuf> {
    if !is_gzipped(source) {
        return Ok(source.to_path_buf());
    }

    std::fs::create_dir_all(dir)?;
    let destination = dir.join(format!("{name}.faa"));

    let mut decoder = MultiGzDecoder::new(File::open(source)?);
    let mut writer = BufWriter::new(File::create(&destination)?);
    io::copy(&mut decoder, &mut writer)?;
    writer.flush()?;

    Ok(destination)
}
