//! Splitting proteomes into chunks and merging chunked predictions.
//!
//! The DeepTMHMM batch client accepts a limited number of sequences per job,
//! so a proteome is split into files of at most `size` records named
//! `{stem}_part{N}.faa` (numbered from one). Predictions from every chunk
//! are later concatenated back into a single file per proteome.

use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write as _;
use std::io::{self};
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::info;

use crate::fasta;

/// The marker separating a proteome stem from its chunk number.
pub const PART_MARKER: &str = "_part";

/// The extension of a chunk file.
pub const CHUNK_EXTENSION: &str = "faa";

/// Gets the file name of a chunk.
///
/// # Examples
///
/// ```
/// use secretome::chunk;
///
/// assert_eq!(chunk::file_name("5B", 3), "5B_part3.faa");
/// ```
pub fn file_name(stem: &str, part: usize) -> String {
    format!("{stem}{PART_MARKER}{part}.{CHUNK_EXTENSION}")
}

/// A chunk of a proteome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Chunk {
    /// The chunk number (starting at one).
    part: usize,

    /// The path of the chunk file.
    path: PathBuf,
}

impl Chunk {
    /// Gets the chunk number.
    pub fn part(&self) -> usize {
        self.part
    }

    /// Gets the path of the chunk file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the name of the chunk (the file stem).
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The extension of a chunk that is still being written.
const PARTIAL_EXTENSION: &str = "partial";

/// Writes one chunk unless its file already exists, returning the chunk and
/// whether it was reused.
///
/// Chunks are written under a temporary name and renamed once complete, so
/// an interrupted split never leaves a truncated chunk behind.
fn write_chunk(
    dir: &Path,
    stem: &str,
    part: usize,
    records: &[fasta::Record],
) -> io::Result<(Chunk, bool)> {
    let path = dir.join(file_name(stem, part));

    if path.is_file() {
        return Ok((Chunk { part, path }, true));
    }

    debug!("writing chunk `{}`", path.display());

    let partial = path.with_extension(PARTIAL_EXTENSION);
    fasta::write_all(&partial, records)?;
    std::fs::rename(&partial, &path)?;

    Ok((Chunk { part, path }, false))
}

/// Splits a proteome into chunks of at most `size` records named after
/// `stem`.
///
/// Every record of the proteome is always assigned to a chunk. Chunk files
/// that already exist in `dir` are reused and only the missing ones are
/// written, so an interrupted split is completed by running it again. An
/// empty proteome yields no chunks.
pub fn split(source: &Path, dir: &Path, stem: &str, size: NonZeroUsize) -> io::Result<Vec<Chunk>> {
    std::fs::create_dir_all(dir)?;

    let mut reader = fasta::open(source)?;
    let mut chunks = Vec::new();
    let mut batch = Vec::with_capacity(size.get());
    let mut reused = 0;
    let mut count = 0;

    for result in reader.records() {
        batch.push(result?);
        count += 1;

        if batch.len() == size.get() {
            let (chunk, existed) = write_chunk(dir, stem, chunks.len() + 1, &batch)?;
            reused += usize::from(existed);
            chunks.push(chunk);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        let (chunk, existed) = write_chunk(dir, stem, chunks.len() + 1, &batch)?;
        reused += usize::from(existed);
        chunks.push(chunk);
    }

    info!(
        "split `{}` ({count} records) into {} chunk(s), {reused} reused",
        source.display(),
        chunks.len()
    );

    Ok(chunks)
}

/// Concatenates files, in order, into a single destination file.
///
/// Sources that do not exist are skipped. A newline is inserted between
/// sources that do not end with one. Returns the number of sources merged.
pub fn merge<P>(sources: &[P], destination: &Path) -> io::Result<usize>
where
    P: AsRef<Path>,
{
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(destination)?);
    let mut merged = 0;

    for source in sources {
        let source = source.as_ref();

        if !source.is_file() {
            debug!("skipping missing prediction file `{}`", source.display());
            continue;
        }

        let mut contents = Vec::new();
        io::Read::read_to_end(&mut BufReader::new(File::open(source)?), &mut contents)?;

        writer.write_all(&contents)?;

        if !contents.is_empty() && !contents.ends_with(b"\n") {
            writer.write_all(b"\n")?;
        }

        merged += 1;
    }

    writer.flush()?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;

    fn proteome(n: usize) -> String {
        (1..=n)
            .map(|i| format!(">5B_{i:06}\nMKV\n"))
            .collect::<Vec<_>>()
            .join("")
    }

    fn total_records(chunks: &[Chunk]) -> io::Result<usize> {
        chunks
            .iter()
            .map(|chunk| fasta::read_all(chunk.path()).map(|records| records.len()))
            .sum()
    }

    #[test]
    fn test_split_yields_ceiling_of_chunks() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("chunk")?;
        let source = dir.path().join("5B.sanitized.faa");
        fs::write(&source, proteome(5))?;

        let chunks = split(&source, &dir.path().join("chunks"), "5B", NonZeroUsize::new(2).unwrap())?;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].name(), "5B_part1");
        assert_eq!(chunks[2].part(), 3);

        assert_eq!(fasta::read_all(chunks[0].path())?.len(), 2);
        assert_eq!(fasta::read_all(chunks[1].path())?.len(), 2);

        let last = fasta::read_all(chunks[2].path())?;
        assert_eq!(last.len(), 1);
        assert_eq!(fasta::name(&last[0]), "5B_000005");

        Ok(())
    }

    #[test]
    fn test_split_completes_an_interrupted_split() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("chunk")?;
        let chunk_dir = dir.path().join("chunks");
        let source = dir.path().join("5B.faa");
        fs::write(&source, proteome(5))?;

        // The first chunk survived an earlier run; the second was cut short.
        fs::create_dir_all(&chunk_dir)?;
        let kept = ">5B_000001\nAAA\n>5B_000002\nAAA\n";
        fs::write(chunk_dir.join(file_name("5B", 1)), kept)?;
        fs::write(chunk_dir.join("5B_part2.partial"), ">5B_000003\nMK")?;

        let chunks = split(&source, &chunk_dir, "5B", NonZeroUsize::new(2).unwrap())?;

        assert_eq!(chunks.len(), 3);
        assert_eq!(total_records(&chunks)?, 5);
        assert_eq!(fs::read_to_string(chunks[0].path())?, kept);
        assert_eq!(fasta::read_all(chunks[1].path())?.len(), 2);
        assert!(!chunk_dir.join("5B_part2.partial").exists());

        let again = split(&source, &chunk_dir, "5B", NonZeroUsize::new(2).unwrap())?;
        assert_eq!(again, chunks);

        Ok(())
    }

    #[test]
    fn test_split_covers_every_record_after_resizing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("chunk")?;
        let chunk_dir = dir.path().join("chunks");
        let source = dir.path().join("5B.faa");
        fs::write(&source, proteome(4))?;

        let first = split(&source, &chunk_dir, "5B", NonZeroUsize::new(3).unwrap())?;
        assert_eq!(first.len(), 2);

        let second = split(&source, &chunk_dir, "5B", NonZeroUsize::new(1).unwrap())?;
        assert_eq!(second.len(), 4);

        let names = second
            .iter()
            .flat_map(|chunk| fasta::read_all(chunk.path()).unwrap_or_default())
            .map(|record| fasta::name(&record).into_owned())
            .collect::<std::collections::BTreeSet<_>>();
        assert_eq!(names.len(), 4);

        Ok(())
    }

    #[test]
    fn test_merge_preserves_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("chunk")?;
        let a = dir.path().join("a.3line");
        let b = dir.path().join("b.3line");
        fs::write(&a, ">5B_1 | GLOB\nMKV\nOOO")?;
        fs::write(&b, ">5B_2 | TM\nMAL\nMMM\n")?;

        let destination = dir.path().join("merged").join("5B_merged.3line");
        let merged = merge(&[&b, &dir.path().join("missing"), &a], &destination)?;

        assert_eq!(merged, 2);
        assert_eq!(
            fs::read_to_string(&destination)?,
            ">5B_2 | TM\nMAL\nMMM\n>5B_1 | GLOB\nMKV\nOOO\n"
        );

        Ok(())
    }
}
