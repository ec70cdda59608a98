//! Passing sets derived from the outputs of the secretion predictors.
//!
//! Each supported tool has a dedicated module with a line parser that turns
//! the tool's native flat-file output into explicit, enumerated verdicts, and
//! an [`Extractor`] that decides which of those verdicts pass. Keeping these
//! two apart means that the meaning of "passing" can be configured without
//! touching the parsers.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::io::{self};
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;
use tracing::warn;

use crate::identifier;
use crate::identifier::Identifier;
use crate::isolate::Isolate;
use crate::reader;
use crate::resolve;
use crate::Reader;

pub mod deeptmhmm;
pub mod signalp;
pub mod targetp;

pub use deeptmhmm::DeepTmhmm;
pub use signalp::SignalP;
pub use targetp::TargetP;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to extracting a passing set.
#[derive(Debug)]
pub enum Error {
    /// An I/O error while reading an existing prediction file.
    Io(PathBuf, io::Error),

    /// The prediction files could not be discovered.
    Resolve(resolve::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(path, err) => write!(f, "i/o error reading `{}`: {err}", path.display()),
            Error::Resolve(err) => write!(f, "resolve error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Tools
////////////////////////////////////////////////////////////////////////////////////////

/// A secretion prediction tool.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Tool {
    /// SignalP (signal peptide prediction).
    SignalP,

    /// TargetP (subcellular localization).
    TargetP,

    /// DeepTMHMM (transmembrane topology).
    DeepTmhmm,
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tool::SignalP => write!(f, "SignalP"),
            Tool::TargetP => write!(f, "TargetP"),
            Tool::DeepTmhmm => write!(f, "DeepTMHMM"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Lines and records
////////////////////////////////////////////////////////////////////////////////////////

/// A per-protein prediction parsed from a tool's output.
pub trait Record {
    /// Gets the raw identifier exactly as the tool reported it.
    fn raw_identifier(&self) -> &str;
}

/// A line within a tool's output.
pub trait Line: FromStr {
    /// The prediction record carried by some lines.
    type Record: Record;

    /// Consumes the line and returns the prediction record, if the line
    /// carries one.
    fn into_record(self) -> Option<Self::Record>;
}

////////////////////////////////////////////////////////////////////////////////////////
// Passing sets
////////////////////////////////////////////////////////////////////////////////////////

/// The set of standardized identifiers that one tool judged positive for one
/// isolate, along with counters that allow the result to be audited.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PassingSet {
    /// The tool.
    tool: Tool,

    /// The passing identifiers.
    identifiers: HashSet<Identifier>,

    /// The number of prediction files read.
    files: usize,

    /// The number of prediction records seen.
    records: usize,

    /// The number of malformed lines that were skipped.
    skipped: usize,
}

impl PassingSet {
    /// Creates an empty passing set for a tool.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::prediction::PassingSet;
    /// use secretome::prediction::Tool;
    ///
    /// let set = PassingSet::empty(Tool::SignalP);
    /// assert!(set.is_empty());
    /// assert_eq!(set.files(), 0);
    /// ```
    pub fn empty(tool: Tool) -> Self {
        Self {
            tool,
            identifiers: HashSet::new(),
            files: 0,
            records: 0,
            skipped: 0,
        }
    }

    /// Gets the tool.
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Gets the passing identifiers.
    pub fn identifiers(&self) -> &HashSet<Identifier> {
        &self.identifiers
    }

    /// Consumes self and returns the passing identifiers.
    pub fn into_identifiers(self) -> HashSet<Identifier> {
        self.identifiers
    }

    /// Gets the number of passing identifiers.
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Returns whether no identifiers passed.
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Gets the number of prediction files that were read.
    pub fn files(&self) -> usize {
        self.files
    }

    /// Gets the number of prediction records that were seen.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Gets the number of malformed lines that were skipped.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Reads the lines of a prediction source, adding the normalized
    /// identifier of every record for which `passes` returns `true`.
    ///
    /// Malformed lines are skipped and counted.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::prediction::signalp::Line;
    /// use secretome::prediction::signalp::Verdict;
    /// use secretome::prediction::PassingSet;
    /// use secretome::prediction::Tool;
    ///
    /// let data = b"# ID\tPrediction\n5B_000001\tSP\n5B_000002\tOTHER\nbroken\n";
    /// let mut set = PassingSet::empty(Tool::SignalP);
    /// set.read::<_, Line>(&data[..], "5B", |record| record.verdict() == &Verdict::SignalPeptide)?;
    ///
    /// assert_eq!(set.len(), 1);
    /// assert_eq!(set.records(), 2);
    /// assert_eq!(set.skipped(), 1);
    ///
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn read<R, L>(
        &mut self,
        inner: R,
        isolate: impl AsRef<str>,
        passes: impl Fn(&L::Record) -> bool,
    ) -> io::Result<()>
    where
        R: io::BufRead,
        L: Line,
        L::Err: std::fmt::Display,
    {
        let isolate = isolate.as_ref();
        let mut reader = Reader::new(inner);

        for result in reader.lines::<L>() {
            let line = match result {
                Ok(line) => line,
                Err(reader::Error::Io(err)) => return Err(err),
                Err(reader::Error::Line { line_no, inner }) => {
                    debug!("{}: skipping malformed line {line_no}: {inner}", self.tool);
                    self.skipped += 1;
                    continue;
                }
            };

            if let Some(record) = line.into_record() {
                self.records += 1;

                if passes(&record) {
                    let raw = record.raw_identifier();

                    if identifier::digit_runs(raw).len() > 1 {
                        debug!("{}: identifier `{raw}` has multiple digit runs", self.tool);
                    }

                    self.identifiers
                        .insert(identifier::normalize(raw, isolate));
                }
            }
        }

        Ok(())
    }

    /// Reads a prediction file from disk (see [`PassingSet::read()`]).
    pub fn read_file<L>(
        &mut self,
        path: &Path,
        isolate: &Isolate,
        passes: impl Fn(&L::Record) -> bool,
    ) -> Result<()>
    where
        L: Line,
        L::Err: std::fmt::Display,
    {
        let skipped = self.skipped;

        let file = File::open(path).map_err(|err| Error::Io(path.to_path_buf(), err))?;
        self.read::<_, L>(BufReader::new(file), isolate, passes)
            .map_err(|err| Error::Io(path.to_path_buf(), err))?;
        self.files += 1;

        let skipped = self.skipped - skipped;
        if skipped > 0 {
            warn!(
                "{}: skipped {skipped} malformed line(s) in `{}`",
                self.tool,
                path.display()
            );
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Extractors
////////////////////////////////////////////////////////////////////////////////////////

/// A source of passing sets for a single tool.
pub trait Extractor: std::fmt::Debug {
    /// Gets the tool.
    fn tool(&self) -> Tool;

    /// Gets the set of standardized identifiers that the tool judged positive
    /// for an isolate.
    ///
    /// Missing result files and directories are treated as "no passers" and
    /// never as errors.
    fn passing_set(&self, isolate: &Isolate) -> Result<PassingSet>;
}

/// Reads every file in `paths` into a single passing set.
pub(crate) fn read_all<L>(
    tool: Tool,
    paths: &[PathBuf],
    isolate: &Isolate,
    passes: impl Fn(&L::Record) -> bool,
) -> Result<PassingSet>
where
    L: Line,
    L::Err: std::fmt::Display,
{
    let mut set = PassingSet::empty(tool);

    if paths.is_empty() {
        debug!("{tool}: no prediction files found for isolate {isolate}");
    }

    for path in paths {
        set.read_file::<L>(path, isolate, &passes)?;
    }

    Ok(set)
}
