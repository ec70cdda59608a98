//! The consensus filter.
//!
//! For every isolate, the passing sets of all configured
//! [extractors](crate::prediction::Extractor) are intersected into a
//! [`Secretome`], and the records of the isolate's original FASTA file whose
//! normalized identifiers fall within that secretome are written to a
//! per-isolate output file.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::io::BufRead;
use std::io::{self};
use std::path::Path;
use std::path::PathBuf;

use tabled::Tabled;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::fasta;
use crate::identifier;
use crate::identifier::Identifier;
use crate::isolate::Isolate;
use crate::outcome::BatchReport;
use crate::outcome::Outcome;
use crate::prediction;
use crate::prediction::Extractor;
use crate::prediction::PassingSet;
use crate::prediction::Tool;
use crate::resolve::Candidates;

/// The suffix of a filtered output file (appended to the isolate name).
pub const OUTPUT_SUFFIX: &str = ".secretome.faa";

/// Gets the path of the filtered output file for an isolate within a
/// directory.
pub fn output_file(dir: &Path, isolate: &Isolate) -> PathBuf {
    dir.join(format!("{}{OUTPUT_SUFFIX}", isolate.name()))
}

////////////////////////////////////////////////////////////////////////////////////////
// Secretome
////////////////////////////////////////////////////////////////////////////////////////

/// The set of identifiers that passed every tool for an isolate.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Secretome(HashSet<Identifier>);

impl Secretome {
    /// Intersects any number of passing identifier sets.
    ///
    /// The intersection is commutative and associative. Intersecting no sets
    /// at all yields an empty secretome.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashSet;
    ///
    /// use secretome::consensus::Secretome;
    /// use secretome::identifier;
    ///
    /// let set = |ids: &[&str]| {
    ///     ids.iter()
    ///         .map(|id| identifier::normalize(id, "B20"))
    ///         .collect::<HashSet<_>>()
    /// };
    ///
    /// let secretome = Secretome::intersect([
    ///     set(&["B20_1", "B20_2"]),
    ///     set(&["B20_2", "B20_3"]),
    ///     set(&["B20_2"]),
    /// ]);
    ///
    /// assert_eq!(secretome.len(), 1);
    /// assert!(secretome.contains(&identifier::normalize("B20_2", "B20")));
    /// ```
    pub fn intersect<I, S>(sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Borrow<HashSet<Identifier>>,
    {
        let mut sets = sets.into_iter();

        let mut result = match sets.next() {
            Some(first) => first.borrow().clone(),
            None => return Self::default(),
        };

        for set in sets {
            let set = set.borrow();
            result.retain(|id| set.contains(id));
        }

        Self(result)
    }

    /// Gets the identifiers.
    pub fn identifiers(&self) -> &HashSet<Identifier> {
        &self.0
    }

    /// Returns whether an identifier is within the secretome.
    pub fn contains(&self, id: &Identifier) -> bool {
        self.0.contains(id)
    }

    /// Gets the number of identifiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the secretome is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Streams the records from a FASTA reader, keeping (in their original
    /// order) the records whose normalized names are within the secretome.
    pub fn extract<R>(
        &self,
        reader: &mut fasta::Reader<R>,
        isolate: impl AsRef<str>,
    ) -> io::Result<Extraction>
    where
        R: BufRead,
    {
        let isolate = isolate.as_ref();
        let mut extraction = Extraction::default();

        for result in reader.records() {
            let record = result?;
            extraction.seen += 1;

            let id = identifier::normalize(&fasta::name(&record), isolate);
            if self.contains(&id) {
                extraction.kept.push(record);
            }
        }

        Ok(extraction)
    }
}

/// The records kept while streaming a FASTA file.
#[derive(Clone, Debug, Default)]
pub struct Extraction {
    /// The number of records seen.
    seen: usize,

    /// The kept records, in their original order.
    kept: Vec<fasta::Record>,
}

impl Extraction {
    /// Gets the number of records seen.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Gets the kept records.
    pub fn kept(&self) -> &[fasta::Record] {
        &self.kept
    }

    /// Consumes self and returns the kept records.
    pub fn into_kept(self) -> Vec<fasta::Record> {
        self.kept
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Summaries
////////////////////////////////////////////////////////////////////////////////////////

/// The per-tool counts within an [`IsolateSummary`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToolCount {
    /// The tool.
    pub tool: Tool,

    /// The number of passing identifiers.
    pub passing: usize,

    /// The number of malformed lines skipped.
    pub skipped: usize,
}

impl From<&PassingSet> for ToolCount {
    fn from(set: &PassingSet) -> Self {
        Self {
            tool: set.tool(),
            passing: set.len(),
            skipped: set.skipped(),
        }
    }
}

/// A summary of the consensus filter for one isolate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IsolateSummary {
    /// The isolate.
    pub isolate: Isolate,

    /// The per-tool counts, in extractor order.
    pub tools: Vec<ToolCount>,

    /// The size of the secretome.
    pub secretome: usize,

    /// The number of source records seen.
    pub seen: usize,

    /// The number of records written.
    pub kept: usize,

    /// The output file, if one was written.
    pub output: Option<PathBuf>,
}

impl IsolateSummary {
    /// Gets the number of passing identifiers for a tool.
    pub fn passing(&self, tool: Tool) -> Option<usize> {
        self.tools
            .iter()
            .find(|count| count.tool == tool)
            .map(|count| count.passing)
    }
}

/// A row of the summary table printed after a filter run.
#[derive(Clone, Debug, Tabled)]
pub struct SummaryRow {
    /// The isolate.
    #[tabled(rename = "Isolate")]
    pub isolate: String,

    /// The per-tool passing counts.
    #[tabled(rename = "Passing (SignalP/TargetP/DeepTMHMM)")]
    pub passing: String,

    /// The per-tool skipped line counts.
    #[tabled(rename = "Skipped lines")]
    pub skipped: String,

    /// The size of the secretome.
    #[tabled(rename = "Secretome")]
    pub secretome: String,

    /// The number of sequences written.
    #[tabled(rename = "Sequences")]
    pub kept: String,

    /// The output file or the failure reason.
    #[tabled(rename = "Output")]
    pub output: String,
}

impl SummaryRow {
    /// Creates the summary rows for a filter report.
    pub fn from_report(report: &BatchReport<IsolateSummary>) -> Vec<SummaryRow> {
        report
            .units()
            .iter()
            .map(|(unit, outcome)| match outcome {
                Outcome::Success(summary) => {
                    let join = |f: fn(&ToolCount) -> usize| {
                        summary
                            .tools
                            .iter()
                            .map(|count| f(count).to_string())
                            .collect::<Vec<_>>()
                            .join("/")
                    };

                    SummaryRow {
                        isolate: unit.clone(),
                        passing: join(|count| count.passing),
                        skipped: join(|count| count.skipped),
                        secretome: summary.secretome.to_string(),
                        kept: summary.kept.to_string(),
                        output: summary
                            .output
                            .as_ref()
                            .map(|path| path.display().to_string())
                            .unwrap_or_else(|| String::from("<none>")),
                    }
                }
                Outcome::Failure(reason) => SummaryRow {
                    isolate: unit.clone(),
                    passing: String::from("-"),
                    skipped: String::from("-"),
                    secretome: String::from("-"),
                    kept: String::from("-"),
                    output: format!("FAILED: {reason}"),
                },
            })
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Filter
////////////////////////////////////////////////////////////////////////////////////////

/// An error that fails the consensus filter for a single isolate.
#[derive(Debug)]
pub enum Error {
    /// A passing set could not be extracted.
    Prediction(prediction::Error),

    /// None of the candidate source FASTA files exist.
    MissingSource(Isolate, Vec<PathBuf>),

    /// The source FASTA file could not be read.
    Read(PathBuf, io::Error),

    /// The output FASTA file could not be written.
    Write(PathBuf, io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Prediction(err) => write!(f, "prediction error: {err}"),
            Error::MissingSource(isolate, candidates) => {
                let candidates = candidates
                    .iter()
                    .map(|path| format!("`{}`", path.display()))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "no source FASTA found for isolate {isolate} (tried {candidates})"
                )
            }
            Error::Read(path, err) => write!(f, "reading `{}`: {err}", path.display()),
            Error::Write(path, err) => write!(f, "writing `{}`: {err}", path.display()),
        }
    }
}

impl std::error::Error for Error {}

/// The consensus filter.
#[derive(Debug)]
pub struct Filter {
    /// The extractors whose passing sets are intersected.
    extractors: Vec<Box<dyn Extractor>>,

    /// The directory containing the source FASTA files.
    input_dir: PathBuf,

    /// The candidate names of an isolate's source FASTA file.
    candidates: Candidates,

    /// The directory to which filtered FASTA files are written.
    output_dir: PathBuf,
}

impl Filter {
    /// Creates a new filter.
    pub fn new(
        extractors: Vec<Box<dyn Extractor>>,
        input_dir: impl Into<PathBuf>,
        candidates: Candidates,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractors,
            input_dir: input_dir.into(),
            candidates,
            output_dir: output_dir.into(),
        }
    }

    /// Creates the three-way (SignalP, TargetP, DeepTMHMM) filter described by
    /// a configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            vec![
                Box::new(config.signalp.extractor()),
                Box::new(config.targetp.extractor()),
                Box::new(config.deeptmhmm.extractor()),
            ],
            &config.input_dir,
            config.fasta_candidates.clone(),
            &config.output_dir,
        )
    }

    /// Gets the path of the filtered output file for an isolate.
    pub fn output_file(&self, isolate: &Isolate) -> PathBuf {
        output_file(&self.output_dir, isolate)
    }

    /// Runs the filter for a single isolate.
    ///
    /// No output file is written if no records were kept.
    pub fn try_run_isolate(&self, isolate: &Isolate) -> Result<IsolateSummary, Error> {
        let sets = self
            .extractors
            .iter()
            .map(|extractor| extractor.passing_set(isolate))
            .collect::<Result<Vec<_>, _>>()
            .map_err(Error::Prediction)?;

        for set in &sets {
            debug!(
                "{isolate}: {} passing identifier(s) from {} file(s) for {}",
                set.len(),
                set.files(),
                set.tool()
            );
        }

        let secretome = Secretome::intersect(sets.iter().map(|set| set.identifiers()));

        let source = self
            .candidates
            .first_existing(&self.input_dir, isolate)
            .ok_or_else(|| {
                Error::MissingSource(
                    isolate.clone(),
                    self.candidates.paths(&self.input_dir, isolate),
                )
            })?;

        let extraction = fasta::open(&source)
            .and_then(|mut reader| secretome.extract(&mut reader, isolate))
            .map_err(|err| Error::Read(source.clone(), err))?;

        let output = if extraction.kept().is_empty() {
            info!("{isolate}: no sequences passed every tool; no output written");
            None
        } else {
            let path = self.output_file(isolate);
            fasta::write_all(&path, extraction.kept())
                .map_err(|err| Error::Write(path.clone(), err))?;
            Some(path)
        };

        Ok(IsolateSummary {
            isolate: isolate.clone(),
            tools: sets.iter().map(ToolCount::from).collect(),
            secretome: secretome.len(),
            seen: extraction.seen(),
            kept: extraction.kept().len(),
            output,
        })
    }

    /// Runs the filter for a single isolate, capturing any failure.
    pub fn run_isolate(&self, isolate: &Isolate) -> Outcome<IsolateSummary> {
        info!("{isolate}: running consensus filter");

        let outcome = Outcome::from(self.try_run_isolate(isolate));

        match &outcome {
            Outcome::Success(summary) => info!(
                "{isolate}: {} of {} sequence(s) kept",
                summary.kept, summary.seen
            ),
            Outcome::Failure(reason) => warn!("{isolate}: {reason}"),
        }

        outcome
    }

    /// Runs the filter for every isolate in order. A failed isolate never
    /// stops the remaining isolates from being processed.
    pub fn run<'a>(
        &self,
        isolates: impl IntoIterator<Item = &'a Isolate>,
    ) -> BatchReport<IsolateSummary> {
        let mut report = BatchReport::default();

        for isolate in isolates {
            report.push(isolate.name(), self.run_isolate(isolate));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(isolate: &str, ids: &[&str]) -> HashSet<Identifier> {
        ids.iter()
            .map(|id| identifier::normalize(id, isolate))
            .collect()
    }

    #[test]
    fn test_intersection_is_commutative_and_associative() {
        let a = set("5B", &["5B_1", "5B_2", "5B_3"]);
        let b = set("5B", &["5B_000002", "5B_000003", "5B_000004"]);
        let c = set("5B", &[">5B_3", "5B_2", "5B_9"]);

        let abc = Secretome::intersect([&a, &b, &c]);
        let cba = Secretome::intersect([&c, &b, &a]);
        let ab_c = Secretome::intersect([Secretome::intersect([&a, &b]).identifiers(), &c]);
        let a_bc = Secretome::intersect([&a, Secretome::intersect([&b, &c]).identifiers()]);

        assert_eq!(abc, cba);
        assert_eq!(abc, ab_c);
        assert_eq!(abc, a_bc);
        assert_eq!(abc.identifiers(), &set("5B", &["5B_2", "5B_3"]));
    }

    #[test]
    fn test_any_empty_set_empties_the_secretome() {
        let a = set("5B", &["5B_1", "5B_2"]);
        let empty = HashSet::new();

        assert!(Secretome::intersect([&a, &empty, &a]).is_empty());
        assert!(Secretome::intersect(Vec::<HashSet<Identifier>>::new()).is_empty());
    }

    #[test]
    fn test_extract_preserves_order() -> Result<(), Box<dyn std::error::Error>> {
        let secretome = Secretome::intersect([set("B20", &["B20_3", "B20_1"])]);

        let data = b">B20_000001 a\nMKV\n>B20_000002 b\nMAL\n>B20_000003 c\nMSS\n";
        let mut reader = fasta::Reader::new(&data[..]);
        let extraction = secretome.extract(&mut reader, "B20")?;

        let names = extraction
            .kept()
            .iter()
            .map(|record| fasta::name(record).into_owned())
            .collect::<Vec<_>>();

        assert_eq!(extraction.seen(), 3);
        assert_eq!(names, vec!["B20_000001", "B20_000003"]);
        Ok(())
    }

    #[test]
    fn test_extract_single_match() -> Result<(), Box<dyn std::error::Error>> {
        let secretome = Secretome::intersect([set("B20", &["B20_2"])]);

        let data = b">B20_1\nMKV\n>B20_2\nMAL\n>B20_3\nMSS\n";
        let mut reader = fasta::Reader::new(&data[..]);
        let extraction = secretome.extract(&mut reader, "B20")?;

        assert_eq!(extraction.kept().len(), 1);
        assert_eq!(fasta::name(&extraction.kept()[0]), "B20_2");
        Ok(())
    }
}
