//! EffectorP results and the effector report.
//!
//! EffectorP writes one whitespace-delimited table per isolate. The first
//! column is the protein identifier and the remaining columns describe the
//! prediction, for example:
//!
//! ```text
//! # Identifier   Cytoplasmic effector   Apoplastic effector   Non-effector   Prediction
//! B20_000002     -                      Y (0.81)              -              Apoplastic effector
//! B20_000010     -                      -                     Y (0.97)       Non-effector
//! ```
//!
//! Only the words of the prediction matter: a record is an effector if its
//! lowercased prediction mentions `effector` but not `non-effector`.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write as _;
use std::io::{self};
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use tabled::Tabled;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::isolate::Isolate;
use crate::reader;
use crate::reader::Reader;

/// The suffix of an EffectorP results file (appended to the isolate name).
pub const RESULTS_SUFFIX: &str = "_effectorp_results.txt";

/// The file name of the master list of effector identifiers.
pub const MASTER_LIST_FILE_NAME: &str = "all_unique_effector_ids.txt";

/// The prefix for a comment line.
pub const COMMENT_PREFIX: char = '#';

/// The word marking a header line.
pub const HEADER_MARKER: &str = "Identifier";

/// Gets the path of the EffectorP results file for an isolate.
pub fn results_file(dir: &Path, isolate: &Isolate) -> PathBuf {
    dir.join(format!("{}{RESULTS_SUFFIX}", isolate.name()))
}

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing an EffectorP line.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The line has an identifier but no prediction.
    MissingPrediction(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingPrediction(line) => write!(f, "missing prediction: \"{line}\""),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to effector reports.
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(PathBuf, io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(path, err) => write!(f, "i/o error at `{}`: {err}", path.display()),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Predictions
////////////////////////////////////////////////////////////////////////////////////////

/// The class of an effector.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Class {
    /// An apoplastic effector.
    Apoplastic,

    /// A cytoplasmic effector.
    Cytoplasmic,

    /// An effector predicted in both compartments.
    Dual,

    /// An effector of no recognized class.
    Unspecified,
}

impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Class::Apoplastic => write!(f, "apoplastic"),
            Class::Cytoplasmic => write!(f, "cytoplasmic"),
            Class::Dual => write!(f, "dual"),
            Class::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// A lowercased prediction (every column after the identifier, joined by a
/// single space).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Prediction(String);

impl Prediction {
    /// Creates a prediction from its columns.
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        Self(
            columns
                .into_iter()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
        )
    }

    /// Gets the prediction text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether the prediction describes an effector.
    pub fn is_effector(&self) -> bool {
        self.0.contains("effector") && !self.0.contains("non-effector")
    }

    /// Classifies the prediction, returning [`None`] for non-effectors.
    ///
    /// Dual predictions are checked first so that they are not counted as
    /// apoplastic.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::effector::Class;
    /// use secretome::effector::Prediction;
    ///
    /// let prediction = Prediction::from_columns(["Cytoplasmic/apoplastic", "effector"]);
    /// assert_eq!(prediction.classify(), Some(Class::Dual));
    ///
    /// let prediction = Prediction::from_columns(["Non-effector"]);
    /// assert_eq!(prediction.classify(), None);
    /// ```
    pub fn classify(&self) -> Option<Class> {
        if !self.is_effector() {
            return None;
        }

        let text = self.as_str();

        Some(
            if text.contains("apoplastic/cytoplasmic") || text.contains("cytoplasmic/apoplastic")
            {
                Class::Dual
            } else if text.contains("apoplastic") {
                Class::Apoplastic
            } else if text.contains("cytoplasmic") {
                Class::Cytoplasmic
            } else {
                Class::Unspecified
            },
        )
    }
}

/// A single EffectorP record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The identifier.
    identifier: String,

    /// The prediction.
    prediction: Prediction,
}

impl Record {
    /// Gets the identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Gets the prediction.
    pub fn prediction(&self) -> &Prediction {
        &self.prediction
    }
}

/// A line within an EffectorP results file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    /// An empty line.
    Empty,

    /// A comment line.
    Comment(String),

    /// A column header line.
    Header(String),

    /// A prediction line.
    Prediction(Record),
}

impl FromStr for Line {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let line = s.trim();

        if line.is_empty() {
            return Ok(Line::Empty);
        }

        if line.starts_with(COMMENT_PREFIX) {
            return Ok(Line::Comment(line.to_owned()));
        }

        if line.contains(HEADER_MARKER) {
            return Ok(Line::Header(line.to_owned()));
        }

        let mut columns = line.split_whitespace();

        // SAFETY: the line is not empty after trimming, so there is at least
        // one column.
        let identifier = columns.next().unwrap().to_owned();
        let columns = columns.collect::<Vec<_>>();

        if columns.is_empty() {
            return Err(ParseError::MissingPrediction(line.to_owned()));
        }

        Ok(Line::Prediction(Record {
            identifier,
            prediction: Prediction::from_columns(columns),
        }))
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Reports
////////////////////////////////////////////////////////////////////////////////////////

/// Effector counts by class.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counts {
    /// The number of apoplastic effectors.
    pub apoplastic: usize,

    /// The number of cytoplasmic effectors.
    pub cytoplasmic: usize,

    /// The number of dual effectors.
    pub dual: usize,

    /// The number of effectors of no recognized class.
    pub unspecified: usize,
}

impl Counts {
    /// Counts one effector of a class.
    pub fn add(&mut self, class: Class) {
        match class {
            Class::Apoplastic => self.apoplastic += 1,
            Class::Cytoplasmic => self.cytoplasmic += 1,
            Class::Dual => self.dual += 1,
            Class::Unspecified => self.unspecified += 1,
        }
    }

    /// Gets the total number of effectors.
    pub fn total(&self) -> usize {
        self.apoplastic + self.cytoplasmic + self.dual + self.unspecified
    }
}

/// The effectors within one EffectorP results file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Report {
    /// The counts by class.
    counts: Counts,

    /// The identifiers of every effector.
    effectors: BTreeSet<String>,

    /// The number of malformed lines that were skipped.
    skipped: usize,
}

impl Report {
    /// Reads a report from EffectorP output.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::effector::Report;
    ///
    /// let data = b"# Identifier\tPrediction\nB20_2\tApoplastic effector\nB20_9\tNon-effector\n";
    /// let report = Report::from_reader(&data[..])?;
    ///
    /// assert_eq!(report.counts().apoplastic, 1);
    /// assert_eq!(report.effectors().len(), 1);
    ///
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn from_reader<R>(inner: R) -> io::Result<Self>
    where
        R: BufRead,
    {
        let mut report = Report::default();
        let mut reader = Reader::new(inner);

        for result in reader.lines::<Line>() {
            let record = match result {
                Ok(Line::Prediction(record)) => record,
                Ok(_) => continue,
                Err(reader::Error::Io(err)) => return Err(err),
                Err(reader::Error::Line { line_no, inner }) => {
                    debug!("EffectorP: skipping malformed line {line_no}: {inner}");
                    report.skipped += 1;
                    continue;
                }
            };

            if let Some(class) = record.prediction.classify() {
                report.counts.add(class);
                report.effectors.insert(record.identifier);
            }
        }

        Ok(report)
    }

    /// Reads a report from an EffectorP results file.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Gets the counts by class.
    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    /// Gets the effector identifiers.
    pub fn effectors(&self) -> &BTreeSet<String> {
        &self.effectors
    }

    /// Gets the number of malformed lines that were skipped.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// The effector reports of a set of isolates.
///
/// An isolate without a results file has no report.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// The reports, in isolate order.
    reports: Vec<(Isolate, Option<Report>)>,
}

impl Summary {
    /// Reads the results file of every isolate within a directory.
    pub fn from_dir<'a>(
        dir: &Path,
        isolates: impl IntoIterator<Item = &'a Isolate>,
    ) -> Result<Self> {
        let mut reports = Vec::new();

        for isolate in isolates {
            let path = results_file(dir, isolate);

            if !path.is_file() {
                warn!("{isolate}: missing EffectorP results `{}`", path.display());
                reports.push((isolate.clone(), None));
                continue;
            }

            let report = Report::from_path(&path).map_err(|err| Error::Io(path.clone(), err))?;

            if report.skipped() > 0 {
                warn!(
                    "{isolate}: skipped {} malformed line(s) in `{}`",
                    report.skipped(),
                    path.display()
                );
            }

            info!("{isolate}: {} effector(s)", report.counts().total());
            reports.push((isolate.clone(), Some(report)));
        }

        Ok(Self { reports })
    }

    /// Gets the reports.
    pub fn reports(&self) -> &[(Isolate, Option<Report>)] {
        &self.reports
    }

    /// Gets the effector identifiers of every isolate with a report.
    pub fn memberships(&self) -> impl Iterator<Item = (&Isolate, &BTreeSet<String>)> {
        self.reports
            .iter()
            .filter_map(|(isolate, report)| report.as_ref().map(|r| (isolate, r.effectors())))
    }

    /// Gets the union of the effector identifiers across isolates.
    pub fn effectors(&self) -> BTreeSet<&str> {
        self.memberships()
            .flat_map(|(_, effectors)| effectors.iter().map(String::as_str))
            .collect()
    }

    /// Writes the sorted master list of effector identifiers, one per line.
    ///
    /// Returns the number of identifiers written.
    pub fn write_master_list(&self, path: &Path) -> Result<usize> {
        let write = || -> io::Result<usize> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let effectors = self.effectors();
            let mut writer = BufWriter::new(File::create(path)?);

            for id in &effectors {
                writeln!(writer, "{id}")?;
            }

            writer.flush()?;
            Ok(effectors.len())
        };

        write().map_err(|err| Error::Io(path.to_path_buf(), err))
    }
}

/// A row of the effector report table.
#[derive(Debug, Tabled)]
pub struct ReportRow {
    /// The isolate.
    #[tabled(rename = "Isolate")]
    isolate: String,

    /// Whether results were found.
    #[tabled(rename = "Status")]
    status: String,

    /// The number of apoplastic effectors.
    #[tabled(rename = "Apoplastic")]
    apoplastic: String,

    /// The number of cytoplasmic effectors.
    #[tabled(rename = "Cytoplasmic")]
    cytoplasmic: String,

    /// The number of dual effectors.
    #[tabled(rename = "Dual")]
    dual: String,

    /// The number of unclassified effectors.
    #[tabled(rename = "Other")]
    unspecified: String,
}

impl ReportRow {
    /// Creates one row per isolate in a summary.
    pub fn from_summary(summary: &Summary) -> Vec<ReportRow> {
        summary
            .reports()
            .iter()
            .map(|(isolate, report)| match report {
                Some(report) => {
                    let counts = report.counts();
                    ReportRow {
                        isolate: isolate.to_string(),
                        status: String::from("parsed"),
                        apoplastic: counts.apoplastic.to_string(),
                        cytoplasmic: counts.cytoplasmic.to_string(),
                        dual: counts.dual.to_string(),
                        unspecified: counts.unspecified.to_string(),
                    }
                }
                None => ReportRow {
                    isolate: isolate.to_string(),
                    status: String::from("missing"),
                    apoplastic: String::from("-"),
                    cytoplasmic: String::from("-"),
                    dual: String::from("-"),
                    unspecified: String::from("-"),
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_parse_lines() -> std::result::Result<(), Box<dyn std::error::Error>> {
        assert_eq!("".parse::<Line>()?, Line::Empty);
        assert!(matches!("# EffectorP 3.0".parse::<Line>()?, Line::Comment(_)));
        assert!(matches!(
            "Identifier\tPrediction".parse::<Line>()?,
            Line::Header(_)
        ));

        match "B20_000002 \t Apoplastic   Effector".parse::<Line>()? {
            Line::Prediction(record) => {
                assert_eq!(record.identifier(), "B20_000002");
                assert_eq!(record.prediction().as_str(), "apoplastic effector");
            }
            line => panic!("unexpected line: {line:?}"),
        }

        assert_eq!(
            "B20_000002".parse::<Line>().unwrap_err(),
            ParseError::MissingPrediction(String::from("B20_000002"))
        );

        Ok(())
    }

    #[test]
    fn test_classification() {
        let classify = |text: &str| Prediction::from_columns(text.split(' ')).classify();

        assert_eq!(classify("Apoplastic effector"), Some(Class::Apoplastic));
        assert_eq!(classify("Cytoplasmic effector"), Some(Class::Cytoplasmic));
        assert_eq!(classify("Apoplastic/cytoplasmic effector"), Some(Class::Dual));
        assert_eq!(classify("Cytoplasmic/apoplastic effector"), Some(Class::Dual));
        assert_eq!(classify("Effector"), Some(Class::Unspecified));
        assert_eq!(classify("Non-effector"), None);
        assert_eq!(classify("Y (0.7) Non-effector apoplastic"), None);
        assert_eq!(classify("secreted"), None);
    }

    #[test]
    fn test_summary_and_master_list() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("effector")?;
        let isolates = ["5B", "B20", "5C"]
            .iter()
            .map(|name| name.parse::<Isolate>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        fs::write(
            results_file(dir.path(), &isolates[0]),
            "# Identifier\tPrediction\n5B_3\tCytoplasmic effector\n5B_1\tNon-effector\nbroken\n",
        )?;
        fs::write(
            results_file(dir.path(), &isolates[1]),
            "B20_2\tApoplastic/cytoplasmic effector\nB20_1\tApoplastic effector\n",
        )?;

        let summary = Summary::from_dir(dir.path(), &isolates)?;
        assert_eq!(summary.reports().len(), 3);
        assert!(summary.reports()[2].1.is_none());

        let five_b = summary.reports()[0].1.as_ref().unwrap();
        assert_eq!(five_b.counts().cytoplasmic, 1);
        assert_eq!(five_b.skipped(), 1);

        let master = dir.path().join(MASTER_LIST_FILE_NAME);
        assert_eq!(summary.write_master_list(&master)?, 3);
        assert_eq!(fs::read_to_string(&master)?, "5B_3\nB20_1\nB20_2\n");

        let rows = ReportRow::from_summary(&summary);
        assert_eq!(rows[2].status, "missing");
        assert_eq!(rows[1].dual, "1");

        Ok(())
    }
}
