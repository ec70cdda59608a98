//! SignalP signal peptide predictions.
//!
//! SignalP writes one table per proteome (`prediction_results.txt`). Header
//! lines are prefixed with `#`, and every other line starts with the protein
//! identifier followed by the predicted signal peptide type.
//!
//! ```text
//! # SignalP-6.0	Organism: Eukarya	Timestamp: 20240101000000
//! # ID	Prediction	OTHER	SP(Sec/SPI)	CS Position
//! 5B_000001	SP	0.000200	0.999800	CS pos: 18-19. Pr: 0.9761
//! 5B_000002	OTHER	0.999900	0.000100
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::isolate::Isolate;
use crate::prediction;
use crate::prediction::PassingSet;
use crate::prediction::Tool;

/// The prefix for a comment (header) line.
pub const COMMENT_PREFIX: char = '#';

/// The default name of the results file within an isolate's directory.
pub const DEFAULT_FILE_NAME: &str = "prediction_results.txt";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a SignalP line.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The line has an identifier but no verdict column.
    MissingVerdict(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingVerdict(line) => {
                write!(f, "missing prediction column: \"{line}\"")
            }
        }
    }
}

impl std::error::Error for ParseError {}

////////////////////////////////////////////////////////////////////////////////////////
// Verdicts
////////////////////////////////////////////////////////////////////////////////////////

/// A signal peptide verdict.
///
/// Tokens are matched exactly (including case). Anything unrecognized is kept
/// as [`Verdict::Unknown`] so that it can never accidentally match a known
/// verdict.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Verdict {
    /// A standard secretory signal peptide (`SP`, or `SP(Sec/SPI)` in older
    /// releases).
    SignalPeptide,

    /// A lipoprotein signal peptide (`LIPO`).
    Lipoprotein,

    /// A Tat signal peptide (`TAT`).
    Tat,

    /// A Tat lipoprotein signal peptide (`TATLIPO`).
    TatLipoprotein,

    /// A pilin-like signal peptide (`PILIN`).
    Pilin,

    /// No signal peptide (`OTHER`).
    Other,

    /// An unrecognized token.
    Unknown(String),
}

impl FromStr for Verdict {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SP" | "SP(Sec/SPI)" => Verdict::SignalPeptide,
            "LIPO" => Verdict::Lipoprotein,
            "TAT" => Verdict::Tat,
            "TATLIPO" => Verdict::TatLipoprotein,
            "PILIN" => Verdict::Pilin,
            "OTHER" => Verdict::Other,
            token => Verdict::Unknown(token.to_owned()),
        })
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::SignalPeptide => write!(f, "SP"),
            Verdict::Lipoprotein => write!(f, "LIPO"),
            Verdict::Tat => write!(f, "TAT"),
            Verdict::TatLipoprotein => write!(f, "TATLIPO"),
            Verdict::Pilin => write!(f, "PILIN"),
            Verdict::Other => write!(f, "OTHER"),
            Verdict::Unknown(token) => write!(f, "{token}"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Records and lines
////////////////////////////////////////////////////////////////////////////////////////

/// A single SignalP prediction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The raw identifier.
    identifier: String,

    /// The verdict.
    verdict: Verdict,
}

impl Record {
    /// Gets the raw identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Gets the verdict.
    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }
}

impl prediction::Record for Record {
    fn raw_identifier(&self) -> &str {
        &self.identifier
    }
}

/// A line within a SignalP results table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    /// An empty (or whitespace-only) line.
    Empty,

    /// A comment or header line.
    Comment(String),

    /// A prediction line.
    Prediction(Record),
}

impl FromStr for Line {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Line::Empty);
        }

        if s.starts_with(COMMENT_PREFIX) {
            return Ok(Line::Comment(s.to_owned()));
        }

        let mut fields = s.split_whitespace();

        // SAFETY: the line is not blank, so there is always a first field.
        let identifier = fields.next().unwrap();
        let verdict = fields
            .next()
            .ok_or_else(|| ParseError::MissingVerdict(s.to_owned()))?;

        Ok(Line::Prediction(Record {
            identifier: identifier.to_owned(),
            // SAFETY: parsing a verdict is infallible.
            verdict: verdict.parse().unwrap(),
        }))
    }
}

impl prediction::Line for Line {
    type Record = Record;

    fn into_record(self) -> Option<Record> {
        match self {
            Line::Prediction(record) => Some(record),
            _ => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Extractor
////////////////////////////////////////////////////////////////////////////////////////

/// Extracts SignalP passing sets from `{results_dir}/{isolate}/{file_name}`.
#[derive(Clone, Debug)]
pub struct SignalP {
    /// The directory containing one subdirectory per isolate.
    results_dir: PathBuf,

    /// The name of the results file within each isolate's subdirectory.
    file_name: String,

    /// The verdict that passes.
    pass: Verdict,
}

impl SignalP {
    /// Creates a new SignalP extractor.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::prediction::signalp::SignalP;
    /// use secretome::prediction::signalp::Verdict;
    ///
    /// let extractor = SignalP::new("results/signalp_outputs", "prediction_results.txt", Verdict::SignalPeptide);
    /// ```
    pub fn new(
        results_dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
        pass: Verdict,
    ) -> Self {
        Self {
            results_dir: results_dir.into(),
            file_name: file_name.into(),
            pass,
        }
    }

    /// Gets the path of the results file for an isolate.
    pub fn results_file(&self, isolate: &Isolate) -> PathBuf {
        self.results_dir
            .join(isolate.name())
            .join(&self.file_name)
    }
}

impl prediction::Extractor for SignalP {
    fn tool(&self) -> Tool {
        Tool::SignalP
    }

    fn passing_set(&self, isolate: &Isolate) -> prediction::Result<PassingSet> {
        let path = self.results_file(isolate);

        if !path.is_file() {
            debug!("SignalP: no results file at `{}`", path.display());
            return Ok(PassingSet::empty(Tool::SignalP));
        }

        prediction::read_all::<Line>(Tool::SignalP, &[path], isolate, |record| {
            record.verdict == self.pass
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;
    use crate::prediction::Extractor as _;

    #[test]
    fn test_parse_lines() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!("".parse::<Line>()?, Line::Empty);
        assert_eq!("   ".parse::<Line>()?, Line::Empty);
        assert!(matches!("# ID\tPrediction".parse::<Line>()?, Line::Comment(_)));

        let line = "5B_000001\tSP\t0.0002\t0.9998".parse::<Line>()?;
        let record = prediction::Line::into_record(line).unwrap();
        assert_eq!(record.identifier(), "5B_000001");
        assert_eq!(record.verdict(), &Verdict::SignalPeptide);

        Ok(())
    }

    #[test]
    fn test_missing_verdict() {
        let err = "5B_000001".parse::<Line>().unwrap_err();
        assert_eq!(err.to_string(), "missing prediction column: \"5B_000001\"");
    }

    #[test]
    fn test_verdicts_are_case_sensitive() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!("SP(Sec/SPI)".parse::<Verdict>()?, Verdict::SignalPeptide);
        assert_eq!("LIPO".parse::<Verdict>()?, Verdict::Lipoprotein);
        assert_eq!(
            "sp".parse::<Verdict>()?,
            Verdict::Unknown(String::from("sp"))
        );
        assert_eq!(Verdict::Unknown(String::from("sp")).to_string(), "sp");
        Ok(())
    }

    #[test]
    fn test_passing_set() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("signalp")?;
        let isolate = "B20".parse::<Isolate>()?;

        fs::create_dir_all(dir.path().join("B20"))?;
        fs::write(
            dir.path().join("B20").join(DEFAULT_FILE_NAME),
            "# SignalP-6.0\n# ID\tPrediction\tOTHER\tSP(Sec/SPI)\n\
             B20_000001\tSP\t0.01\t0.99\n\
             B20_000002\tSP\t0.02\t0.98\n\
             B20_000003\tOTHER\t0.99\t0.01\n\
             B20_000004\tsp\t0.10\t0.90\n\
             B20_000005\n\n",
        )?;

        let extractor = SignalP::new(dir.path(), DEFAULT_FILE_NAME, Verdict::SignalPeptide);
        let set = extractor.passing_set(&isolate)?;

        let mut ids = set
            .identifiers()
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>();
        ids.sort();

        assert_eq!(ids, vec!["B20_1", "B20_2"]);
        assert_eq!(set.files(), 1);
        assert_eq!(set.records(), 4);
        assert_eq!(set.skipped(), 1);

        Ok(())
    }

    #[test]
    fn test_missing_file_is_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("signalp")?;
        let isolate = "5C".parse::<Isolate>()?;

        let extractor = SignalP::new(dir.path(), DEFAULT_FILE_NAME, Verdict::SignalPeptide);
        let set = extractor.passing_set(&isolate)?;

        assert!(set.is_empty());
        assert_eq!(set.files(), 0);
        Ok(())
    }
}
