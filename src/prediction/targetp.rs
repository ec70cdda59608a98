//! TargetP subcellular localization predictions.
//!
//! TargetP's short output format is a whitespace-delimited table with `#`
//! header lines. The first column is the protein identifier and the second is
//! the predicted localization.
//!
//! ```text
//! # TargetP-2.0	Organism: Non-Plant	Timestamp: 20240101000000
//! # ID	Prediction	noTP	SP	mTP	CS Position
//! 5B_000001	SP	0.000130	0.999850	0.000020	CS pos: 18-19. AVA-AP. Pr: 0.8734
//! 5B_000002	mTP	0.010000	0.000100	0.989900
//! ```
//!
//! The name of the summary file is not consistent across isolates (some runs
//! produce a single `{isolate}_summary.targetp2`, others several files), so
//! results are discovered through glob [`Patterns`].

use std::path::PathBuf;
use std::str::FromStr;

use crate::isolate::Isolate;
use crate::prediction;
use crate::prediction::Error;
use crate::prediction::PassingSet;
use crate::prediction::Tool;
use crate::resolve::Patterns;

/// The prefix for a comment (header) line.
pub const COMMENT_PREFIX: char = '#';

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a TargetP line.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The line has an identifier but no localization column.
    MissingLocalization(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingLocalization(line) => {
                write!(f, "missing localization column: \"{line}\"")
            }
        }
    }
}

impl std::error::Error for ParseError {}

////////////////////////////////////////////////////////////////////////////////////////
// Localization
////////////////////////////////////////////////////////////////////////////////////////

/// A predicted subcellular localization.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Localization {
    /// No targeting peptide (`noTP`).
    NoTargetingPeptide,

    /// A secretory pathway signal peptide (`SP`).
    SignalPeptide,

    /// A mitochondrial transit peptide (`mTP`).
    Mitochondrial,

    /// A chloroplast transit peptide (`cTP`).
    Chloroplast,

    /// A thylakoid luminal transit peptide (`luTP`).
    Thylakoid,

    /// An unrecognized token.
    Unknown(String),
}

impl FromStr for Localization {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "noTP" => Localization::NoTargetingPeptide,
            "SP" => Localization::SignalPeptide,
            "mTP" => Localization::Mitochondrial,
            "cTP" => Localization::Chloroplast,
            "luTP" => Localization::Thylakoid,
            token => Localization::Unknown(token.to_owned()),
        })
    }
}

impl std::fmt::Display for Localization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Localization::NoTargetingPeptide => write!(f, "noTP"),
            Localization::SignalPeptide => write!(f, "SP"),
            Localization::Mitochondrial => write!(f, "mTP"),
            Localization::Chloroplast => write!(f, "cTP"),
            Localization::Thylakoid => write!(f, "luTP"),
            Localization::Unknown(token) => write!(f, "{token}"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Records and lines
////////////////////////////////////////////////////////////////////////////////////////

/// A single TargetP prediction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The raw identifier.
    identifier: String,

    /// The predicted localization.
    localization: Localization,
}

impl Record {
    /// Gets the raw identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Gets the predicted localization.
    pub fn localization(&self) -> &Localization {
        &self.localization
    }
}

impl prediction::Record for Record {
    fn raw_identifier(&self) -> &str {
        &self.identifier
    }
}

/// A line within a TargetP summary.
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

        match s.split_whitespace().collect::<Vec<_>>()[..] {
            [identifier, localization, ..] => Ok(Line::Prediction(Record {
                identifier: identifier.to_owned(),
                // SAFETY: parsing a localization is infallible.
                localization: localization.parse().unwrap(),
            })),
            _ => Err(ParseError::MissingLocalization(s.to_owned())),
        }
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

/// Extracts TargetP passing sets from every file matched by a set of glob
/// patterns.
#[derive(Clone, Debug)]
pub struct TargetP {
    /// The results directory.
    results_dir: PathBuf,

    /// The patterns (relative to the results directory) naming the summary
    /// files of an isolate.
    patterns: Patterns,

    /// The localization that passes.
    pass: Localization,
}

impl TargetP {
    /// Creates a new TargetP extractor.
    pub fn new(results_dir: impl Into<PathBuf>, patterns: Patterns, pass: Localization) -> Self {
        Self {
            results_dir: results_dir.into(),
            patterns,
            pass,
        }
    }
}

impl prediction::Extractor for TargetP {
    fn tool(&self) -> Tool {
        Tool::TargetP
    }

    fn passing_set(&self, isolate: &Isolate) -> prediction::Result<PassingSet> {
        let paths = self
            .patterns
            .matches(&self.results_dir, isolate)
            .map_err(Error::Resolve)?;

        prediction::read_all::<Line>(Tool::TargetP, &paths, isolate, |record| {
            record.localization == self.pass
        })
    }
}
