//! DeepTMHMM transmembrane topology predictions.
//!
//! DeepTMHMM reports its predictions in a "3line" format: a header line with
//! the protein identifier and the predicted topology class, followed by the
//! sequence and the per-residue topology string.
//!
//! ```text
//! >5B_000001 | GLOB
//! MKVLAAALLLSSAVNA
//! SSSSSSSSSSSSOOOO
//! >5B_000002 | TM
//! MRWLLLVVAVLAQSTA
//! IIIIMMMMMMMMMMOO
//! ```
//!
//! Only header lines are considered. The identifier is taken from the text
//! before the `|` separator. Normalizing the whole header instead would let
//! digits within the topology class leak into the identifier.

use std::path::PathBuf;
use std::str::FromStr;

use nonempty::NonEmpty;

use crate::isolate::Isolate;
use crate::prediction;
use crate::prediction::Error;
use crate::prediction::PassingSet;
use crate::prediction::Tool;
use crate::resolve::Patterns;

/// The prefix for a header line.
pub const HEADER_PREFIX: char = '>';

/// The separator between the identifier and the topology class.
pub const TAG_SEPARATOR: char = '|';

/// The name of the predictions file within a DeepTMHMM run directory.
pub const PREDICTIONS_FILE_NAME: &str = "predicted_topologies.3line";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a DeepTMHMM header line.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The header has no `|` separator.
    MissingTag(String),

    /// The header has no identifier before the separator.
    MissingIdentifier(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingTag(line) => {
                write!(f, "missing `{TAG_SEPARATOR}` topology tag: \"{line}\"")
            }
            ParseError::MissingIdentifier(line) => write!(f, "missing identifier: \"{line}\""),
        }
    }
}

impl std::error::Error for ParseError {}

////////////////////////////////////////////////////////////////////////////////////////
// Topology
////////////////////////////////////////////////////////////////////////////////////////

/// A predicted topology class.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Topology {
    /// A globular protein without a signal peptide (`GLOB`).
    Globular,

    /// A globular protein with a signal peptide (`SP+GLOB`).
    SignalPeptideGlobular,

    /// An alpha-helical transmembrane protein (`TM`).
    Transmembrane,

    /// An alpha-helical transmembrane protein with a signal peptide (`SP+TM`).
    SignalPeptideTransmembrane,

    /// A beta-barrel transmembrane protein (`BETA`).
    BetaBarrel,

    /// An unrecognized class.
    Unknown(String),
}

impl Topology {
    /// Returns whether the class predicts no membrane-spanning region.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::prediction::deeptmhmm::Topology;
    ///
    /// assert!(Topology::SignalPeptideGlobular.is_membrane_free());
    /// assert!(!Topology::SignalPeptideTransmembrane.is_membrane_free());
    /// ```
    pub fn is_membrane_free(&self) -> bool {
        matches!(self, Topology::Globular | Topology::SignalPeptideGlobular)
    }
}

impl FromStr for Topology {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GLOB" => Topology::Globular,
            "SP+GLOB" => Topology::SignalPeptideGlobular,
            "TM" => Topology::Transmembrane,
            "SP+TM" => Topology::SignalPeptideTransmembrane,
            "BETA" => Topology::BetaBarrel,
            tag => Topology::Unknown(tag.to_owned()),
        })
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Globular => write!(f, "GLOB"),
            Topology::SignalPeptideGlobular => write!(f, "SP+GLOB"),
            Topology::Transmembrane => write!(f, "TM"),
            Topology::SignalPeptideTransmembrane => write!(f, "SP+TM"),
            Topology::BetaBarrel => write!(f, "BETA"),
            Topology::Unknown(tag) => write!(f, "{tag}"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Records and lines
////////////////////////////////////////////////////////////////////////////////////////

/// A parsed DeepTMHMM header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The raw identifier.
    identifier: String,

    /// The raw topology tag.
    tag: String,

    /// The parsed topology class.
    topology: Topology,
}

impl Record {
    /// Gets the raw identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Gets the raw topology tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Gets the topology class.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }
}

impl prediction::Record for Record {
    fn raw_identifier(&self) -> &str {
        &self.identifier
    }
}

impl FromStr for Record {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let header = s.trim();
        let header = header.strip_prefix(HEADER_PREFIX).unwrap_or(header);

        let (identifier, tag) = header
            .split_once(TAG_SEPARATOR)
            .ok_or_else(|| ParseError::MissingTag(s.to_owned()))?;

        let identifier = identifier
            .split_whitespace()
            .next()
            .ok_or_else(|| ParseError::MissingIdentifier(s.to_owned()))?;
        let tag = tag.trim();

        Ok(Record {
            identifier: identifier.to_owned(),
            tag: tag.to_owned(),
            // SAFETY: parsing a topology is infallible.
            topology: tag.parse().unwrap(),
        })
    }
}

/// A line within a DeepTMHMM 3line file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    /// An empty line.
    Empty,

    /// A header line.
    Header(Record),

    /// A sequence or topology line.
    Body,
}

impl FromStr for Line {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            Ok(Line::Empty)
        } else if s.starts_with(HEADER_PREFIX) {
            s.parse().map(Line::Header)
        } else {
            Ok(Line::Body)
        }
    }
}

impl prediction::Line for Line {
    type Record = Record;

    fn into_record(self) -> Option<Record> {
        match self {
            Line::Header(record) => Some(record),
            _ => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Extractor
////////////////////////////////////////////////////////////////////////////////////////

/// Extracts DeepTMHMM passing sets from every file matched by a set of glob
/// patterns.
///
/// A header passes if its topology tag contains any of the pass substrings.
#[derive(Clone, Debug)]
pub struct DeepTmhmm {
    /// The results directory.
    results_dir: PathBuf,

    /// The patterns (relative to the results directory) naming the 3line
    /// files of an isolate.
    patterns: Patterns,

    /// The substrings, any of which makes a tag pass.
    pass: NonEmpty<String>,
}

impl DeepTmhmm {
    /// Creates a new DeepTMHMM extractor.
    pub fn new(results_dir: impl Into<PathBuf>, patterns: Patterns, pass: NonEmpty<String>) -> Self {
        Self {
            results_dir: results_dir.into(),
            patterns,
            pass,
        }
    }

    /// Returns whether a record passes.
    ///
    /// # Examples
    ///
    /// ```
    /// use nonempty::nonempty;
    /// use secretome::prediction::deeptmhmm::DeepTmhmm;
    /// use secretome::prediction::deeptmhmm::Record;
    /// use secretome::resolve::Patterns;
    ///
    /// let patterns = Patterns::try_from(vec![String::from("{isolate}_*.3line")])?;
    /// let extractor = DeepTmhmm::new(".", patterns, nonempty![String::from("GLOB"), String::from("SP")]);
    ///
    /// assert!(extractor.passes(&">5B_000001 | GLOB".parse::<Record>()?));
    /// assert!(extractor.passes(&">5B_000002 | SP+GLOB".parse::<Record>()?));
    /// assert!(!extractor.passes(&">5B_000003 | TM".parse::<Record>()?));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn passes(&self, record: &Record) -> bool {
        self.pass.iter().any(|needle| record.tag.contains(needle.as_str()))
    }
}

impl prediction::Extractor for DeepTmhmm {
    fn tool(&self) -> Tool {
        Tool::DeepTmhmm
    }

    fn passing_set(&self, isolate: &Isolate) -> prediction::Result<PassingSet> {
        let paths = self
            .patterns
            .matches(&self.results_dir, isolate)
            .map_err(Error::Resolve)?;

        prediction::read_all::<Line>(Tool::DeepTmhmm, &paths, isolate, |record| {
            self.passes(record)
        })
    }
}
