//! Configuration for an analysis.
//!
//! Every path, isolate, pass criterion, and external program used by the
//! pipeline is described here and handed explicitly to each component. A
//! configuration can be read from a JSON file in which every field is
//! optional:
//!
//! ```json
//! {
//!   "input_dir": "data/protein_input",
//!   "isolates": ["5B", "B20"],
//!   "chunk_size": 500,
//!   "deeptmhmm": { "pass_substrings": ["GLOB"] }
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::io::{self};
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::isolate::Isolate;
use crate::prediction::deeptmhmm::DeepTmhmm;
use crate::prediction::signalp;
use crate::prediction::signalp::SignalP;
use crate::prediction::targetp::TargetP;
use crate::resolve::Candidates;
use crate::resolve::Patterns;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(PathBuf, io::Error),

    /// The configuration file could not be deserialized.
    Json(PathBuf, serde_json::Error),

    /// The configuration is invalid.
    Invalid(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(path, err) => write!(f, "i/o error reading `{}`: {err}", path.display()),
            Error::Json(path, err) => write!(f, "invalid configuration `{}`: {err}", path.display()),
            Error::Invalid(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Builds a list of owned strings.
fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

////////////////////////////////////////////////////////////////////////////////////////
// Tool configurations
////////////////////////////////////////////////////////////////////////////////////////

/// SignalP settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalPConfig {
    /// The directory with one results subdirectory per isolate.
    pub results_dir: PathBuf,

    /// The name of the results table within each subdirectory.
    pub file_name: String,

    /// The verdict token that passes (exact match).
    pub pass_verdict: String,

    /// The SignalP executable.
    pub program: String,
}

impl Default for SignalPConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results/signalp_outputs"),
            file_name: String::from(signalp::DEFAULT_FILE_NAME),
            pass_verdict: String::from("SP"),
            program: String::from("signalp6"),
        }
    }
}

impl SignalPConfig {
    /// Creates the passing set extractor.
    pub fn extractor(&self) -> SignalP {
        SignalP::new(
            &self.results_dir,
            &self.file_name,
            // SAFETY: parsing a verdict is infallible.
            self.pass_verdict.parse().unwrap(),
        )
    }
}

/// TargetP settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetPConfig {
    /// The directory with one results subdirectory per isolate.
    pub results_dir: PathBuf,

    /// The glob patterns naming an isolate's summary files.
    pub patterns: Patterns,

    /// The localization token that passes (exact match).
    pub pass_localization: String,

    /// The TargetP executable.
    pub program: String,
}

impl Default for TargetPConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results/targetp_outputs"),
            // SAFETY: the list is not empty.
            patterns: Patterns::try_from(strings(&[
                "{isolate}/*.targetp2",
                "{isolate}/*summary*",
            ]))
            .unwrap(),
            pass_localization: String::from("SP"),
            program: String::from("targetp"),
        }
    }
}

impl TargetPConfig {
    /// Creates the passing set extractor.
    pub fn extractor(&self) -> TargetP {
        TargetP::new(
            &self.results_dir,
            self.patterns.clone(),
            // SAFETY: parsing a localization is infallible.
            self.pass_localization.parse().unwrap(),
        )
    }
}

/// DeepTMHMM settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeepTmhmmConfig {
    /// The directory receiving merged predictions (and the `chunks`
    /// subdirectory).
    pub results_dir: PathBuf,

    /// The directory receiving the split proteome chunks.
    pub chunk_dir: PathBuf,

    /// The working directory in which the batch client creates run
    /// directories.
    pub work_dir: PathBuf,

    /// The glob patterns naming an isolate's 3line files.
    pub patterns: Patterns,

    /// The tag substrings, any of which passes.
    pub pass_substrings: Vec<String>,

    /// The batch client executable.
    pub program: String,

    /// The application submitted through the batch client.
    pub application: String,
}

impl Default for DeepTmhmmConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results/deeptmhmm_final"),
            chunk_dir: PathBuf::from("temp/chunks"),
            work_dir: PathBuf::from("temp/biolib_runs"),
            // SAFETY: the list is not empty.
            patterns: Patterns::try_from(strings(&["{isolate}_*.3line", "{isolate}/*.3line"]))
                .unwrap(),
            pass_substrings: strings(&["GLOB", "SP"]),
            program: String::from("biolib"),
            application: String::from("DTU/DeepTMHMM"),
        }
    }
}

impl DeepTmhmmConfig {
    /// Creates the passing set extractor.
    ///
    /// The configuration must have been [validated](Config::validate) so that
    /// there is at least one pass substring; otherwise `GLOB` is used.
    pub fn extractor(&self) -> DeepTmhmm {
        let pass = NonEmpty::from_vec(self.pass_substrings.clone())
            .unwrap_or_else(|| NonEmpty::new(String::from("GLOB")));

        DeepTmhmm::new(&self.results_dir, self.patterns.clone(), pass)
    }
}

/// EffectorP settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectorPConfig {
    /// The directory receiving `{isolate}_effectorp_results.txt` files.
    pub results_dir: PathBuf,

    /// The interpreter used to run EffectorP.
    pub program: String,

    /// The EffectorP script.
    pub script: PathBuf,
}

impl Default for EffectorPConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results/effectorp_results"),
            program: String::from("python3"),
            script: PathBuf::from("EffectorP-3.0/EffectorP.py"),
        }
    }
}

/// Pfam domain search settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PfamConfig {
    /// The Pfam HMM database.
    pub database: PathBuf,

    /// The directory containing the candidate FASTA files.
    pub candidates_dir: PathBuf,

    /// The file name suffix of a candidate FASTA file.
    pub suffix: String,
}

impl Default for PfamConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("databases/Pfam-A.hmm"),
            candidates_dir: PathBuf::from("results/effector_candidates"),
            suffix: String::from("_filtered_candidates.faa"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Config
////////////////////////////////////////////////////////////////////////////////////////

/// The configuration for an analysis.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The directory containing one FASTA proteome per isolate.
    pub input_dir: PathBuf,

    /// The directory receiving the filtered (secretome) FASTA files.
    pub output_dir: PathBuf,

    /// The isolates to process, in order.
    pub isolates: Vec<Isolate>,

    /// The number of records per DeepTMHMM chunk.
    pub chunk_size: usize,

    /// The candidate names of an isolate's source FASTA file, in order of
    /// preference.
    pub fasta_candidates: Candidates,

    /// SignalP settings.
    pub signalp: SignalPConfig,

    /// TargetP settings.
    pub targetp: TargetPConfig,

    /// DeepTMHMM settings.
    pub deeptmhmm: DeepTmhmmConfig,

    /// EffectorP settings.
    pub effectorp: EffectorPConfig,

    /// Pfam settings.
    pub pfam: PfamConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/protein_input"),
            output_dir: PathBuf::from("results/effectorp_input"),
            isolates: Isolate::known(),
            chunk_size: 1000,
            // SAFETY: the list is not empty.
            fasta_candidates: Candidates::try_from(strings(&[
                "{isolate}.faa",
                "{isolate}.sanitized.faa",
                "{isolate}.faa.gz",
            ]))
            .unwrap(),
            signalp: SignalPConfig::default(),
            targetp: TargetPConfig::default(),
            deeptmhmm: DeepTmhmmConfig::default(),
            effectorp: EffectorPConfig::default(),
            pfam: PfamConfig::default(),
        }
    }
}

impl Config {
    /// Reads a configuration from a JSON file and validates it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| Error::Io(path.to_path_buf(), err))?;

        let config: Config = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| Error::Json(path.to_path_buf(), err))?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a configuration from a JSON string and validates it.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::Config;
    ///
    /// let config = Config::from_json(r#"{ "isolates": ["5B", "B20"], "chunk_size": 250 }"#)?;
    ///
    /// assert_eq!(config.isolates.len(), 2);
    /// assert_eq!(config.chunk_size().get(), 250);
    /// assert_eq!(config.signalp.pass_verdict, "SP");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|err| Error::Json(PathBuf::from("<string>"), err))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Invalid("`chunk_size` must be greater than zero"));
        }

        if self.isolates.is_empty() {
            return Err(Error::Invalid("at least one isolate must be configured"));
        }

        if self.deeptmhmm.pass_substrings.is_empty()
            || self.deeptmhmm.pass_substrings.iter().any(String::is_empty)
        {
            return Err(Error::Invalid(
                "`deeptmhmm.pass_substrings` must contain at least one non-empty substring",
            ));
        }

        if self.signalp.pass_verdict.is_empty() || self.targetp.pass_localization.is_empty() {
            return Err(Error::Invalid("pass tokens must not be empty"));
        }

        Ok(())
    }

    /// Gets the chunk size.
    ///
    /// A chunk size of zero (which [`Config::validate()`] rejects) is treated
    /// as one.
    pub fn chunk_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.chunk_size).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.isolates.len(), 13);
        assert_eq!(config.chunk_size().get(), 1000);
        assert_eq!(config.deeptmhmm.pass_substrings, vec!["GLOB", "SP"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config = Config::from_json(
            r#"{
                "input_dir": "proteomes",
                "fasta_candidates": ["{isolate}.fasta"],
                "targetp": { "pass_localization": "mTP" }
            }"#,
        )?;

        assert_eq!(config.input_dir, PathBuf::from("proteomes"));
        assert_eq!(config.fasta_candidates.templates().len(), 1);
        assert_eq!(config.targetp.pass_localization, "mTP");
        assert_eq!(config.targetp.program, "targetp");
        assert_eq!(config.isolates.len(), 13);

        Ok(())
    }

    #[test]
    fn test_invalid_configurations() {
        let err = Config::from_json(r#"{ "chunk_size": 0 }"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: `chunk_size` must be greater than zero"
        );

        assert!(Config::from_json(r#"{ "isolates": [] }"#).is_err());
        assert!(Config::from_json(r#"{ "isolates": ["5B C"] }"#).is_err());
        assert!(Config::from_json(r#"{ "fasta_candidates": [] }"#).is_err());
        assert!(Config::from_json(r#"{ "deeptmhmm": { "pass_substrings": [] } }"#).is_err());
        assert!(Config::from_json(r#"{ "unknown": 1 }"#).is_err());
    }
}
