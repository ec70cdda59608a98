//! Running SignalP 6 for each isolate's proteome.

use std::path::Path;
use std::path::PathBuf;

use crate::config::Config;
use crate::isolate::Isolate;
use crate::outcome::BatchReport;
use crate::resolve::Candidates;
use crate::tool::Program;
use crate::tool::Status;

/// A SignalP runner.
#[derive(Clone, Debug)]
pub struct Runner {
    /// The SignalP executable.
    program: String,

    /// The directory containing the proteomes.
    input_dir: PathBuf,

    /// The proteome file names, tried in order for each isolate.
    candidates: Candidates,

    /// The directory receiving one results subdirectory per isolate.
    output_dir: PathBuf,
}

impl Runner {
    /// Creates a new runner.
    pub fn new(
        program: impl Into<String>,
        input_dir: impl Into<PathBuf>,
        candidates: Candidates,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            input_dir: input_dir.into(),
            candidates,
            output_dir: output_dir.into(),
        }
    }

    /// Creates a runner from a configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.signalp.program,
            &config.input_dir,
            config.fasta_candidates.clone(),
            &config.signalp.results_dir,
        )
    }

    /// Gets the command for one proteome.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use secretome::tool::signalp::Runner;
    /// use secretome::Config;
    ///
    /// let candidates = Config::default().fasta_candidates;
    /// let runner = Runner::new("signalp6", "in", candidates, "out");
    /// let program = runner.command(Path::new("in/5B.faa"), Path::new("out/5B"));
    ///
    /// assert_eq!(
    ///     program.command_line(),
    ///     "signalp6 --fastafile in/5B.faa --output_dir out/5B --format txt --organism eukarya --mode fast"
    /// );
    /// ```
    pub fn command(&self, fasta: &Path, output_dir: &Path) -> Program {
        Program::new(&self.program)
            .arg("--fastafile")
            .arg(fasta)
            .arg("--output_dir")
            .arg(output_dir)
            .args(["--format", "txt", "--organism", "eukarya", "--mode", "fast"])
    }

    /// Runs SignalP for every isolate that has not already been processed.
    ///
    /// Results are written to `{output_dir}/{isolate}`.
    pub fn run<'a>(&self, isolates: impl IntoIterator<Item = &'a Isolate>) -> BatchReport<Status> {
        crate::tool::run_per_isolate(
            "SignalP",
            isolates,
            &self.input_dir,
            &self.candidates,
            &self.output_dir,
            |fasta, out| self.command(fasta, out),
        )
    }
}
