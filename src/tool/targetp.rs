//! Running TargetP 2 for each isolate's proteome.

use std::path::Path;
use std::path::PathBuf;

use crate::config::Config;
use crate::isolate::Isolate;
use crate::outcome::BatchReport;
use crate::resolve::Candidates;
use crate::tool::Program;
use crate::tool::Status;

/// A TargetP runner.
#[derive(Clone, Debug)]
pub struct Runner {
    /// The TargetP executable.
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
            &config.targetp.program,
            &config.input_dir,
            config.fasta_candidates.clone(),
            &config.targetp.results_dir,
        )
    }

    /// Gets the command for one proteome (eukaryotic, short format).
    pub fn command(&self, fasta: &Path, output_dir: &Path) -> Program {
        Program::new(&self.program)
            .arg("-fasta")
            .arg(fasta)
            .args(["-org", "euk", "-format", "short", "-out_dir"])
            .arg(output_dir)
    }

    /// Runs TargetP for every isolate that has not already been processed.
    ///
    /// Results are written to `{output_dir}/{isolate}`.
    pub fn run<'a>(&self, isolates: impl IntoIterator<Item = &'a Isolate>) -> BatchReport<Status> {
        crate::tool::run_per_isolate(
            "TargetP",
            isolates,
            &self.input_dir,
            &self.candidates,
            &self.output_dir,
            |fasta, out| self.command(fasta, out),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command() {
        let candidates = Config::default().fasta_candidates;
        let runner = Runner::new("targetp", "in", candidates, "out");
        let program = runner.command(Path::new("in/B20.faa"), Path::new("out/B20"));

        assert_eq!(
            program.command_line(),
            "targetp -fasta in/B20.faa -org euk -format short -out_dir out/B20"
        );
    }
}
