//! Running EffectorP over the filtered secretomes.

use std::path::Path;
use std::path::PathBuf;

use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::consensus;
use crate::effector;
use crate::isolate::Isolate;
use crate::outcome::BatchReport;
use crate::outcome::Outcome;
use crate::tool::Error;
use crate::tool::Program;
use crate::tool::Status;

/// An EffectorP runner.
#[derive(Clone, Debug)]
pub struct Runner {
    /// The interpreter.
    program: String,

    /// The EffectorP script.
    script: PathBuf,

    /// The directory containing the filtered secretomes.
    input_dir: PathBuf,

    /// The directory receiving the results.
    output_dir: PathBuf,
}

impl Runner {
    /// Creates a runner from a configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.effectorp.program.clone(),
            script: config.effectorp.script.clone(),
            input_dir: config.output_dir.clone(),
            output_dir: config.effectorp.results_dir.clone(),
        }
    }

    /// Gets the command for one secretome.
    pub fn command(&self, fasta: &Path, output: &Path) -> Program {
        Program::new(&self.program)
            .arg(&self.script)
            .arg("-i")
            .arg(fasta)
            .arg("-o")
            .arg(output)
    }

    /// Runs EffectorP for one isolate.
    ///
    /// An isolate without a secretome (for example, one whose consensus was
    /// empty) is not an error.
    pub fn run_isolate(&self, isolate: &Isolate) -> Outcome<Status> {
        let fasta = consensus::output_file(&self.input_dir, isolate);
        let output = effector::results_file(&self.output_dir, isolate);

        if !fasta.is_file() {
            warn!("{isolate}: no secretome at `{}`", fasta.display());
            return Outcome::Success(Status::NoInput);
        }

        if std::fs::metadata(&output).map(|m| m.len() > 0).unwrap_or(false) {
            info!("skipping {isolate}: EffectorP results already exist");
            return Outcome::Success(Status::AlreadyProcessed);
        }

        info!("running EffectorP on `{}`", fasta.display());

        let result = std::fs::create_dir_all(&self.output_dir)
            .map_err(|err| Error::Io(self.output_dir.clone(), err))
            .and_then(|_| self.command(&fasta, &output).run())
            .map(|_| Status::Completed);

        if let Err(err) = &result {
            error!("EffectorP failed for {isolate}: {err}");
        }

        Outcome::from(result)
    }

    /// Runs EffectorP for every isolate, in order.
    pub fn run<'a>(&self, isolates: impl IntoIterator<Item = &'a Isolate>) -> BatchReport<Status> {
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

    #[test]
    fn test_command_and_missing_input() {
        let mut config = Config::default();
        config.output_dir = PathBuf::from("secretomes-that-do-not-exist");
        config.effectorp.results_dir = PathBuf::from("effectorp");

        let runner = Runner::from_config(&config);
        let program = runner.command(
            Path::new("in/B20.secretome.faa"),
            Path::new("effectorp/B20_effectorp_results.txt"),
        );

        assert_eq!(
            program.command_line(),
            "python3 EffectorP-3.0/EffectorP.py -i in/B20.secretome.faa -o effectorp/B20_effectorp_results.txt"
        );

        let isolate = "B20".parse::<Isolate>().unwrap();
        assert_eq!(
            runner.run([&isolate]).units(),
            &[(String::from("B20"), Outcome::Success(Status::NoInput))]
        );
    }
}
