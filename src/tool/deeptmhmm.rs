//! Running DeepTMHMM through the `biolib` batch client.
//!
//! The proteome of each isolate is split into chunks, every chunk is
//! submitted in turn, and the predictions of the successful chunks are
//! merged into `{results_dir}/{isolate}_merged.3line`.
//!
//! The batch client writes its results into a new directory under its
//! working directory. That directory is found by comparing the entries of
//! the working directory before and after the run, and is moved to
//! `{results_dir}/chunks/{chunk}`.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::{self};
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use tracing::error;
use tracing::info;
use tracing::warn;

use crate::chunk;
use crate::chunk::Chunk;
use crate::config::Config;
use crate::isolate::Isolate;
use crate::outcome::BatchReport;
use crate::outcome::Outcome;
use crate::prediction::deeptmhmm::PREDICTIONS_FILE_NAME;
use crate::resolve::Candidates;
use crate::tool::Error;
use crate::tool::Program;
use crate::tool::Result;
use crate::tool::Status;

/// The suffix of a merged predictions file.
pub const MERGED_SUFFIX: &str = "_merged.3line";

/// The name of the subdirectory holding per-chunk results.
pub const CHUNKS_DIR: &str = "chunks";

/// Lists the entries of a directory.
fn entries(dir: &Path) -> io::Result<BTreeSet<OsString>> {
    std::fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.file_name()))
        .collect()
}

/// Wraps an I/O error with the path at which it occurred.
fn at(path: &Path) -> impl FnOnce(io::Error) -> Error {
    let path = path.to_path_buf();
    move |err| Error::Io(path, err)
}

/// A DeepTMHMM runner.
#[derive(Clone, Debug)]
pub struct Runner {
    /// The batch client executable.
    program: String,

    /// The application submitted through the batch client.
    application: String,

    /// The directory containing the proteomes.
    input_dir: PathBuf,

    /// The proteome file names, tried in order for each isolate.
    candidates: Candidates,

    /// The directory receiving chunk files.
    chunk_dir: PathBuf,

    /// The working directory of the batch client.
    work_dir: PathBuf,

    /// The directory receiving per-chunk results and merged predictions.
    results_dir: PathBuf,

    /// The maximum number of records per chunk.
    chunk_size: NonZeroUsize,
}

impl Runner {
    /// Creates a runner from a configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.deeptmhmm.program.clone(),
            application: config.deeptmhmm.application.clone(),
            input_dir: config.input_dir.clone(),
            candidates: config.fasta_candidates.clone(),
            chunk_dir: config.deeptmhmm.chunk_dir.clone(),
            work_dir: config.deeptmhmm.work_dir.clone(),
            results_dir: config.deeptmhmm.results_dir.clone(),
            chunk_size: config.chunk_size(),
        }
    }

    /// Gets the command for one chunk.
    pub fn command(&self, chunk: &Path) -> Program {
        Program::new(&self.program)
            .arg("run")
            .arg(&self.application)
            .arg("--fasta")
            .arg(chunk)
            .current_dir(&self.work_dir)
    }

    /// Gets the directory that receives the results of a chunk.
    pub fn chunk_results_dir(&self, chunk: &Chunk) -> PathBuf {
        self.results_dir.join(CHUNKS_DIR).join(chunk.name())
    }

    /// Gets the merged predictions file for an isolate.
    pub fn merged_file(&self, isolate: &Isolate) -> PathBuf {
        self.results_dir.join(format!("{isolate}{MERGED_SUFFIX}"))
    }

    /// Runs one chunk and moves its run directory into place.
    fn run_chunk(&self, chunk: &Chunk) -> Result<Status> {
        let destination = self.chunk_results_dir(chunk);

        if destination.join(PREDICTIONS_FILE_NAME).is_file() {
            info!("skipping chunk {}: already processed", chunk.name());
            return Ok(Status::AlreadyProcessed);
        }

        std::fs::create_dir_all(&self.work_dir).map_err(at(&self.work_dir))?;
        let source = std::path::absolute(chunk.path()).map_err(at(chunk.path()))?;

        let before = entries(&self.work_dir).map_err(at(&self.work_dir))?;
        self.command(&source).run()?;
        let after = entries(&self.work_dir).map_err(at(&self.work_dir))?;

        let run_dir = after
            .difference(&before)
            .map(|name| self.work_dir.join(name))
            .find(|path| path.is_dir())
            .ok_or_else(|| {
                Error::MissingOutput(format!(
                    "no new run directory appeared in `{}` for chunk {}",
                    self.work_dir.display(),
                    chunk.name()
                ))
            })?;

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(at(parent))?;
        }

        if destination.is_dir() {
            std::fs::remove_dir_all(&destination).map_err(at(&destination))?;
        }

        std::fs::rename(&run_dir, &destination).map_err(at(&run_dir))?;
        info!("chunk {} complete", chunk.name());

        Ok(Status::Completed)
    }

    /// Runs every chunk of an isolate's proteome and merges the results.
    ///
    /// Chunks are named after the isolate. The outcome of every chunk is
    /// added to the report, followed by the outcome of the merge (under the
    /// isolate's name).
    pub fn run_proteome(&self, isolate: &Isolate, proteome: &Path, report: &mut BatchReport<Status>) {
        let stem = isolate.name();
        info!("processing {stem} (`{}`)", proteome.display());

        let chunks = match chunk::split(proteome, &self.chunk_dir, stem, self.chunk_size) {
            Ok(chunks) => chunks,
            Err(err) => {
                error!("unable to split `{}`: {err}", proteome.display());
                report.push(stem, Outcome::Failure(format!("splitting failed: {err}")));
                return;
            }
        };

        let mut completed = Vec::new();

        for chunk in &chunks {
            let result = self.run_chunk(chunk);

            match &result {
                Ok(_) => completed.push(self.chunk_results_dir(chunk).join(PREDICTIONS_FILE_NAME)),
                Err(err) => warn!("chunk {} failed: {err}", chunk.name()),
            }

            report.push(chunk.name(), Outcome::from(result));
        }

        if completed.is_empty() {
            warn!("no successful chunks for {stem}; nothing to merge");
            report.push(stem, Outcome::Success(Status::NoInput));
            return;
        }

        let merged = self.merged_file(isolate);
        let outcome = match chunk::merge(&completed, &merged) {
            Ok(count) => {
                info!(
                    "merged {count} of {} chunk(s) into `{}`",
                    chunks.len(),
                    merged.display()
                );
                Outcome::Success(Status::Completed)
            }
            Err(err) => {
                error!("unable to merge predictions for {stem}: {err}");
                Outcome::Failure(format!("merging failed: {err}"))
            }
        };

        report.push(stem, outcome);
    }

    /// Runs DeepTMHMM for every isolate.
    ///
    /// An isolate without a proteome is reported as [`Status::NoInput`].
    pub fn run<'a>(&self, isolates: impl IntoIterator<Item = &'a Isolate>) -> BatchReport<Status> {
        let mut report = BatchReport::default();

        for isolate in isolates {
            match crate::tool::find_proteome("DeepTMHMM", isolate, &self.input_dir, &self.candidates) {
                Some(proteome) => self.run_proteome(isolate, &proteome, &mut report),
                None => report.push(isolate.name(), Outcome::Success(Status::NoInput)),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;

    fn runner(root: &Path, program: &str) -> Runner {
        let mut config = Config::default();
        config.input_dir = root.join("input");
        config.chunk_size = 2;
        config.deeptmhmm.program = program.to_owned();
        config.deeptmhmm.chunk_dir = root.join("chunks");
        config.deeptmhmm.work_dir = root.join("work");
        config.deeptmhmm.results_dir = root.join("final");
        Runner::from_config(&config)
    }

    #[test]
    fn test_command() {
        let runner = runner(Path::new("root"), "biolib");
        let program = runner.command(Path::new("/abs/5B_part1.faa"));

        assert_eq!(
            program.command_line(),
            "biolib run DTU/DeepTMHMM --fasta /abs/5B_part1.faa"
        );
    }

    fn isolate(name: &str) -> Isolate {
        name.parse().unwrap()
    }

    #[test]
    fn test_paths() {
        let runner = runner(Path::new("root"), "biolib");
        assert_eq!(
            runner.merged_file(&isolate("5B")),
            PathBuf::from("root/final/5B_merged.3line")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_split_run_merge() -> std::result::Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::PermissionsExt as _;

        let dir = TempDir::new("deeptmhmm")?;
        let root = dir.path();
        fs::create_dir_all(root.join("input"))?;
        fs::write(
            root.join("input").join("5B.sanitized.faa"),
            ">5B_000001\nMKV\n>5B_000002\nMAL\n>5B_000003\nMKK\n",
        )?;

        // A stand-in client that writes one header per input record into a
        // fresh run directory.
        let client = root.join("client.sh");
        fs::write(
            &client,
            "#!/bin/sh\nrun=\"run_$$\"\nmkdir \"$run\"\ngrep '^>' \"$4\" | sed 's/$/ | GLOB/' > \"$run/predicted_topologies.3line\"\n",
        )?;
        fs::set_permissions(&client, fs::Permissions::from_mode(0o755))?;

        let runner = runner(root, &client.to_string_lossy());
        let isolates = [isolate("5B"), isolate("B20")];
        let report = runner.run(&isolates);

        assert!(report.is_success(), "{report}");
        assert_eq!(
            report.units().iter().map(|(unit, _)| unit.as_str()).collect::<Vec<_>>(),
            vec!["5B_part1", "5B_part2", "5B", "B20"]
        );
        assert_eq!(report.units()[3].1, Outcome::Success(Status::NoInput));

        assert_eq!(
            fs::read_to_string(runner.merged_file(&isolates[0]))?,
            ">5B_000001 | GLOB\n>5B_000002 | GLOB\n>5B_000003 | GLOB\n"
        );

        let again = runner.run(&isolates[..1]);
        assert_eq!(
            again.successes().map(|(_, status)| *status).collect::<Vec<_>>(),
            vec![Status::AlreadyProcessed, Status::AlreadyProcessed, Status::Completed]
        );

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_run_directory_is_a_chunk_failure() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("deeptmhmm")?;
        let root = dir.path();
        fs::create_dir_all(root.join("input"))?;
        fs::write(root.join("input").join("5C.faa"), ">5C_000001\nMKV\n")?;

        let runner = runner(root, "true");
        let report = runner.run([&isolate("5C")]);

        assert_eq!(report.failures().count(), 1);
        assert_eq!(
            report.successes().collect::<Vec<_>>(),
            vec![("5C", &Status::NoInput)]
        );
        assert!(!runner.merged_file(&isolate("5C")).exists());

        Ok(())
    }
}
