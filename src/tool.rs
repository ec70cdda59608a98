//! Invocation of the external predictors.
//!
//! Every predictor is run synchronously with [`std::process::Command`], one
//! unit of work at a time. A unit that fails is recorded in the returned
//! [`BatchReport`] and the batch moves on to the next unit.

use std::ffi::OsStr;
use std::ffi::OsString;
use std::io::{self};
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Output;
use std::process::Stdio;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::fasta;
use crate::isolate::Isolate;
use crate::outcome::BatchReport;
use crate::outcome::Outcome;
use crate::resolve::Candidates;

pub mod deeptmhmm;
pub mod effectorp;
pub mod signalp;
pub mod targetp;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to running an external tool.
#[derive(Debug)]
pub enum Error {
    /// The program could not be started.
    Spawn(String, io::Error),

    /// The program exited unsuccessfully.
    ExitStatus {
        /// The command line that was run.
        command: String,

        /// The exit status.
        status: ExitStatus,

        /// The captured standard error.
        stderr: String,
    },

    /// An I/O error while preparing inputs or collecting outputs.
    Io(PathBuf, io::Error),

    /// The program completed without producing the expected output.
    MissingOutput(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Spawn(command, err) => write!(f, "unable to run `{command}`: {err}"),
            Error::ExitStatus {
                command,
                status,
                stderr,
            } => {
                write!(f, "`{command}` exited with {status}")?;

                match stderr.trim() {
                    "" => Ok(()),
                    stderr => write!(f, ": {stderr}"),
                }
            }
            Error::Io(path, err) => write!(f, "i/o error at `{}`: {err}", path.display()),
            Error::MissingOutput(reason) => write!(f, "missing output: {reason}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Programs
////////////////////////////////////////////////////////////////////////////////////////

/// An external program along with its arguments.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
    /// The executable.
    executable: OsString,

    /// The arguments.
    args: Vec<OsString>,

    /// The working directory.
    current_dir: Option<PathBuf>,
}

impl Program {
    /// Creates a new program from an executable.
    pub fn new(executable: impl AsRef<OsStr>) -> Self {
        Self {
            executable: executable.as_ref().to_owned(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Adds an argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Adds several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_owned()));
        self
    }

    /// Sets the working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Gets the arguments.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Gets the command line, for display.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::tool::Program;
    ///
    /// let program = Program::new("targetp").args(["-org", "euk"]);
    /// assert_eq!(program.command_line(), "targetp -org euk");
    /// ```
    pub fn command_line(&self) -> String {
        std::iter::once(&self.executable)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the program to completion, capturing its output.
    pub fn run(&self) -> Result<Output> {
        let command = self.command_line();
        debug!("running `{command}`");

        let mut process = Command::new(&self.executable);
        process
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.current_dir {
            process.current_dir(dir);
        }

        let output = process
            .output()
            .map_err(|err| Error::Spawn(command.clone(), err))?;

        if !output.status.success() {
            return Err(Error::ExitStatus {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(output)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Proteome batches
////////////////////////////////////////////////////////////////////////////////////////

/// The status of a successful unit of work.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// The tool was run.
    Completed,

    /// The outputs already existed, so the tool was not run.
    AlreadyProcessed,

    /// There was no input for the unit, so the tool was not run.
    NoInput,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Completed => write!(f, "completed"),
            Status::AlreadyProcessed => write!(f, "already processed"),
            Status::NoInput => write!(f, "no input"),
        }
    }
}

/// The name of the subdirectory, within a tool's results directory, that
/// receives decompressed copies of gzipped proteomes.
pub const STAGING_DIR: &str = ".staged";

/// Returns whether an output directory exists and is not empty.
pub fn is_processed(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Finds the proteome of an isolate, logging when there is none.
pub(crate) fn find_proteome(
    name: &str,
    isolate: &Isolate,
    input_dir: &Path,
    candidates: &Candidates,
) -> Option<PathBuf> {
    let proteome = candidates.first_existing(input_dir, isolate);

    if proteome.is_none() {
        warn!(
            "{isolate}: no proteome for {name} in `{}`",
            input_dir.display()
        );
    }

    proteome
}

/// Runs a per-proteome tool for every isolate.
///
/// The proteome of each isolate is the first of `candidates` that exists in
/// `input_dir`; an isolate without one is reported as [`Status::NoInput`].
/// Each isolate gets its own output directory, `{output_dir}/{isolate}`,
/// which is skipped when it already exists and is not empty. Gzipped
/// proteomes are decompressed into [`STAGING_DIR`] first. The `command`
/// closure builds the program for a proteome and its output directory.
pub(crate) fn run_per_isolate<'a, I, F>(
    name: &str,
    isolates: I,
    input_dir: &Path,
    candidates: &Candidates,
    output_dir: &Path,
    command: F,
) -> BatchReport<Status>
where
    I: IntoIterator<Item = &'a Isolate>,
    F: Fn(&Path, &Path) -> Program,
{
    let mut report = BatchReport::default();

    for isolate in isolates {
        let Some(proteome) = find_proteome(name, isolate, input_dir, candidates) else {
            report.push(isolate.name(), Outcome::Success(Status::NoInput));
            continue;
        };

        let out = output_dir.join(isolate.name());

        if is_processed(&out) {
            info!("skipping {isolate}: {name} output already exists");
            report.push(isolate.name(), Outcome::Success(Status::AlreadyProcessed));
            continue;
        }

        info!("running {name} on `{}`", proteome.display());

        let staging = output_dir.join(STAGING_DIR);
        let result = fasta::plain(&proteome, &staging, isolate.name())
            .map_err(|err| Error::Io(proteome.clone(), err))
            .and_then(|fasta| {
                std::fs::create_dir_all(&out)
                    .map_err(|err| Error::Io(out.clone(), err))
                    .map(|_| fasta)
            })
            .and_then(|fasta| command(&fasta, &out).run())
            .map(|_| Status::Completed);

        if let Err(err) = &result {
            error!("{name} failed for {isolate}: {err}");
        }

        report.push(isolate.name(), Outcome::from(result));
    }

    report
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;
    use crate::config::Config;

    #[test]
    fn test_is_processed() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("tool")?;
        let out = dir.path().join("5B");

        assert!(!is_processed(&out));

        fs::create_dir_all(&out)?;
        assert!(!is_processed(&out));

        fs::write(out.join("prediction_results.txt"), "")?;
        assert!(is_processed(&out));

        Ok(())
    }

    #[test]
    fn test_spawn_failure() {
        let err = Program::new("secretome-no-such-program")
            .arg("--version")
            .run()
            .unwrap_err();

        assert!(matches!(err, Error::Spawn(..)));
        assert!(err
            .to_string()
            .starts_with("unable to run `secretome-no-such-program --version`"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_carries_stderr() {
        let err = Program::new("sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .run()
            .unwrap_err();

        match &err {
            Error::ExitStatus { stderr, .. } => assert_eq!(stderr.trim(), "broken"),
            _ => panic!("unexpected error: {err}"),
        }
    }

    fn isolates(names: &[&str]) -> Vec<Isolate> {
        names.iter().map(|name| name.parse().unwrap()).collect()
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_unit_does_not_halt_batch() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("tool")?;
        let input = dir.path().join("input");
        let output = dir.path().join("output");
        fs::create_dir_all(&input)?;
        fs::create_dir_all(output.join("5C"))?;

        for name in ["5B.faa", "5C.faa", "B20.faa"] {
            fs::write(input.join(name), ">x_1\nM\n")?;
        }
        fs::write(output.join("5C").join("done"), "")?;

        let candidates = Config::default().fasta_candidates;
        let report = run_per_isolate(
            "test",
            &isolates(&["5B", "5C", "B20", "E282"]),
            &input,
            &candidates,
            &output,
            |fasta, _| {
                let script = if fasta.ends_with("5B.faa") { "exit 1" } else { "exit 0" };
                Program::new("sh").args(["-c", script])
            },
        );

        assert_eq!(report.len(), 4);
        assert_eq!(report.failures().map(|(unit, _)| unit).collect::<Vec<_>>(), vec!["5B"]);
        assert_eq!(
            report.successes().collect::<Vec<_>>(),
            vec![
                ("5C", &Status::AlreadyProcessed),
                ("B20", &Status::Completed),
                ("E282", &Status::NoInput)
            ]
        );

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_fallback_proteomes_are_keyed_by_isolate() -> std::result::Result<(), Box<dyn std::error::Error>> {
        use std::io::Write as _;

        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = TempDir::new("tool")?;
        let input = dir.path().join("input");
        let output = dir.path().join("output");
        fs::create_dir_all(&input)?;

        fs::write(input.join("5B.sanitized.faa"), ">5B_000001\nMKV\n")?;

        let mut encoder = GzEncoder::new(fs::File::create(input.join("B20.faa.gz"))?, Compression::default());
        encoder.write_all(b">B20_000001\nMAL\n")?;
        encoder.finish()?;

        // Copies the (plain) input into the output directory.
        let candidates = Config::default().fasta_candidates;
        let report = run_per_isolate(
            "test",
            &isolates(&["5B", "B20"]),
            &input,
            &candidates,
            &output,
            |fasta, out| {
                Program::new("cp")
                    .arg(fasta)
                    .arg(out.join("prediction_results.txt"))
            },
        );

        assert!(report.is_success(), "{report}");
        assert_eq!(
            report.units().iter().map(|(unit, _)| unit.as_str()).collect::<Vec<_>>(),
            vec!["5B", "B20"]
        );
        assert_eq!(
            fs::read_to_string(output.join("5B").join("prediction_results.txt"))?,
            ">5B_000001\nMKV\n"
        );
        assert_eq!(
            fs::read_to_string(output.join("B20").join("prediction_results.txt"))?,
            ">B20_000001\nMAL\n"
        );

        Ok(())
    }
}
