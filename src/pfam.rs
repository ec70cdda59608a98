//! Generation of the Pfam domain search script.
//!
//! Every candidate FASTA file (named `{sample}{suffix}`) gets one `hmmsearch`
//! command against the Pfam-A database. The commands are collected into a
//! bash script rather than run directly, as a full Pfam search is usually
//! submitted to a cluster.

use std::fs::File;
use std::io::BufWriter;
use std::io::Write as _;
use std::io::{self};
use std::path::Path;
use std::path::PathBuf;

use tracing::info;

use crate::config::PfamConfig;

/// The name of the output subdirectory within the candidates directory.
pub const OUTPUT_DIR_NAME: &str = "pfam_annotations";

/// The file name of the generated script.
pub const SCRIPT_FILE_NAME: &str = "run_all_pfam.sh";

/// The first lines of the generated script.
pub const SCRIPT_PREAMBLE: &str = "#!/bin/bash\n\n";

/// A single `hmmsearch` invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Search {
    /// The sample name.
    sample: String,

    /// The candidate FASTA file.
    fasta: PathBuf,

    /// The domain table output.
    domtblout: PathBuf,

    /// The full (standard output) report.
    report: PathBuf,
}

impl Search {
    /// Gets the sample name.
    pub fn sample(&self) -> &str {
        &self.sample
    }

    /// Renders the shell command against a database.
    pub fn command(&self, database: &Path) -> String {
        format!(
            "hmmsearch --domtblout {} {} {} > {}",
            self.domtblout.display(),
            database.display(),
            self.fasta.display(),
            self.report.display()
        )
    }
}

/// A Pfam search script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Script {
    /// The Pfam HMM database.
    database: PathBuf,

    /// The directory receiving the search outputs and the script.
    output_dir: PathBuf,

    /// The searches, sorted by sample.
    searches: Vec<Search>,
}

impl Script {
    /// Discovers the candidate files in `candidates_dir` ending in `suffix`.
    ///
    /// Outputs are directed to `{candidates_dir}/pfam_annotations`.
    pub fn discover(candidates_dir: &Path, suffix: &str, database: &Path) -> io::Result<Self> {
        let output_dir = candidates_dir.join(OUTPUT_DIR_NAME);
        let mut searches = Vec::new();

        for entry in std::fs::read_dir(candidates_dir)? {
            let path = entry?.path();

            let sample = match path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_suffix(suffix))
            {
                Some(sample) if path.is_file() && !sample.is_empty() => sample.to_owned(),
                _ => continue,
            };

            searches.push(Search {
                domtblout: output_dir.join(format!("{sample}_pfam.domtblout")),
                report: output_dir.join(format!("{sample}_pfam_full.txt")),
                fasta: path,
                sample,
            });
        }

        searches.sort_by(|a, b| a.sample.cmp(&b.sample));

        Ok(Self {
            database: database.to_path_buf(),
            output_dir,
            searches,
        })
    }

    /// Discovers the candidate files named by a configuration.
    pub fn from_config(config: &PfamConfig) -> io::Result<Self> {
        Self::discover(&config.candidates_dir, &config.suffix, &config.database)
    }

    /// Gets the searches.
    pub fn searches(&self) -> &[Search] {
        &self.searches
    }

    /// Gets the shell commands.
    pub fn commands(&self) -> Vec<String> {
        self.searches
            .iter()
            .map(|search| search.command(&self.database))
            .collect()
    }

    /// Gets the path of the script.
    pub fn path(&self) -> PathBuf {
        self.output_dir.join(SCRIPT_FILE_NAME)
    }

    /// Writes the script (executable on unix) and returns its path.
    pub fn write(&self) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.path();
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(SCRIPT_PREAMBLE.as_bytes())?;

        for command in self.commands() {
            writeln!(writer, "{command}")?;
        }

        writer.flush()?;
        drop(writer);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        }

        info!(
            "wrote {} Pfam search(es) to `{}`",
            self.searches.len(),
            path.display()
        );

        Ok(path)
    }
}
