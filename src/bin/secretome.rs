//! A command line tool that drives the secretome pipeline.
//!
//! ```shell
//! cargo run --release --bin=secretome --features=binaries -- --config analysis.json filter
//! ```
//!
//! Each subcommand runs one stage of the pipeline across every configured
//! isolate. A stage in which any unit of work failed exits with a non-zero
//! status once the whole batch has been attempted.

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use clap_verbosity_flag::Verbosity;
use secretome::cluster::Clusters;
use secretome::consensus::Filter;
use secretome::consensus::SummaryRow;
use secretome::effector;
use secretome::effector::ReportRow;
use secretome::matrix;
use secretome::matrix::Matrix;
use secretome::pfam::Script;
use secretome::tool;
use secretome::tool::Status;
use secretome::BatchReport;
use secretome::Config;
use secretome::Isolate;
use tabled::builder::Builder;
use tabled::settings::object::Rows;
use tabled::settings::Alignment;
use tabled::settings::Style;
use tabled::Table;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

////////////////////////////////////////////////////////////////////////////////////////
// Arguments
////////////////////////////////////////////////////////////////////////////////////////

/// Derives consensus secretomes and effector catalogues across isolates.
#[derive(Parser)]
struct Args {
    /// A JSON configuration file. Every setting not present in the file keeps
    /// its default.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the directory containing the isolate proteomes.
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,

    /// Overrides the directory receiving the filtered secretomes.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Overrides the isolates to process (comma-delimited).
    #[arg(long, global = true, value_delimiter = ',')]
    isolates: Option<Vec<Isolate>>,

    /// The stage to run.
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbose: Verbosity,
}

/// A stage of the pipeline.
#[derive(Subcommand)]
enum Command {
    /// Runs SignalP on the proteome of every isolate.
    Signalp,

    /// Runs TargetP on the proteome of every isolate.
    Targetp,

    /// Splits the proteome of every isolate, runs DeepTMHMM on each chunk,
    /// and merges the results.
    Deeptmhmm,

    /// Intersects the predictions and writes the filtered secretomes.
    Filter,

    /// Runs EffectorP on every filtered secretome.
    Effectorp,

    /// Summarizes the EffectorP results and writes the master effector list.
    Effectors {
        /// Where to write the master list (defaults to the EffectorP results
        /// directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Writes the effector presence/absence matrix.
    Matrix {
        /// Where to write the matrix (defaults to the EffectorP results
        /// directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Writes a cluster presence/absence matrix from a cluster file.
    Clusters {
        /// The cluster file.
        clusters: PathBuf,

        /// Where to write the matrix.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Writes the Pfam domain search script.
    PfamScript,
}

impl Args {
    /// Loads the configuration and applies any overrides.
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_path(path)
                .with_context(|| format!("loading configuration `{}`", path.display()))?,
            None => Config::default(),
        };

        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }

        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }

        if let Some(isolates) = &self.isolates {
            config.isolates = isolates.clone();
        }

        config.validate().context("validating configuration")?;
        Ok(config)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Reporting
////////////////////////////////////////////////////////////////////////////////////////

/// Renders a table in the house style.
fn render(table: &mut Table) -> String {
    table
        .with(Style::rounded())
        .modify(Rows::new(1..), Alignment::left())
        .to_string()
}

/// Prints the outcomes of a tool batch.
fn print_statuses(report: &BatchReport<Status>) {
    let mut builder = Builder::default();
    builder.push_record(["Unit", "Outcome"]);

    for (unit, outcome) in report.units() {
        let outcome = match outcome.success() {
            Some(status) => status.to_string(),
            None => format!("FAILED: {}", outcome.failure().unwrap_or_default()),
        };

        builder.push_record([unit.as_str(), outcome.as_str()]);
    }

    println!("{}", render(&mut builder.build()));
}

/// Reports the failures of a batch, returning whether the batch succeeded.
fn conclude<T>(report: &BatchReport<T>) -> bool {
    for (unit, reason) in report.failures() {
        error!("{unit}: {reason}");
    }

    println!("{report}");
    report.is_success()
}

////////////////////////////////////////////////////////////////////////////////////////
// Main
////////////////////////////////////////////////////////////////////////////////////////

/// Runs a stage, returning whether every unit of work succeeded.
fn run(args: &Args) -> Result<bool> {
    let config = args.load_config()?;

    match &args.command {
        Command::Signalp => {
            let report = tool::signalp::Runner::from_config(&config).run(&config.isolates);
            print_statuses(&report);
            Ok(conclude(&report))
        }
        Command::Targetp => {
            let report = tool::targetp::Runner::from_config(&config).run(&config.isolates);
            print_statuses(&report);
            Ok(conclude(&report))
        }
        Command::Deeptmhmm => {
            let report = tool::deeptmhmm::Runner::from_config(&config).run(&config.isolates);
            print_statuses(&report);
            Ok(conclude(&report))
        }
        Command::Filter => {
            let report = Filter::from_config(&config).run(&config.isolates);
            println!("{}", render(&mut Table::new(SummaryRow::from_report(&report))));
            Ok(conclude(&report))
        }
        Command::Effectorp => {
            let report = tool::effectorp::Runner::from_config(&config).run(&config.isolates);
            print_statuses(&report);
            Ok(conclude(&report))
        }
        Command::Effectors { output } => {
            let dir = &config.effectorp.results_dir;
            let summary = effector::Summary::from_dir(dir, &config.isolates)
                .context("reading EffectorP results")?;
            println!("{}", render(&mut Table::new(ReportRow::from_summary(&summary))));

            let path = output
                .clone()
                .unwrap_or_else(|| dir.join(effector::MASTER_LIST_FILE_NAME));
            let count = summary
                .write_master_list(&path)
                .context("writing the master effector list")?;

            println!("Total unique effector IDs across all isolates: {count}");
            println!("Master list: {}", path.display());
            Ok(true)
        }
        Command::Matrix { output } => {
            let dir = &config.effectorp.results_dir;
            let summary = effector::Summary::from_dir(dir, &config.isolates)
                .context("reading EffectorP results")?;

            let matrix = Matrix::from_isolates(
                matrix::EFFECTOR_LABEL,
                config.isolates.clone(),
                summary.memberships(),
            );

            let path = output
                .clone()
                .unwrap_or_else(|| dir.join(matrix::EFFECTOR_MATRIX_FILE_NAME));
            matrix
                .write_path(&path)
                .with_context(|| format!("writing matrix `{}`", path.display()))?;

            info!("wrote {} effector(s) to `{}`", matrix.rows().len(), path.display());
            println!("{}", render(&mut Table::new([matrix.summary()])));
            Ok(true)
        }
        Command::Clusters { clusters, output } => {
            let parsed = Clusters::from_path(clusters)
                .with_context(|| format!("reading clusters `{}`", clusters.display()))?;

            if parsed.skipped() > 0 {
                warn!("skipped {} malformed line(s)", parsed.skipped());
            }

            let memberships = parsed.memberships();
            let matrix = Matrix::from_isolates(
                matrix::CLUSTER_LABEL,
                config.isolates.clone(),
                memberships.iter(),
            );

            matrix
                .write_path(output)
                .with_context(|| format!("writing matrix `{}`", output.display()))?;

            info!(
                "wrote {} cluster(s) to `{}`",
                matrix.rows().len(),
                output.display()
            );
            println!("{}", render(&mut Table::new([matrix.summary()])));
            Ok(true)
        }
        Command::PfamScript => {
            let script = Script::from_config(&config.pfam).with_context(|| {
                format!(
                    "discovering candidates in `{}`",
                    config.pfam.candidates_dir.display()
                )
            })?;

            let path = script.write().context("writing the Pfam search script")?;
            println!(
                "Bash script with {} search(es) written: {}",
                script.searches().len(),
                path.display()
            );
            Ok(true)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    if !run(&args)? {
        std::process::exit(1);
    }

    Ok(())
}
