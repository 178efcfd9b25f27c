// exomerge CLI - merge classifier predictions with mission catalogs

mod combine;
mod convert;
mod exit_codes;
mod query;
mod run;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use exomerge_recon::model::Mission;
use exomerge_recon::ReconError;

use exit_codes::{recon_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "exomerge")]
#[command(about = "Merge exoplanet classifier predictions with Kepler, TESS and K2 catalogs")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log per-row join decisions
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join predictions to the catalogs, classify, write the merged CSV
    #[command(after_help = "\
Missing candidate or false-positive files are treated as empty.

Examples:
  exomerge run predictions.csv
  exomerge run predictions.csv -t 0.7 -o data/final_output.csv
  exomerge run predictions.csv --json > result.json
  exomerge run --config final-output.recon.toml
  exomerge run predictions.csv --fail-on-ambiguous")]
    Run(run::RunArgs),

    /// Filter a merged CSV by name, confidence and disposition
    #[command(after_help = "\
Examples:
  exomerge query data/final_output.csv --text k007
  exomerge query data/final_output.csv --min-confidence 0.9 --disposition confirmed
  exomerge query data/final_output.csv --disposition false_positive -o fp.csv")]
    Query(query::QueryArgs),

    /// Print the canonical join key for each object name
    #[command(after_help = "\
Examples:
  exomerge normalize K00711.03 'KOI-711.03' 'TOI 119.01' 'EPIC 201367065'")]
    Normalize {
        /// Object names as they appear in a predictions file
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Convert a raw mission archive table to the standard catalog format
    #[command(after_help = "\
Examples:
  exomerge convert cumulative.csv --mission kepler -o data/kepler_standard.csv
  exomerge convert TOI.csv --mission tess -o data/tess_standard.csv")]
    Convert {
        /// Raw archive CSV export
        input: PathBuf,

        /// Which archive table the file came from
        #[arg(long, short = 'm')]
        mission: MissionArg,

        /// Output file
        #[arg(long, short = 'o')]
        output: PathBuf,
    },

    /// Concatenate standard catalog files and report mission and disposition counts
    #[command(after_help = "\
Missing input files are skipped with a warning.

Examples:
  exomerge combine data/kepler_standard.csv data/tess_standard.csv data/k2_standard.csv \\
      -o data/all_candidates_standard.csv")]
    Combine {
        /// Standard-format catalog files, concatenated in the order given
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MissionArg {
    Kepler,
    Tess,
    K2,
}

impl From<MissionArg> for Mission {
    fn from(m: MissionArg) -> Self {
        match m {
            MissionArg::Kepler => Mission::Kepler,
            MissionArg::Tess => Mission::Tess,
            MissionArg::K2 => Mission::K2,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  exomerge-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Logs go to stderr so stdout stays clean for `--json` and `query`.
fn init_tracing(quiet: bool, verbose: bool) {
    let default = if quiet {
        "exomerge=warn,exomerge_recon=warn"
    } else if verbose {
        "exomerge=debug,exomerge_recon=debug"
    } else {
        "exomerge=info,exomerge_recon=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args),
        Commands::Query(args) => query::cmd_query(args),
        Commands::Normalize { names } => cmd_normalize(&names),
        Commands::Convert { input, mission, output } => {
            convert::cmd_convert(&input, mission.into(), &output)
        }
        Commands::Combine { inputs, output } => combine::cmd_combine(&inputs, &output),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn cmd_normalize(names: &[String]) -> Result<(), CliError> {
    let mut malformed = 0;
    for name in names {
        match exomerge_recon::normalize(name) {
            Ok(key) => println!("{name}\t{key}"),
            Err(e) => {
                malformed += 1;
                println!("{name}\terror: {e}");
            }
        }
    }
    if malformed > 0 {
        return Err(CliError {
            code: EXIT_ERROR,
            message: format!("{malformed} of {} names are malformed", names.len()),
            hint: Some("names need a numeric part, e.g. K00711.03, TOI 119.01, 201367065".into()),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(e: ReconError) -> Self {
        let code = recon_exit_code(&e);
        let hint = match &e {
            ReconError::InvalidThreshold(_) => Some("pass a threshold between 0 and 1, e.g. -t 0.5"),
            ReconError::MissingColumn { table, .. } if table == "predictions" => {
                Some("predictions need object_name and predicted_probability columns")
            }
            ReconError::MissingColumn { .. } => {
                Some("catalog files need the standard columns; see `exomerge convert`")
            }
            ReconError::UnknownColumn { .. } => {
                Some("drop --strict-columns (or ingest.strict_columns) to ignore extra columns")
            }
            _ => None,
        };
        Self { code, message: e.to_string(), hint: hint.map(Into::into) }
    }
}

// ---------------------------------------------------------------------------
// File helpers shared by commands
// ---------------------------------------------------------------------------

pub(crate) fn read_input(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::new(EXIT_IO, format!("cannot read {}: {e}", path.display())))
}

/// Write `contents`, creating parent directories as needed.
pub(crate) fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            CliError::new(EXIT_IO, format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    std::fs::write(path, contents)
        .map_err(|e| CliError::new(EXIT_IO, format!("cannot write {}: {e}", path.display())))
}
