//! `exomerge run`: join and classify, then write the merged CSV and statistics.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{info, warn};

use exomerge_recon::aggregate::percent;
use exomerge_recon::ingest::{load_catalog_rows, load_prediction_rows, CatalogBatch, IngestOptions};
use exomerge_recon::model::{Disposition, ReconInput, ReconResult};
use exomerge_recon::{export, ReconConfig};

use crate::exit_codes::{EXIT_AMBIGUOUS, EXIT_IO};
use crate::{read_input, write_output, CliError};

pub const DEFAULT_CANDIDATES: &str = "data/all_candidates_standard.csv";
pub const DEFAULT_FALSE_POSITIVES: &str = "data/all_false_positives_standard.csv";
pub const DEFAULT_OUTPUT: &str = "data/final_output.csv";

#[derive(Args)]
pub struct RunArgs {
    /// Classifier output with object_name and predicted_probability columns
    pub predictions: Option<PathBuf>,

    /// Standard-format catalog of candidate and confirmed objects
    #[arg(long, short = 'c')]
    pub candidates: Option<PathBuf>,

    /// Standard-format catalog of false positives
    #[arg(long = "false-positives", short = 'f')]
    pub false_positives: Option<PathBuf>,

    /// Merged CSV output path
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Probability at or above which a prediction is labelled CONFIRMED
    #[arg(long, short = 't')]
    pub threshold: Option<f64>,

    /// TOML run config; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the full result document as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Exit 6 when any prediction matched several missions
    #[arg(long)]
    pub fail_on_ambiguous: bool,

    /// Append catalog records that no prediction matched
    #[arg(long)]
    pub include_unpredicted: bool,

    /// Reject input files with unexpected columns
    #[arg(long)]
    pub strict_columns: bool,
}

/// Every path a run touches, after flag / config / default resolution.
#[derive(Debug, PartialEq)]
struct RunPaths {
    predictions: PathBuf,
    candidates: PathBuf,
    false_positives: PathBuf,
    output: PathBuf,
    json: Option<PathBuf>,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let (config, base_dir) = match &args.config {
        Some(path) => {
            let config = ReconConfig::from_toml(&read_input(path)?)?;
            (config, path.parent().map(Path::to_path_buf))
        }
        None => (ReconConfig::default(), None),
    };
    let config = apply_overrides(config, &args);
    // Reject a bad threshold before touching any input.
    config.validate()?;

    let paths = resolve_paths(&args, &config, base_dir.as_deref())?;
    let opts = config.ingest_options();

    let predictions = load_prediction_rows(&read_input(&paths.predictions)?, &opts)?;
    let candidates = load_catalog_file(&paths.candidates, "candidates", &opts)?;
    let false_positives = load_catalog_file(&paths.false_positives, "false_positives", &opts)?;

    let mut issues = predictions.issues;
    issues.extend(candidates.issues);
    issues.extend(false_positives.issues);
    let input = ReconInput {
        predictions: predictions.records,
        candidates: candidates.records,
        false_positives: false_positives.records,
        issues,
    };

    let result = exomerge_recon::run(&config, &input)?;

    write_output(&paths.output, &export::to_csv_string(&result.records)?)?;
    info!(path = %paths.output.display(), rows = result.records.len(), "wrote merged output");

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::new(EXIT_IO, format!("JSON serialization error: {e}")))?;
    if let Some(ref path) = paths.json {
        write_output(path, &json_str)?;
        info!(path = %path.display(), "wrote result document");
    }
    if args.json {
        println!("{json_str}");
    }

    eprint!("{}", format_statistics(&result));

    if config.fail_on_ambiguous && result.quality.ambiguous_matches > 0 {
        return Err(CliError::new(
            EXIT_AMBIGUOUS,
            format!(
                "{} ambiguous matches found (fail_on_ambiguous)",
                result.quality.ambiguous_matches
            ),
        )
        .with_hint("prefix bare ids with KOI-, TOI or EPIC to pick a mission"));
    }
    Ok(())
}

fn apply_overrides(mut config: ReconConfig, args: &RunArgs) -> ReconConfig {
    if let Some(t) = args.threshold {
        config.classify.threshold = t;
    }
    config.fail_on_ambiguous |= args.fail_on_ambiguous;
    config.join.include_unpredicted |= args.include_unpredicted;
    config.ingest.strict_columns |= args.strict_columns;
    config
}

/// Flags win, then config entries (relative to the config file), then defaults.
fn resolve_paths(
    args: &RunArgs,
    config: &ReconConfig,
    base_dir: Option<&Path>,
) -> Result<RunPaths, CliError> {
    let from_config = |entry: &Option<String>| {
        entry.as_ref().map(|p| match base_dir {
            Some(dir) => dir.join(p),
            None => PathBuf::from(p),
        })
    };
    let pick = |flag: &Option<PathBuf>, entry: &Option<String>, default: &str| {
        flag.clone()
            .or_else(|| from_config(entry))
            .unwrap_or_else(|| PathBuf::from(default))
    };

    let predictions = args
        .predictions
        .clone()
        .or_else(|| from_config(&config.inputs.predictions))
        .ok_or_else(|| {
            CliError::args("no predictions file given")
                .with_hint("pass it as the first argument or set inputs.predictions in --config")
        })?;

    Ok(RunPaths {
        predictions,
        candidates: pick(&args.candidates, &config.inputs.candidates, DEFAULT_CANDIDATES),
        false_positives: pick(
            &args.false_positives,
            &config.inputs.false_positives,
            DEFAULT_FALSE_POSITIVES,
        ),
        output: pick(&args.output, &config.output.csv, DEFAULT_OUTPUT),
        json: from_config(&config.output.json),
    })
}

/// A missing catalog file is not fatal: the run proceeds as if it were empty.
fn load_catalog_file(
    path: &Path,
    table: &str,
    opts: &IngestOptions,
) -> Result<CatalogBatch, CliError> {
    if !path.exists() {
        warn!(path = %path.display(), "{table} file not found, treating as empty");
        return Ok(CatalogBatch::default());
    }
    let batch = load_catalog_rows(&read_input(path)?, table, opts)?;
    info!(path = %path.display(), records = batch.records.len(), "loaded {table}");
    Ok(batch)
}

// ---------------------------------------------------------------------------
// Human summary (stderr)
// ---------------------------------------------------------------------------

fn format_statistics(result: &ReconResult) -> String {
    let s = &result.summary;
    let q = &result.quality;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} records: {} matched ({:.1}%), {} unmatched ({:.1}%), {} with predictions",
        s.total,
        s.matched,
        percent(s.matched, s.total),
        s.unmatched,
        percent(s.unmatched, s.total),
        s.predicted,
    );

    let _ = writeln!(out, "dispositions (threshold {}):", result.meta.threshold);
    for d in Disposition::ALL {
        let n = s.disposition_counts.get(&d).copied().unwrap_or(0);
        let _ = writeln!(out, "  {:<16}{:>6}  ({:.1}%)", d.to_string(), n, percent(n, s.total));
    }

    let _ = writeln!(out, "missions:");
    for (mission, n) in &s.mission_counts {
        let share = percent(*n, s.total);
        let _ = writeln!(out, "  {:<16}{:>6}  ({:.1}%)", mission.to_string(), n, share);
    }

    if s.accuracy_sample > 0 {
        let _ = writeln!(
            out,
            "agreement with catalog: {:.1}% over {} records",
            s.accuracy_pct, s.accuracy_sample
        );
    } else {
        let _ = writeln!(
            out,
            "agreement with catalog: 0.0% (no records with both a prediction and a catalog label)"
        );
    }

    let _ = writeln!(out, "completeness:");
    for c in &s.completeness {
        let _ = writeln!(
            out,
            "  {:<16}{:>6}/{}  ({:.1}%)",
            c.field.column(),
            c.present,
            c.total,
            percent(c.present, c.total),
        );
    }

    if !q.is_clean() {
        let _ = writeln!(
            out,
            "data quality: {} malformed names, {} ambiguous, {} invalid probabilities, \
             {} catalog rows skipped, {} duplicate catalog keys",
            q.malformed_identifiers,
            q.ambiguous_matches,
            q.invalid_probabilities,
            q.invalid_catalog_rows,
            q.catalog_duplicates,
        );
    }
    out
}
