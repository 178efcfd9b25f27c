//! `exomerge query`: filter a merged output file.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use exomerge_recon::ingest::load_merged_rows;
use exomerge_recon::query::export_view;
use exomerge_recon::{filter, DispositionFilter, Query};

use crate::{read_input, write_output, CliError};

#[derive(Args)]
pub struct QueryArgs {
    /// Merged CSV written by `exomerge run`
    pub merged: PathBuf,

    /// Case-insensitive substring of object_name
    #[arg(long, default_value = "")]
    pub text: String,

    /// Drop rows whose predicted probability is below this value
    #[arg(long, default_value_t = 0.0)]
    pub min_confidence: f64,

    /// all, confirmed, false_positive or candidate
    #[arg(long, default_value = "all")]
    pub disposition: String,

    /// Output file (omit for stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

fn build_query(args: &QueryArgs) -> Result<Query, CliError> {
    if !(0.0..=1.0).contains(&args.min_confidence) {
        return Err(CliError::args(format!(
            "--min-confidence must be within [0, 1], got {}",
            args.min_confidence
        )));
    }
    let disposition = DispositionFilter::parse(&args.disposition).ok_or_else(|| {
        CliError::args(format!("unknown disposition {:?}", args.disposition))
            .with_hint("use all, confirmed, false_positive or candidate")
    })?;

    Ok(Query::default()
        .with_text(args.text.clone())
        .with_min_confidence(args.min_confidence)
        .with_disposition(disposition))
}

pub fn cmd_query(args: QueryArgs) -> Result<(), CliError> {
    let query = build_query(&args)?;
    let records = load_merged_rows(&read_input(&args.merged)?)?;
    let view = filter(&records, &query);
    info!(matched = view.len(), total = records.len(), "query complete");

    let csv = export_view(&view)?;
    match args.output {
        Some(ref path) => write_output(path, &csv)?,
        None => print!("{csv}"),
    }
    Ok(())
}
