//! `exomerge combine`: concatenate standard catalog files into one.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use exomerge_recon::aggregate::{count_catalog, percent, CatalogCounts};
use exomerge_recon::ingest::{catalog_to_csv_string, load_catalog_rows, IngestOptions};

use crate::exit_codes::EXIT_IO;
use crate::{read_input, write_output, CliError};

/// Missing inputs are skipped with a warning; it is an error only when none
/// of them exist.
pub fn cmd_combine(inputs: &[PathBuf], output: &Path) -> Result<(), CliError> {
    let mut records = Vec::new();
    let mut loaded = 0;

    for path in inputs {
        if !path.exists() {
            warn!(path = %path.display(), "catalog file not found, skipping");
            continue;
        }
        let table = path.display().to_string();
        let batch = load_catalog_rows(&read_input(path)?, &table, &IngestOptions::default())?;
        if !batch.issues.is_empty() {
            let skipped = batch.issues.len();
            warn!(path = %path.display(), skipped, "some rows could not be read");
        }
        info!(path = %path.display(), records = batch.records.len(), "loaded catalog");
        records.extend(batch.records);
        loaded += 1;
    }

    if loaded == 0 {
        return Err(CliError::new(EXIT_IO, "no data to combine: none of the input files exist")
            .with_hint("create standard catalogs first with `exomerge convert`"));
    }

    write_output(output, &catalog_to_csv_string(&records)?)?;
    info!(path = %output.display(), records = records.len(), "wrote combined catalog");

    eprint!("{}", format_counts(&count_catalog(&records), loaded));
    Ok(())
}

fn format_counts(counts: &CatalogCounts, files: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} records from {} files", counts.total, files);

    let _ = writeln!(out, "missions:");
    for (mission, n) in &counts.missions {
        let share = percent(*n, counts.total);
        let _ = writeln!(out, "  {:<16}{:>6}  ({:.1}%)", mission.to_string(), n, share);
    }

    let _ = writeln!(out, "dispositions:");
    for (disposition, n) in &counts.dispositions {
        let share = percent(*n, counts.total);
        let _ = writeln!(out, "  {:<16}{:>6}  ({:.1}%)", disposition.to_string(), n, share);
    }
    out
}
