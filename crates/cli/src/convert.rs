//! `exomerge convert`: raw archive table to standard catalog CSV.

use std::path::Path;

use tracing::{info, warn};

use exomerge_recon::ingest::{catalog_to_csv_string, convert_archive_rows};
use exomerge_recon::model::Mission;

use crate::{read_input, write_output, CliError};

pub fn cmd_convert(input: &Path, mission: Mission, output: &Path) -> Result<(), CliError> {
    let batch = convert_archive_rows(&read_input(input)?, mission)?;
    if !batch.issues.is_empty() {
        warn!(skipped = batch.issues.len(), "some archive rows could not be converted");
    }

    write_output(output, &catalog_to_csv_string(&batch.records)?)?;
    info!(
        path = %output.display(),
        mission = %mission,
        records = batch.records.len(),
        "wrote standard catalog"
    );
    Ok(())
}
