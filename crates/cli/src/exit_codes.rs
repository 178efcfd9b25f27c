//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts chaining `exomerge run` into notebooks and cron jobs rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | CLI usage error (bad args, unknown mission, bad filter)   |
//! | 3    | Invalid config or threshold                               |
//! | 4    | I/O error (unreadable input, unwritable output)           |
//! | 5    | Parse error (missing columns, malformed CSV)              |
//! | 6    | Ambiguous matches found with `fail_on_ambiguous`          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map it in [`recon_exit_code`] if a library error produces it

use exomerge_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate, or the threshold is outside [0, 1].
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Input file unreadable or output file unwritable.
pub const EXIT_IO: u8 = 4;

/// Input CSV is structurally broken (missing columns, bad quoting).
pub const EXIT_PARSE: u8 = 5;

/// At least one prediction matched several missions and the run was told to
/// treat that as failure. Output files are still written.
pub const EXIT_AMBIGUOUS: u8 = 6;

/// Map a library error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::InvalidThreshold(_) => EXIT_INVALID_CONFIG,
        ReconError::Io(_) => EXIT_IO,
        ReconError::Csv(_)
        | ReconError::MissingColumn { .. }
        | ReconError::UnknownColumn { .. }
        | ReconError::InvalidRow { .. } => EXIT_PARSE,
        ReconError::AmbiguousMatch { .. } => EXIT_AMBIGUOUS,
        ReconError::MalformedIdentifier(_) | ReconError::InvalidProbability { .. } => EXIT_ERROR,
    }
}
