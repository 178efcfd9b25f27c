use thiserror::Error;

use crate::model::Mission;

/// Errors produced by the reconciliation engine.
///
/// Row-level variants (`MalformedIdentifier`, `AmbiguousMatch`,
/// `InvalidProbability`, `InvalidRow`) are normally collected into
/// [`RowIssue`](crate::model::RowIssue)s instead of aborting a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error.
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Classification threshold outside [0, 1] (or not a number).
    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// No numeric residual could be extracted from an object name.
    #[error("malformed identifier '{0}'")]
    MalformedIdentifier(String),

    /// A bare numeric id is shared by several missions.
    #[error("ambiguous match for '{object_name}': shared by {}", join_missions(.missions))]
    AmbiguousMatch { object_name: String, missions: Vec<Mission> },

    /// Probability missing, unparseable, or outside [0, 1].
    #[error("invalid probability '{value}' for '{object_name}'")]
    InvalidProbability { object_name: String, value: String },

    /// Required column absent from an input table.
    #[error("{table}: missing column '{column}'")]
    MissingColumn { table: String, column: String },

    /// Column not in the allow-list while strict column checking is on.
    #[error("{table}: unknown column '{column}'")]
    UnknownColumn { table: String, column: String },

    /// A catalog row whose fields cannot be interpreted.
    #[error("{table}, row {row}: {message}")]
    InvalidRow { table: String, row: usize, message: String },

    /// CSV reader / writer failure.
    #[error("CSV error: {0}")]
    Csv(String),

    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

fn join_missions(missions: &[Mission]) -> String {
    missions.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", ")
}
