use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Survey that published a catalog record.
///
/// `Archive` never appears in a loaded catalog; it labels placeholder rows
/// synthesized for predictions that matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Mission {
    #[serde(rename = "Kepler")]
    Kepler,
    #[serde(rename = "TESS")]
    Tess,
    #[serde(rename = "K2")]
    K2,
    #[serde(rename = "ARCHIVE")]
    Archive,
}

impl Mission {
    /// Case-insensitive parse of the `mission` column.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KEPLER" => Some(Self::Kepler),
            "TESS" => Some(Self::Tess),
            "K2" => Some(Self::K2),
            "ARCHIVE" => Some(Self::Archive),
            _ => None,
        }
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kepler => write!(f, "Kepler"),
            Self::Tess => write!(f, "TESS"),
            Self::K2 => write!(f, "K2"),
            Self::Archive => write!(f, "ARCHIVE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Candidate,
    FalsePositive,
    Confirmed,
}

impl Disposition {
    pub const ALL: [Disposition; 3] = [Self::Confirmed, Self::FalsePositive, Self::Candidate];

    /// Parse archive disposition text, including the TFOPWG short codes.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase().replace(['_', '-'], " ");
        match upper.as_str() {
            "CANDIDATE" | "PC" | "APC" => Some(Self::Candidate),
            "CONFIRMED" | "CP" | "KP" => Some(Self::Confirmed),
            "FALSE POSITIVE" | "FP" | "FA" => Some(Self::FalsePositive),
            _ => None,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Candidate => write!(f, "CANDIDATE"),
            Self::FalsePositive => write!(f, "FALSE POSITIVE"),
            Self::Confirmed => write!(f, "CONFIRMED"),
        }
    }
}

/// Numeric catalog columns, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Period,
    PlanetRadius,
    StarTemp,
    StarRadius,
    StarMass,
}

impl NumericField {
    pub const ALL: [NumericField; 5] = [
        Self::Period,
        Self::PlanetRadius,
        Self::StarTemp,
        Self::StarRadius,
        Self::StarMass,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Period => "period",
            Self::PlanetRadius => "planet_radius",
            Self::StarTemp => "star_temp",
            Self::StarRadius => "star_radius",
            Self::StarMass => "star_mass",
        }
    }
}

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// One row of the canonical catalog. Numeric fields are `None` when the
/// archive left them blank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRecord {
    pub mission: Mission,
    pub object_name: String,
    pub disposition: Disposition,
    pub period: Option<f64>,
    pub planet_radius: Option<f64>,
    pub star_temp: Option<f64>,
    pub star_radius: Option<f64>,
    pub star_mass: Option<f64>,
    pub discovery_facility: String,
}

/// A model prediction for one object. Construction validates the name and
/// probability, so a `PredictionRecord` is always joinable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    object_name: String,
    predicted_probability: f64,
    /// 1-based data row in the source file, when loaded from one.
    #[serde(skip_serializing_if = "Option::is_none")]
    row: Option<usize>,
}

impl PredictionRecord {
    pub fn new(
        object_name: impl Into<String>,
        predicted_probability: f64,
    ) -> Result<Self, ReconError> {
        let object_name = object_name.into();
        if object_name.trim().is_empty() {
            return Err(ReconError::MalformedIdentifier(object_name));
        }
        if !(0.0..=1.0).contains(&predicted_probability) {
            return Err(ReconError::InvalidProbability {
                object_name,
                value: predicted_probability.to_string(),
            });
        }
        Ok(Self { object_name, predicted_probability, row: None })
    }

    /// Tag the record with its data row in the source file.
    pub fn at_row(self, row: usize) -> Self {
        Self { row: Some(row), ..self }
    }

    pub fn row(&self) -> Option<usize> {
        self.row
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn predicted_probability(&self) -> f64 {
        self.predicted_probability
    }
}

// ---------------------------------------------------------------------------
// Merged output
// ---------------------------------------------------------------------------

/// A prediction joined with its catalog record, or a placeholder when the
/// join found nothing.
///
/// Unmatched rows carry `mission = ARCHIVE`, `object_name = PLANET_<n>`,
/// `discovery_facility = UNKNOWN` and no catalog numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub mission: Mission,
    pub object_name: String,
    /// Name as it appeared in the prediction file (catalog name for passthrough rows).
    pub source_name: String,
    /// Ground-truth label from the catalog; `None` for placeholders.
    pub catalog_disposition: Option<Disposition>,
    pub period: Option<f64>,
    pub planet_radius: Option<f64>,
    pub star_temp: Option<f64>,
    pub star_radius: Option<f64>,
    pub star_mass: Option<f64>,
    pub discovery_facility: String,
    pub predicted_probability: Option<f64>,
    pub predicted_label: Option<Disposition>,
    pub matched: bool,
    /// Set when the name matched several missions and was not guessed.
    pub needs_review: bool,
}

impl MergedRecord {
    /// Effective disposition: the predicted label when there is one,
    /// the catalog label otherwise.
    pub fn disposition(&self) -> Option<Disposition> {
        self.predicted_label.or(self.catalog_disposition)
    }

    pub fn numeric(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::Period => self.period,
            NumericField::PlanetRadius => self.planet_radius,
            NumericField::StarTemp => self.star_temp,
            NumericField::StarRadius => self.star_radius,
            NumericField::StarMass => self.star_mass,
        }
    }
}

// ---------------------------------------------------------------------------
// Row issues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MalformedIdentifier,
    AmbiguousMatch,
    InvalidProbability,
    InvalidRow,
}

/// A row that was skipped, rejected or flagged. `row` is 1-based within
/// the table it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub table: String,
    pub row: usize,
    pub object_name: String,
    pub kind: IssueKind,
    pub message: String,
}

impl RowIssue {
    pub fn new(table: &str, row: usize, object_name: &str, error: &ReconError) -> Self {
        let kind = match error {
            ReconError::MalformedIdentifier(_) => IssueKind::MalformedIdentifier,
            ReconError::AmbiguousMatch { .. } => IssueKind::AmbiguousMatch,
            ReconError::InvalidProbability { .. } => IssueKind::InvalidProbability,
            _ => IssueKind::InvalidRow,
        };
        Self {
            table: table.to_string(),
            row,
            object_name: object_name.to_string(),
            kind,
            message: error.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine input
// ---------------------------------------------------------------------------

/// Pre-loaded rows for one run. `issues` carries problems already found
/// while ingesting, so they are reported with the run's statistics.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub predictions: Vec<PredictionRecord>,
    pub candidates: Vec<CatalogRecord>,
    pub false_positives: Vec<CatalogRecord>,
    pub issues: Vec<RowIssue>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCompleteness {
    pub field: NumericField,
    pub present: usize,
    pub total: usize,
    /// Share of records with a value, in [0, 1].
    pub fraction: f64,
}

/// Computed from a merged record set on demand; never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub predicted: usize,
    pub disposition_counts: BTreeMap<Disposition, usize>,
    pub mission_counts: BTreeMap<Mission, usize>,
    /// Records that carry both a prediction and a catalog label.
    pub accuracy_sample: usize,
    /// Percentage, one decimal place. Zero when `accuracy_sample` is zero.
    pub accuracy_pct: f64,
    pub completeness: Vec<FieldCompleteness>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQuality {
    pub malformed_identifiers: usize,
    pub ambiguous_matches: usize,
    pub invalid_probabilities: usize,
    pub invalid_catalog_rows: usize,
    pub catalog_duplicates: usize,
}

impl DataQuality {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub threshold: f64,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: Statistics,
    pub quality: DataQuality,
    pub issues: Vec<RowIssue>,
    pub records: Vec<MergedRecord>,
}
