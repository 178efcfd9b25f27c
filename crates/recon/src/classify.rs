use crate::error::ReconError;
use crate::model::{Disposition, MergedRecord};

/// Probability cutoff for a CONFIRMED label. Always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: Threshold = Threshold(0.5);

    /// Out-of-range and NaN values are rejected, never clamped.
    pub fn new(value: f64) -> Result<Self, ReconError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ReconError::InvalidThreshold(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// `probability >= threshold` is CONFIRMED; the boundary is inclusive.
pub fn label(probability: f64, threshold: Threshold) -> Disposition {
    if probability >= threshold.0 {
        Disposition::Confirmed
    } else {
        Disposition::FalsePositive
    }
}

/// Disposition of a merged record under `threshold`.
///
/// Records without a prediction keep the catalog's label; `None` only when
/// a record has neither.
pub fn classify(record: &MergedRecord, threshold: Threshold) -> Option<Disposition> {
    match record.predicted_probability {
        Some(p) => Some(label(p, threshold)),
        None => record.catalog_disposition,
    }
}

/// Attach predicted labels to freshly joined records.
pub fn apply(records: Vec<MergedRecord>, threshold: Threshold) -> Vec<MergedRecord> {
    records
        .into_iter()
        .map(|record| MergedRecord {
            predicted_label: record.predicted_probability.map(|p| label(p, threshold)),
            ..record
        })
        .collect()
}
