//! Search and filtering over a merged record set.

use crate::error::ReconError;
use crate::export;
use crate::model::{Disposition, MergedRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispositionFilter {
    #[default]
    All,
    Only(Disposition),
}

impl DispositionFilter {
    /// `all` or any text [`Disposition::parse`] accepts.
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        Disposition::parse(s).map(Self::Only)
    }

    fn accepts(&self, disposition: Option<Disposition>) -> bool {
        match self {
            Self::All => true,
            Self::Only(d) => disposition == Some(*d),
        }
    }
}

/// Immutable filter state. The default query matches every record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub text: String,
    pub min_confidence: f64,
    pub disposition: DispositionFilter,
}

impl Query {
    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self { text: text.into(), ..self }
    }

    pub fn with_min_confidence(self, min_confidence: f64) -> Self {
        Self { min_confidence, ..self }
    }

    pub fn with_disposition(self, disposition: DispositionFilter) -> Self {
        Self { disposition, ..self }
    }

    pub fn matches(&self, record: &MergedRecord) -> bool {
        self.matcher().matches(record)
    }

    fn matcher(&self) -> Matcher<'_> {
        Matcher { needle: self.text.to_lowercase(), query: self }
    }
}

struct Matcher<'q> {
    needle: String,
    query: &'q Query,
}

impl Matcher<'_> {
    fn matches(&self, record: &MergedRecord) -> bool {
        let text_ok =
            self.needle.is_empty() || record.object_name.to_lowercase().contains(&self.needle);
        // Rows without a probability are never excluded by confidence.
        let confidence_ok = record
            .predicted_probability
            .map_or(true, |p| p >= self.query.min_confidence);
        text_ok && confidence_ok && self.query.disposition.accepts(record.disposition())
    }
}

/// Records matching `query`, in their original order. Borrows; never copies
/// or mutates the underlying set.
pub fn filter<'a>(records: &'a [MergedRecord], query: &Query) -> Vec<&'a MergedRecord> {
    let matcher = query.matcher();
    records.iter().filter(|r| matcher.matches(r)).collect()
}

/// Render a filtered view as CSV in merged-output column order.
pub fn export_view(view: &[&MergedRecord]) -> Result<String, ReconError> {
    export::to_csv_string(view.iter().copied())
}
