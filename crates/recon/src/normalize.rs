//! Object-name normalization.
//!
//! The three surveys name the same kind of object differently
//! (`K00711.03`, `KOI-711.03`, `TOI 119.01`, `EPIC 201367065`, or a bare
//! number). [`normalize`] reduces every form to a [`CanonicalKey`] so rows
//! can be joined by key equality.

use std::fmt;

use serde::Serialize;

use crate::error::ReconError;
use crate::model::Mission;

/// Mission-agnostic join key.
///
/// `numeric_id` keeps the integer part without leading zeros and the decimal
/// suffix verbatim (`711.03`, `119.01`, `201367065`). `family` is set only
/// when the raw name carried a mission prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CanonicalKey {
    family: Option<Mission>,
    numeric_id: String,
}

impl CanonicalKey {
    pub fn family(&self) -> Option<Mission> {
        self.family
    }

    pub fn numeric_id(&self) -> &str {
        &self.numeric_id
    }

    /// Same numeric id, tagged with `mission`.
    pub fn with_family(self, mission: Mission) -> Self {
        Self { family: Some(mission), ..self }
    }
}

/// Renders a name that normalizes back to the same key.
impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.family {
            Some(Mission::Kepler) => write!(f, "KOI-{}", self.numeric_id),
            Some(Mission::Tess) => write!(f, "TOI {}", self.numeric_id),
            Some(Mission::K2) => write!(f, "EPIC {}", self.numeric_id),
            Some(Mission::Archive) | None => write!(f, "{}", self.numeric_id),
        }
    }
}

// Longest prefix first: `KOI` must win over the bare Kepler `K`.
const PREFIXES: &[(&str, Mission)] = &[
    ("KOI-", Mission::Kepler),
    ("KOI", Mission::Kepler),
    ("TOI-", Mission::Tess),
    ("TOI", Mission::Tess),
    ("EPIC-", Mission::K2),
    ("EPIC", Mission::K2),
    ("K", Mission::Kepler),
];

/// Normalize a raw object name into its canonical key.
///
/// Whitespace and case are ignored. Fails with
/// [`ReconError::MalformedIdentifier`] when nothing numeric remains after the
/// prefix is stripped.
pub fn normalize(raw: &str) -> Result<CanonicalKey, ReconError> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    let (family, residual) = PREFIXES
        .iter()
        .find_map(|(prefix, mission)| {
            compact.strip_prefix(prefix).map(|rest| (Some(*mission), rest))
        })
        .unwrap_or((None, compact.as_str()));

    let numeric_id =
        canonical_number(residual).ok_or_else(|| ReconError::MalformedIdentifier(raw.to_string()))?;

    Ok(CanonicalKey { family, numeric_id })
}

/// `normalize(raw)` rendered back to text.
pub fn normalize_to_string(raw: &str) -> Result<String, ReconError> {
    normalize(raw).map(|key| key.to_string())
}

/// `00711.03` → `711.03`; `0` stays `0`; the suffix is never touched.
fn canonical_number(s: &str) -> Option<String> {
    let (int_part, suffix) = match s.split_once('.') {
        Some((int_part, suffix)) => (int_part, Some(suffix)),
        None => (s, None),
    };

    if !is_digits(int_part) {
        return None;
    }
    let trimmed = match int_part.trim_start_matches('0') {
        "" => "0",
        t => t,
    };

    match suffix {
        Some(suffix) if is_digits(suffix) => Some(format!("{trimmed}.{suffix}")),
        Some(_) => None,
        None => Some(trimmed.to_string()),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
