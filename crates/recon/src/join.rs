use tracing::{debug, warn};

use crate::catalog::{Catalog, Lookup};
use crate::error::ReconError;
use crate::model::{CatalogRecord, MergedRecord, Mission, PredictionRecord, RowIssue};
use crate::normalize::normalize;

pub const PLACEHOLDER_FACILITY: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, Default)]
pub struct JoinOptions {
    /// Append catalog records no prediction matched, after the prediction rows.
    pub include_unpredicted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct JoinOutput {
    pub records: Vec<MergedRecord>,
    pub issues: Vec<RowIssue>,
    pub malformed: usize,
    pub ambiguous: usize,
}

/// Join predictions against the catalog with default options.
pub fn join(predictions: &[PredictionRecord], catalog: &Catalog) -> JoinOutput {
    join_with(predictions, catalog, JoinOptions::default())
}

/// Match every prediction to a catalog record by canonical key.
///
/// Output order follows input order. A prediction that matches nothing, or
/// matches several missions, becomes a placeholder named `PLANET_<n>` where
/// `n` is its source row ([`PredictionRecord::row`]), or its 1-based
/// position in `predictions` for records built in memory. Malformed names
/// are dropped and reported in `issues` under the same row number.
pub fn join_with(
    predictions: &[PredictionRecord],
    catalog: &Catalog,
    options: JoinOptions,
) -> JoinOutput {
    let mut out = JoinOutput::default();
    let mut used = vec![false; catalog.len()];

    for (i, prediction) in predictions.iter().enumerate() {
        let position = prediction.row().unwrap_or(i + 1);
        let name = prediction.object_name();

        let key = match normalize(name) {
            Ok(key) => key,
            Err(e) => {
                warn!(row = position, name, "dropping prediction: {e}");
                out.malformed += 1;
                out.issues.push(RowIssue::new("predictions", position, name, &e));
                continue;
            }
        };

        match catalog.lookup(&key) {
            Lookup::Found { index, record } => {
                debug!(row = position, name, key = %key, "matched {}", record.object_name);
                used[index] = true;
                out.records.push(matched(prediction, record));
            }
            Lookup::Ambiguous(missions) => {
                let e = ReconError::AmbiguousMatch { object_name: name.to_string(), missions };
                warn!(row = position, name, "flagged for review: {e}");
                out.ambiguous += 1;
                out.issues.push(RowIssue::new("predictions", position, name, &e));
                out.records.push(placeholder(prediction, position, true));
            }
            Lookup::Missing => {
                debug!(row = position, name, key = %key, "no catalog match");
                out.records.push(placeholder(prediction, position, false));
            }
        }
    }

    if options.include_unpredicted {
        let unpredicted = catalog
            .records()
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(record, _)| passthrough(record));
        out.records.extend(unpredicted);
    }

    out
}

fn matched(prediction: &PredictionRecord, record: &CatalogRecord) -> MergedRecord {
    MergedRecord {
        source_name: prediction.object_name().to_string(),
        predicted_probability: Some(prediction.predicted_probability()),
        ..passthrough(record)
    }
}

fn passthrough(record: &CatalogRecord) -> MergedRecord {
    MergedRecord {
        mission: record.mission,
        object_name: record.object_name.clone(),
        source_name: record.object_name.clone(),
        catalog_disposition: Some(record.disposition),
        period: record.period,
        planet_radius: record.planet_radius,
        star_temp: record.star_temp,
        star_radius: record.star_radius,
        star_mass: record.star_mass,
        discovery_facility: record.discovery_facility.clone(),
        predicted_probability: None,
        predicted_label: None,
        matched: true,
        needs_review: false,
    }
}

fn placeholder(prediction: &PredictionRecord, position: usize, needs_review: bool) -> MergedRecord {
    MergedRecord {
        mission: Mission::Archive,
        object_name: format!("PLANET_{position}"),
        source_name: prediction.object_name().to_string(),
        catalog_disposition: None,
        period: None,
        planet_radius: None,
        star_temp: None,
        star_radius: None,
        star_mass: None,
        discovery_facility: PLACEHOLDER_FACILITY.to_string(),
        predicted_probability: Some(prediction.predicted_probability()),
        predicted_label: None,
        matched: false,
        needs_review,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Disposition, IssueKind};

    fn rec(mission: Mission, name: &str, disposition: Disposition) -> CatalogRecord {
        CatalogRecord {
            mission,
            object_name: name.into(),
            disposition,
            period: Some(124.524522),
            planet_radius: Some(2.69),
            star_temp: Some(5497.0),
            star_radius: Some(1.046),
            star_mass: Some(0.988),
            discovery_facility: mission.to_string(),
        }
    }

    fn pred(name: &str, p: f64) -> PredictionRecord {
        PredictionRecord::new(name, p).unwrap()
    }

    #[test]
    fn matched_rows_copy_catalog_fields() {
        let catalog =
            Catalog::load(vec![rec(Mission::Kepler, "K00711.03", Disposition::Candidate)], vec![]);
        let out = join(&[pred("KOI-711.03", 0.9)], &catalog);
        assert_eq!(out.records.len(), 1);
        let r = &out.records[0];
        assert!(r.matched);
        assert_eq!(r.object_name, "K00711.03");
        assert_eq!(r.source_name, "KOI-711.03");
        assert_eq!(r.catalog_disposition, Some(Disposition::Candidate));
        assert_eq!(r.period, Some(124.524522));
        assert_eq!(r.predicted_probability, Some(0.9));
        assert_eq!(r.predicted_label, None);
    }

    #[test]
    fn placeholders_use_input_position() {
        let catalog =
            Catalog::load(vec![rec(Mission::Kepler, "K00711.03", Disposition::Candidate)], vec![]);
        let preds = [pred("999.01", 0.1), pred("K00711.03", 0.9), pred("888.01", 0.3)];
        let out = join(&preds, &catalog);
        let names: Vec<&str> = out.records.iter().map(|r| r.object_name.as_str()).collect();
        assert_eq!(names, ["PLANET_1", "K00711.03", "PLANET_3"]);

        let p = &out.records[2];
        assert!(!p.matched);
        assert_eq!(p.mission, Mission::Archive);
        assert_eq!(p.discovery_facility, "UNKNOWN");
        assert_eq!(p.period, None);
        assert_eq!(p.star_mass, None);
        assert_eq!(p.predicted_probability, Some(0.3));
    }

    #[test]
    fn malformed_rows_dropped_but_positions_kept() {
        let catalog = Catalog::load(vec![], vec![]);
        let preds = [pred("Kepler-10 b", 0.1), pred("999.01", 0.9)];
        let out = join(&preds, &catalog);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].object_name, "PLANET_2");
        assert_eq!(out.malformed, 1);
        assert_eq!(out.issues[0].kind, IssueKind::MalformedIdentifier);
        assert_eq!(out.issues[0].row, 1);
    }

    #[test]
    fn source_rows_name_placeholders() {
        let catalog = Catalog::load(vec![], vec![]);
        let preds = [pred("888.01", 0.3).at_row(2), pred("777.01", 0.6).at_row(5)];
        let out = join(&preds, &catalog);
        let names: Vec<&str> = out.records.iter().map(|r| r.object_name.as_str()).collect();
        assert_eq!(names, ["PLANET_2", "PLANET_5"]);
    }

    #[test]
    fn ambiguous_rows_surface_unmatched_and_flagged() {
        let catalog = Catalog::load(
            vec![rec(Mission::Tess, "119.01", Disposition::Candidate)],
            vec![rec(Mission::Kepler, "K00119.01", Disposition::FalsePositive)],
        );
        let out = join(&[pred("119.01", 0.8)], &catalog);
        assert_eq!(out.ambiguous, 1);
        let r = &out.records[0];
        assert!(!r.matched);
        assert!(r.needs_review);
        assert_eq!(r.object_name, "PLANET_1");
        assert_eq!(out.issues[0].kind, IssueKind::AmbiguousMatch);
    }

    #[test]
    fn join_is_deterministic() {
        let catalog = Catalog::load(
            vec![
                rec(Mission::Kepler, "K00711.03", Disposition::Candidate),
                rec(Mission::Tess, "1468.01", Disposition::Candidate),
            ],
            vec![rec(Mission::K2, "201367065", Disposition::FalsePositive)],
        );
        let preds = [
            pred("1468.01", 0.8),
            pred("5.01", 0.2),
            pred("EPIC 201367065", 0.1),
            pred("K00711.03", 0.7),
        ];
        let a = join(&preds, &catalog);
        let b = join(&preds, &catalog);
        assert_eq!(a.records, b.records);
        assert_eq!(a.issues, b.issues);
    }

    #[test]
    fn unpredicted_catalog_rows_appended_in_load_order() {
        let catalog = Catalog::load(
            vec![
                rec(Mission::Kepler, "K00711.03", Disposition::Candidate),
                rec(Mission::Tess, "1468.01", Disposition::Candidate),
            ],
            vec![rec(Mission::K2, "201367065", Disposition::FalsePositive)],
        );
        let out = join_with(
            &[pred("1468.01", 0.8)],
            &catalog,
            JoinOptions { include_unpredicted: true },
        );
        let names: Vec<&str> = out.records.iter().map(|r| r.object_name.as_str()).collect();
        assert_eq!(names, ["1468.01", "K00711.03", "201367065"]);
        assert_eq!(out.records[1].predicted_probability, None);
        assert!(out.records[2].matched);
    }
}
