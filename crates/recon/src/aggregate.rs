use std::collections::BTreeMap;

use crate::model::{
    CatalogRecord, Disposition, FieldCompleteness, MergedRecord, Mission, NumericField, Statistics,
};

/// Compute distribution, accuracy and completeness over a merged record set.
///
/// Accuracy only counts records with both a predicted label and a catalog
/// label; a record agrees when both or neither say CONFIRMED.
pub fn aggregate(records: &[MergedRecord]) -> Statistics {
    let mut disposition_counts: BTreeMap<Disposition, usize> =
        Disposition::ALL.iter().map(|d| (*d, 0)).collect();
    let mut mission_counts = BTreeMap::new();
    let mut matched = 0;
    let mut predicted = 0;
    let mut accuracy_sample = 0;
    let mut agree = 0;

    for r in records {
        if let Some(d) = r.disposition() {
            *disposition_counts.entry(d).or_insert(0) += 1;
        }
        *mission_counts.entry(r.mission).or_insert(0) += 1;
        if r.matched {
            matched += 1;
        }
        if r.predicted_probability.is_some() {
            predicted += 1;
        }
        if let (Some(label), Some(truth)) = (r.predicted_label, r.catalog_disposition) {
            accuracy_sample += 1;
            if (label == Disposition::Confirmed) == (truth == Disposition::Confirmed) {
                agree += 1;
            }
        }
    }

    let completeness = NumericField::ALL
        .iter()
        .map(|&field| {
            let present = records
                .iter()
                .filter(|r| r.numeric(field).is_some_and(|v| !v.is_nan()))
                .count();
            FieldCompleteness {
                field,
                present,
                total: records.len(),
                fraction: if records.is_empty() {
                    0.0
                } else {
                    present as f64 / records.len() as f64
                },
            }
        })
        .collect();

    Statistics {
        total: records.len(),
        matched,
        unmatched: records.len() - matched,
        predicted,
        disposition_counts,
        mission_counts,
        accuracy_sample,
        accuracy_pct: percent(agree, accuracy_sample),
        completeness,
    }
}

/// Mission and disposition tallies over a set of catalog records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub total: usize,
    pub missions: BTreeMap<Mission, usize>,
    pub dispositions: BTreeMap<Disposition, usize>,
}

/// Count a combined catalog by mission and by disposition. Every
/// disposition is listed, zero counts included.
pub fn count_catalog(records: &[CatalogRecord]) -> CatalogCounts {
    let mut counts = CatalogCounts {
        total: records.len(),
        missions: BTreeMap::new(),
        dispositions: Disposition::ALL.iter().map(|d| (*d, 0)).collect(),
    };
    for r in records {
        *counts.missions.entry(r.mission).or_insert(0) += 1;
        *counts.dispositions.entry(r.disposition).or_insert(0) += 1;
    }
    counts
}

/// `part / whole` as a percentage rounded to one decimal; zero when `whole` is zero.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        mission: Mission,
        truth: Option<Disposition>,
        probability: Option<f64>,
        label: Option<Disposition>,
    ) -> MergedRecord {
        MergedRecord {
            mission,
            object_name: "x".into(),
            source_name: "x".into(),
            catalog_disposition: truth,
            period: truth.map(|_| 10.0),
            planet_radius: None,
            star_temp: truth.map(|_| 5000.0),
            star_radius: None,
            star_mass: None,
            discovery_facility: mission.to_string(),
            predicted_probability: probability,
            predicted_label: label,
            matched: truth.is_some(),
            needs_review: false,
        }
    }

    use Disposition::*;

    #[test]
    fn accuracy_three_of_four() {
        let records = vec![
            record(Mission::Kepler, Some(Confirmed), Some(0.9), Some(Confirmed)),
            record(Mission::Kepler, Some(FalsePositive), Some(0.1), Some(FalsePositive)),
            record(Mission::Tess, Some(Candidate), Some(0.2), Some(FalsePositive)),
            record(Mission::Tess, Some(FalsePositive), Some(0.8), Some(Confirmed)),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.accuracy_sample, 4);
        assert_eq!(stats.accuracy_pct, 75.0);
    }

    #[test]
    fn accuracy_zero_without_predictions() {
        let records = vec![record(Mission::Kepler, Some(Confirmed), None, None)];
        let stats = aggregate(&records);
        assert_eq!(stats.accuracy_sample, 0);
        assert_eq!(stats.accuracy_pct, 0.0);
        assert_eq!(stats.predicted, 0);
    }

    #[test]
    fn placeholders_excluded_from_accuracy() {
        let records = vec![
            record(Mission::Kepler, Some(Confirmed), Some(0.9), Some(Confirmed)),
            record(Mission::Archive, None, Some(0.9), Some(Confirmed)),
            record(Mission::Archive, None, Some(0.1), Some(FalsePositive)),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.accuracy_sample, 1);
        assert_eq!(stats.accuracy_pct, 100.0);
        assert_eq!(stats.unmatched, 2);
        assert_eq!(stats.mission_counts[&Mission::Archive], 2);
    }

    #[test]
    fn disposition_counts_use_effective_label() {
        let records = vec![
            record(Mission::Kepler, Some(Candidate), Some(0.9), Some(Confirmed)),
            record(Mission::Kepler, Some(Candidate), None, None),
            record(Mission::Archive, None, Some(0.1), Some(FalsePositive)),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.disposition_counts[&Confirmed], 1);
        assert_eq!(stats.disposition_counts[&Candidate], 1);
        assert_eq!(stats.disposition_counts[&FalsePositive], 1);
    }

    #[test]
    fn completeness_fractions() {
        let records = vec![
            record(Mission::Kepler, Some(Candidate), Some(0.9), Some(Confirmed)),
            record(Mission::Archive, None, Some(0.1), Some(FalsePositive)),
        ];
        let stats = aggregate(&records);
        let period = &stats.completeness[0];
        assert_eq!(period.field, NumericField::Period);
        assert_eq!((period.present, period.total), (1, 2));
        assert_eq!(period.fraction, 0.5);
        let radius = &stats.completeness[1];
        assert_eq!(radius.present, 0);
    }

    #[test]
    fn empty_set() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.accuracy_pct, 0.0);
        assert_eq!(stats.completeness[0].fraction, 0.0);
        assert_eq!(stats.disposition_counts.len(), 3);
    }

    #[test]
    fn catalog_counts_by_mission_and_disposition() {
        let rec = |mission: Mission, disposition: Disposition| CatalogRecord {
            mission,
            object_name: "x".into(),
            disposition,
            period: None,
            planet_radius: None,
            star_temp: None,
            star_radius: None,
            star_mass: None,
            discovery_facility: mission.to_string(),
        };
        let counts = count_catalog(&[
            rec(Mission::Kepler, Disposition::Confirmed),
            rec(Mission::Kepler, Disposition::Candidate),
            rec(Mission::Tess, Disposition::Confirmed),
        ]);
        assert_eq!(counts.total, 3);
        assert_eq!(counts.missions[&Mission::Kepler], 2);
        assert_eq!(counts.missions[&Mission::Tess], 1);
        assert!(!counts.missions.contains_key(&Mission::K2));
        assert_eq!(counts.dispositions[&Disposition::Confirmed], 2);
        assert_eq!(counts.dispositions[&Disposition::FalsePositive], 0);
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(0, 0), 0.0);
    }
}
