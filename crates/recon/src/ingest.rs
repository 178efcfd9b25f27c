//! CSV ingestion: prediction files, standard catalog files, raw mission
//! archive tables, and previously written merged output.
//!
//! Column sets are fixed allow-lists. Extra columns are ignored, or rejected
//! when [`IngestOptions::strict_columns`] is set. Rows that fail to parse are
//! reported as [`RowIssue`]s and skipped; only structural problems (missing
//! columns, unreadable CSV) fail the whole load.

use csv::StringRecord;
use tracing::{debug, warn};

use crate::error::ReconError;
use crate::export::MERGED_COLUMNS;
use crate::model::{
    CatalogRecord, Disposition, MergedRecord, Mission, PredictionRecord, RowIssue,
};

pub const PREDICTION_COLUMNS: [&str; 2] = ["object_name", "predicted_probability"];

pub const CATALOG_COLUMNS: [&str; 9] = [
    "mission",
    "object_name",
    "disposition",
    "period",
    "planet_radius",
    "star_temp",
    "star_radius",
    "star_mass",
    "discovery_facility",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    pub strict_columns: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PredictionBatch {
    pub records: Vec<PredictionRecord>,
    pub issues: Vec<RowIssue>,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogBatch {
    pub records: Vec<CatalogRecord>,
    pub issues: Vec<RowIssue>,
}

fn reader(csv_data: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(csv_data.as_bytes())
}

/// Resolve `required` columns to header positions, enforcing the allow-list.
fn column_indices(
    table: &str,
    headers: &StringRecord,
    required: &[&str],
    options: &IngestOptions,
) -> Result<Vec<usize>, ReconError> {
    for h in headers.iter() {
        if !required.contains(&h) {
            if options.strict_columns {
                return Err(ReconError::UnknownColumn { table: table.into(), column: h.into() });
            }
            debug!(table, column = h, "ignoring column");
        }
    }

    required
        .iter()
        .map(|name| {
            headers.iter().position(|h| h == *name).ok_or_else(|| ReconError::MissingColumn {
                table: table.into(),
                column: (*name).into(),
            })
        })
        .collect()
}

/// Empty, `NaN` and `NA` mean absent; anything else must parse.
fn parse_optional(value: &str) -> Result<Option<f64>, String> {
    let v = value.trim();
    let missing = v.eq_ignore_ascii_case("nan") || v.eq_ignore_ascii_case("na") || v == "<NA>";
    if v.is_empty() || missing {
        return Ok(None);
    }
    match v.parse::<f64>() {
        Ok(n) if n.is_nan() => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(format!("'{v}' is not a number")),
    }
}

/// Load `object_name,predicted_probability` rows.
pub fn load_prediction_rows(
    csv_data: &str,
    options: &IngestOptions,
) -> Result<PredictionBatch, ReconError> {
    const TABLE: &str = "predictions";
    let mut rdr = reader(csv_data);
    let headers = rdr.headers()?.clone();
    let idx = column_indices(TABLE, &headers, &PREDICTION_COLUMNS, options)?;

    let mut batch = PredictionBatch::default();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let name = record.get(idx[0]).unwrap_or("");
        let raw_probability = record.get(idx[1]).unwrap_or("");

        let parsed = raw_probability
            .parse::<f64>()
            .map_err(|_| ReconError::InvalidProbability {
                object_name: name.to_string(),
                value: raw_probability.to_string(),
            })
            .and_then(|p| PredictionRecord::new(name, p))
            .map(|prediction| prediction.at_row(row));

        match parsed {
            Ok(prediction) => batch.records.push(prediction),
            Err(e) => {
                warn!(table = TABLE, row, "rejecting row: {e}");
                batch.issues.push(RowIssue::new(TABLE, row, name, &e));
            }
        }
    }
    Ok(batch)
}

/// Load rows in the standard catalog format. `table` labels issues
/// (`candidates`, `false_positives`).
pub fn load_catalog_rows(
    csv_data: &str,
    table: &str,
    options: &IngestOptions,
) -> Result<CatalogBatch, ReconError> {
    let mut rdr = reader(csv_data);
    let headers = rdr.headers()?.clone();
    let idx = column_indices(table, &headers, &CATALOG_COLUMNS, options)?;

    let mut batch = CatalogBatch::default();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let field = |n: usize| record.get(idx[n]).unwrap_or("");

        match catalog_record(table, row, &field) {
            Ok(rec) => batch.records.push(rec),
            Err(e) => {
                warn!(table, row, "skipping catalog row: {e}");
                batch.issues.push(RowIssue::new(table, row, field(1), &e));
            }
        }
    }
    Ok(batch)
}

fn catalog_record<'r>(
    table: &str,
    row: usize,
    field: &dyn Fn(usize) -> &'r str,
) -> Result<CatalogRecord, ReconError> {
    let invalid = |message: String| ReconError::InvalidRow { table: table.into(), row, message };

    let mission = match Mission::parse(field(0)) {
        Some(Mission::Archive) | None => {
            return Err(invalid(format!("unknown mission '{}'", field(0))));
        }
        Some(m) => m,
    };
    let object_name = field(1).to_string();
    if object_name.is_empty() {
        return Err(ReconError::MalformedIdentifier(object_name));
    }
    let disposition = Disposition::parse(field(2))
        .ok_or_else(|| invalid(format!("unknown disposition '{}'", field(2))))?;

    let num = |n: usize| {
        parse_optional(field(n)).map_err(|m| invalid(format!("{}: {m}", CATALOG_COLUMNS[n])))
    };

    Ok(CatalogRecord {
        mission,
        object_name,
        disposition,
        period: num(3)?,
        planet_radius: num(4)?,
        star_temp: num(5)?,
        star_radius: num(6)?,
        star_mass: num(7)?,
        discovery_facility: field(8).to_string(),
    })
}

// ---------------------------------------------------------------------------
// Mission archive tables
// ---------------------------------------------------------------------------

/// Column names used by one mission's archive table.
struct ArchivePreset {
    /// Tried in order; the first present column wins.
    name: &'static [&'static str],
    disposition: &'static str,
    /// period, planet_radius, star_temp, star_radius, star_mass
    numeric: [&'static str; 5],
}

fn archive_preset(mission: Mission) -> Option<ArchivePreset> {
    const PLANET_STAR: [&str; 5] = ["pl_orbper", "pl_rade", "st_teff", "st_rad", "st_mass"];
    match mission {
        Mission::Kepler => Some(ArchivePreset {
            name: &["kepoi_name"],
            disposition: "koi_disposition",
            numeric: ["koi_period", "koi_prad", "koi_steff", "koi_srad", "koi_smass"],
        }),
        Mission::Tess => Some(ArchivePreset {
            name: &["toi"],
            disposition: "tfopwg_disp",
            numeric: PLANET_STAR,
        }),
        Mission::K2 => Some(ArchivePreset {
            name: &["epic_name", "epic_candname"],
            disposition: "k2c_disp",
            numeric: PLANET_STAR,
        }),
        Mission::Archive => None,
    }
}

/// Convert a raw mission archive table into standard catalog records.
///
/// Name and disposition columns are required; numeric columns the table
/// lacks become absent values. Extra columns are always ignored; archive
/// tables carry hundreds.
pub fn convert_archive_rows(csv_data: &str, mission: Mission) -> Result<CatalogBatch, ReconError> {
    let preset = archive_preset(mission).ok_or_else(|| {
        ReconError::ConfigValidation(format!("no archive column preset for {mission}"))
    })?;
    let table = mission.to_string();

    let mut rdr = reader(csv_data);
    let headers = rdr.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let name_idx = preset.name.iter().find_map(|&n| position(n)).ok_or_else(|| {
        ReconError::MissingColumn { table: table.clone(), column: preset.name[0].into() }
    })?;
    let disposition_idx = position(preset.disposition).ok_or_else(|| ReconError::MissingColumn {
        table: table.clone(),
        column: preset.disposition.into(),
    })?;
    let numeric_idx: Vec<Option<usize>> = preset.numeric.iter().map(|&n| position(n)).collect();

    let mut batch = CatalogBatch::default();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let name = record.get(name_idx).unwrap_or("");

        let numeric: Result<Vec<Option<f64>>, String> = numeric_idx
            .iter()
            .map(|idx| match idx {
                Some(i) => parse_optional(record.get(*i).unwrap_or("")),
                None => Ok(None),
            })
            .collect();

        let disposition = Disposition::parse(record.get(disposition_idx).unwrap_or(""));
        let converted = match (disposition, numeric) {
            _ if name.is_empty() => Err(ReconError::MalformedIdentifier(String::new())),
            (None, _) => Err(ReconError::InvalidRow {
                table: table.clone(),
                row,
                message: format!(
                    "unknown disposition '{}'",
                    record.get(disposition_idx).unwrap_or("")
                ),
            }),
            (_, Err(message)) => Err(ReconError::InvalidRow { table: table.clone(), row, message }),
            (Some(disposition), Ok(n)) => Ok(CatalogRecord {
                mission,
                object_name: name.to_string(),
                disposition,
                period: n[0],
                planet_radius: n[1],
                star_temp: n[2],
                star_radius: n[3],
                star_mass: n[4],
                discovery_facility: table.clone(),
            }),
        };

        match converted {
            Ok(rec) => batch.records.push(rec),
            Err(e) => {
                warn!(table = %table, row, "skipping archive row: {e}");
                batch.issues.push(RowIssue::new(&table, row, name, &e));
            }
        }
    }
    Ok(batch)
}

/// Write catalog records in the standard catalog format.
pub fn catalog_to_csv_string(records: &[CatalogRecord]) -> Result<String, ReconError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CATALOG_COLUMNS)?;
    for r in records {
        let num = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        wtr.write_record([
            r.mission.to_string(),
            r.object_name.clone(),
            r.disposition.to_string(),
            num(r.period),
            num(r.planet_radius),
            num(r.star_temp),
            num(r.star_radius),
            num(r.star_mass),
            r.discovery_facility.clone(),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| ReconError::Io(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReconError::Csv(e.to_string()))
}

// ---------------------------------------------------------------------------
// Merged output (re-load for querying)
// ---------------------------------------------------------------------------

/// Re-load a merged output file.
///
/// The file only carries the effective disposition, so a row with an
/// `lgb_prediction` gets that as its predicted label and no catalog label.
/// Any unparseable row fails the load: this is our own output format.
pub fn load_merged_rows(csv_data: &str) -> Result<Vec<MergedRecord>, ReconError> {
    const TABLE: &str = "merged";
    let mut rdr = reader(csv_data);
    let headers = rdr.headers()?.clone();
    let idx = column_indices(TABLE, &headers, &MERGED_COLUMNS, &IngestOptions::default())?;

    let mut out = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let field = |n: usize| record.get(idx[n]).unwrap_or("");
        let invalid =
            |message: String| ReconError::InvalidRow { table: TABLE.into(), row, message };
        let num = |n: usize| {
            parse_optional(field(n)).map_err(|m| invalid(format!("{}: {m}", MERGED_COLUMNS[n])))
        };

        let object_name = field(1);
        if object_name.trim().is_empty() {
            return Err(ReconError::MalformedIdentifier(object_name.to_string()));
        }
        let mission = Mission::parse(field(0))
            .ok_or_else(|| invalid(format!("unknown mission '{}'", field(0))))?;
        let disposition = match field(2) {
            "" => None,
            text => Some(
                Disposition::parse(text)
                    .ok_or_else(|| invalid(format!("unknown disposition '{text}'")))?,
            ),
        };
        let predicted_label = match field(10) {
            "" => None,
            "1" => Some(Disposition::Confirmed),
            "0" => Some(Disposition::FalsePositive),
            other => return Err(invalid(format!("lgb_prediction must be 0 or 1, got '{other}'"))),
        };

        let predicted_probability = num(9)?;
        if let Some(p) = predicted_probability.filter(|p| !(0.0..=1.0).contains(p)) {
            return Err(ReconError::InvalidProbability {
                object_name: object_name.to_string(),
                value: p.to_string(),
            });
        }

        out.push(MergedRecord {
            mission,
            object_name: object_name.to_string(),
            source_name: object_name.to_string(),
            catalog_disposition: if predicted_label.is_some() { None } else { disposition },
            period: num(3)?,
            planet_radius: num(4)?,
            star_temp: num(5)?,
            star_radius: num(6)?,
            star_mass: num(7)?,
            discovery_facility: field(8).to_string(),
            predicted_probability,
            predicted_label,
            matched: mission != Mission::Archive,
            needs_review: false,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IssueKind;

    const CATALOG: &str = "\
mission,object_name,disposition,period,planet_radius,star_temp,star_radius,star_mass,discovery_facility
Kepler,K00711.03,CANDIDATE,124.524522,2.69,5497.0,1.046,0.988,Kepler
TESS,5150.01,FALSE POSITIVE,1.757829,13.9433,6640.0,2.59,1.1,TESS
K2,201367065,FALSE POSITIVE,,NaN,5400.0,0.95,0.98,K2
";

    #[test]
    fn load_predictions_basic() {
        let csv = "object_name,predicted_probability\n119.01,0.855043\nK00711.03,0.923456\n";
        let batch = load_prediction_rows(csv, &IngestOptions::default()).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].object_name(), "119.01");
        assert_eq!(batch.records[1].predicted_probability(), 0.923456);
        assert_eq!(batch.records[1].row(), Some(2));
        assert!(batch.issues.is_empty());
    }

    #[test]
    fn invalid_probabilities_rejected_not_clamped() {
        let csv = "object_name,predicted_probability\n119.01,1.2\n119.02,abc\n119.03,\n119.04,0.3\n";
        let batch = load_prediction_rows(csv, &IngestOptions::default()).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.issues.len(), 3);
        assert!(batch.issues.iter().all(|i| i.kind == IssueKind::InvalidProbability));
        assert_eq!(batch.issues.iter().map(|i| i.row).collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn missing_prediction_column() {
        let csv = "name,predicted_probability\n119.01,0.5\n";
        let err = load_prediction_rows(csv, &IngestOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ReconError::MissingColumn { table: "predictions".into(), column: "object_name".into() }
        );
    }

    #[test]
    fn extra_columns_ignored_or_rejected() {
        let csv = "object_name,predicted_probability,model\n119.01,0.5,lgb\n";
        let lenient = load_prediction_rows(csv, &IngestOptions::default()).unwrap();
        assert_eq!(lenient.records.len(), 1);

        let err = load_prediction_rows(csv, &IngestOptions { strict_columns: true }).unwrap_err();
        assert!(matches!(err, ReconError::UnknownColumn { ref column, .. } if column == "model"));
    }

    #[test]
    fn load_catalog_standard_format() {
        let batch = load_catalog_rows(CATALOG, "candidates", &IngestOptions::default()).unwrap();
        assert_eq!(batch.records.len(), 3);
        assert_eq!(batch.records[0].mission, Mission::Kepler);
        assert_eq!(batch.records[0].star_temp, Some(5497.0));
        assert_eq!(batch.records[1].disposition, Disposition::FalsePositive);
        assert_eq!(batch.records[2].period, None);
        assert_eq!(batch.records[2].planet_radius, None);
    }

    #[test]
    fn bad_catalog_rows_reported() {
        let csv = "\
mission,object_name,disposition,period,planet_radius,star_temp,star_radius,star_mass,discovery_facility
Hubble,X1,CANDIDATE,,,,,,Hubble
Kepler,K00001.01,MAYBE,,,,,,Kepler
Kepler,K00002.01,CANDIDATE,fast,,,,,Kepler
Kepler,K00003.01,CANDIDATE,1.5,,,,,Kepler
";
        let batch = load_catalog_rows(csv, "candidates", &IngestOptions::default()).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.issues.len(), 3);
        assert!(batch.issues[2].message.contains("period"));
    }

    #[test]
    fn convert_kepler_archive_table() {
        let csv = "\
# comment lines from the archive are skipped
kepid,kepoi_name,koi_disposition,koi_period,koi_prad,koi_steff,koi_srad,koi_smass
10797460,K00752.01,CONFIRMED,9.488036,2.26,5455,0.927,0.919
10811496,K00753.01,FALSE POSITIVE,19.899140,14.6,5853,0.868,
";
        let batch = convert_archive_rows(csv, Mission::Kepler).unwrap();
        assert_eq!(batch.records.len(), 2);
        let first = &batch.records[0];
        assert_eq!(first.object_name, "K00752.01");
        assert_eq!(first.disposition, Disposition::Confirmed);
        assert_eq!(first.discovery_facility, "Kepler");
        assert_eq!(batch.records[1].star_mass, None);
    }

    #[test]
    fn convert_tess_codes_and_missing_columns() {
        let csv = "toi,tfopwg_disp,pl_orbper\n\
                   119.01,PC,5.5\n120.01,FP,\n121.01,KP,1.0\n122.01,CP,2.0\n";
        let batch = convert_archive_rows(csv, Mission::Tess).unwrap();
        let dispositions: Vec<Disposition> = batch.records.iter().map(|r| r.disposition).collect();
        assert_eq!(
            dispositions,
            [
                Disposition::Candidate,
                Disposition::FalsePositive,
                Disposition::Confirmed,
                Disposition::Confirmed,
            ]
        );
        assert_eq!(batch.records[0].period, Some(5.5));
        assert_eq!(batch.records[0].star_temp, None);
    }

    #[test]
    fn convert_k2_falls_back_to_candname() {
        let csv = "epic_candname,k2c_disp\nEPIC 201367065.01,CANDIDATE\n";
        let batch = convert_archive_rows(csv, Mission::K2).unwrap();
        assert_eq!(batch.records[0].object_name, "EPIC 201367065.01");
    }

    #[test]
    fn convert_requires_disposition_column() {
        let err = convert_archive_rows("toi,pl_orbper\n1.01,2\n", Mission::Tess).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { ref column, .. } if column == "tfopwg_disp"));
    }

    #[test]
    fn catalog_csv_round_trips_through_loader() {
        let batch = load_catalog_rows(CATALOG, "candidates", &IngestOptions::default()).unwrap();
        let text = catalog_to_csv_string(&batch.records).unwrap();
        let again = load_catalog_rows(&text, "candidates", &IngestOptions::default()).unwrap();
        assert_eq!(again.records, batch.records);
    }

    #[test]
    fn load_merged_output() {
        let csv = "\
mission,object_name,disposition,period,planet_radius,star_temp,star_radius,star_mass,discovery_facility,predicted_probability,lgb_prediction
Kepler,K00711.03,CONFIRMED,124.524522,2.69,5497,1.046,0.988,Kepler,0.9,1
ARCHIVE,PLANET_2,FALSE POSITIVE,,,,,,UNKNOWN,0.2,0
TESS,1468.01,CANDIDATE,5.285,,,,,TESS,,
";
        let rows = load_merged_rows(csv).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].predicted_label, Some(Disposition::Confirmed));
        assert!(!rows[1].matched);
        assert_eq!(rows[1].disposition(), Some(Disposition::FalsePositive));
        assert_eq!(rows[2].predicted_probability, None);
        assert_eq!(rows[2].catalog_disposition, Some(Disposition::Candidate));
    }

    const MERGED_HEADER: &str = "mission,object_name,disposition,period,planet_radius,star_temp,\
star_radius,star_mass,discovery_facility,predicted_probability,lgb_prediction\n";

    #[test]
    fn merged_probability_outside_unit_interval_rejected() {
        let csv = format!("{MERGED_HEADER}Kepler,K00711.03,CONFIRMED,,,,,,Kepler,1.7,1\n");
        assert!(matches!(
            load_merged_rows(&csv),
            Err(ReconError::InvalidProbability { ref object_name, .. }) if object_name == "K00711.03"
        ));
        let csv = format!("{MERGED_HEADER}Kepler,K00711.03,CONFIRMED,,,,,,Kepler,-0.1,1\n");
        assert!(matches!(load_merged_rows(&csv), Err(ReconError::InvalidProbability { .. })));
    }

    #[test]
    fn merged_empty_name_rejected() {
        let csv = format!("{MERGED_HEADER}Kepler,  ,CONFIRMED,,,,,,Kepler,0.4,0\n");
        assert!(matches!(load_merged_rows(&csv), Err(ReconError::MalformedIdentifier(_))));
    }
}
