//! Flat row rendering of merged records (CSV output and filtered views).

use std::io::Write;

use crate::error::ReconError;
use crate::model::{Disposition, MergedRecord};

/// Output column order. The catalog columns come first so the file stays
/// readable by anything that consumes the standard catalog format.
pub const MERGED_COLUMNS: [&str; 11] = [
    "mission",
    "object_name",
    "disposition",
    "period",
    "planet_radius",
    "star_temp",
    "star_radius",
    "star_mass",
    "discovery_facility",
    "predicted_probability",
    "lgb_prediction",
];

/// Render one record in [`MERGED_COLUMNS`] order. Absent values are empty.
pub fn to_row(record: &MergedRecord) -> Vec<String> {
    vec![
        record.mission.to_string(),
        record.object_name.clone(),
        record.disposition().map(|d| d.to_string()).unwrap_or_default(),
        number(record.period),
        number(record.planet_radius),
        number(record.star_temp),
        number(record.star_radius),
        number(record.star_mass),
        record.discovery_facility.clone(),
        number(record.predicted_probability),
        match record.predicted_label {
            Some(Disposition::Confirmed) => "1".to_string(),
            Some(_) => "0".to_string(),
            None => String::new(),
        },
    ]
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write a header plus one row per record.
pub fn write_csv<'a, W, I>(writer: W, records: I) -> Result<(), ReconError>
where
    W: Write,
    I: IntoIterator<Item = &'a MergedRecord>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(MERGED_COLUMNS)?;
    for record in records {
        wtr.write_record(to_row(record))?;
    }
    wtr.flush().map_err(|e| ReconError::Io(e.to_string()))?;
    Ok(())
}

pub fn to_csv_string<'a, I>(records: I) -> Result<String, ReconError>
where
    I: IntoIterator<Item = &'a MergedRecord>,
{
    let mut buf = Vec::new();
    write_csv(&mut buf, records)?;
    String::from_utf8(buf).map_err(|e| ReconError::Csv(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mission;

    fn placeholder() -> MergedRecord {
        MergedRecord {
            mission: Mission::Archive,
            object_name: "PLANET_2".into(),
            source_name: "999.01".into(),
            catalog_disposition: None,
            period: None,
            planet_radius: None,
            star_temp: None,
            star_radius: None,
            star_mass: None,
            discovery_facility: "UNKNOWN".into(),
            predicted_probability: Some(0.2),
            predicted_label: Some(Disposition::FalsePositive),
            matched: false,
            needs_review: false,
        }
    }

    #[test]
    fn placeholder_row() {
        assert_eq!(
            to_row(&placeholder()),
            vec!["ARCHIVE", "PLANET_2", "FALSE POSITIVE", "", "", "", "", "", "UNKNOWN", "0.2", "0"]
        );
    }

    #[test]
    fn csv_has_header_and_rows() {
        let records = vec![placeholder()];
        let out = to_csv_string(&records).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("mission,object_name,disposition,period,planet_radius,star_temp,star_radius,star_mass,discovery_facility,predicted_probability,lgb_prediction")
        );
        assert_eq!(lines.next(), Some("ARCHIVE,PLANET_2,FALSE POSITIVE,,,,,,UNKNOWN,0.2,0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_view_still_has_header() {
        let out = to_csv_string(std::iter::empty()).unwrap();
        assert_eq!(out.lines().count(), 1);
    }
}
