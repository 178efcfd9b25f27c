use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ReconError;
use crate::model::{CatalogRecord, Mission, RowIssue};
use crate::normalize::{normalize, CanonicalKey};

/// Outcome of a catalog lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found { index: usize, record: &'a CatalogRecord },
    /// Bare numeric id present under several missions; nothing is picked.
    Ambiguous(Vec<Mission>),
    Missing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogReport {
    pub indexed: usize,
    pub malformed: usize,
    pub duplicates: usize,
    pub issues: Vec<RowIssue>,
}

/// Read-only index over candidate and false-positive records.
///
/// Every record is indexed under `(mission, numeric_id)` and under its bare
/// `numeric_id`. A bare id that several missions share resolves to
/// [`Lookup::Ambiguous`] rather than to whichever record came first.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
    by_family: HashMap<CanonicalKey, usize>,
    by_id: HashMap<String, Vec<usize>>,
    report: CatalogReport,
}

impl Catalog {
    /// Index candidates, then false positives. On a duplicate
    /// `(mission, numeric_id)` the first record wins and the rest are counted.
    pub fn load(candidates: Vec<CatalogRecord>, false_positives: Vec<CatalogRecord>) -> Self {
        let mut catalog = Catalog::default();
        catalog.extend("candidates", candidates);
        catalog.extend("false_positives", false_positives);

        info!(
            indexed = catalog.report.indexed,
            malformed = catalog.report.malformed,
            duplicates = catalog.report.duplicates,
            "catalog loaded"
        );
        catalog
    }

    fn extend(&mut self, table: &str, rows: Vec<CatalogRecord>) {
        for (i, record) in rows.into_iter().enumerate() {
            let row = i + 1;
            let key = match normalize(&record.object_name) {
                Ok(key) => key.with_family(record.mission),
                Err(e) => {
                    warn!(table, row, name = %record.object_name, "skipping catalog row: {e}");
                    self.report.malformed += 1;
                    self.report.issues.push(RowIssue::new(table, row, &record.object_name, &e));
                    continue;
                }
            };

            if self.by_family.contains_key(&key) {
                warn!(table, row, key = %key, "duplicate catalog key, keeping first");
                self.report.duplicates += 1;
                let e = ReconError::InvalidRow {
                    table: table.to_string(),
                    row,
                    message: format!("duplicate key {key}"),
                };
                self.report.issues.push(RowIssue::new(table, row, &record.object_name, &e));
                continue;
            }

            let index = self.records.len();
            self.by_id.entry(key.numeric_id().to_string()).or_default().push(index);
            self.by_family.insert(key, index);
            self.records.push(record);
            self.report.indexed += 1;
        }
    }

    /// Resolve a key: family-qualified hit first, then bare numeric id.
    pub fn lookup(&self, key: &CanonicalKey) -> Lookup<'_> {
        if key.family().is_some() {
            if let Some(&index) = self.by_family.get(key) {
                return self.found(index);
            }
        }

        match self.by_id.get(key.numeric_id()).map(Vec::as_slice) {
            None | Some([]) => Lookup::Missing,
            Some([index]) => self.found(*index),
            Some(indices) => {
                let mut missions: Vec<Mission> =
                    indices.iter().map(|&i| self.records[i].mission).collect();
                missions.sort();
                Lookup::Ambiguous(missions)
            }
        }
    }

    fn found(&self, index: usize) -> Lookup<'_> {
        Lookup::Found { index, record: &self.records[index] }
    }

    /// Indexed records in load order.
    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn report(&self) -> &CatalogReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
