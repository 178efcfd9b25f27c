use tracing::info;

use crate::aggregate::aggregate;
use crate::catalog::Catalog;
use crate::classify;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::join::join_with;
use crate::model::{DataQuality, IssueKind, ReconInput, ReconMeta, ReconResult, RowIssue};

/// Run the full pipeline: validate, index the catalog, join, classify,
/// aggregate. Row-level problems end up in `issues` and `quality`; only
/// configuration errors fail the run.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    // Threshold first: a bad config must not cost any join work.
    let threshold = config.threshold()?;
    config.validate()?;

    let catalog = Catalog::load(input.candidates.clone(), input.false_positives.clone());
    let joined = join_with(&input.predictions, &catalog, config.join_options());
    let records = classify::apply(joined.records, threshold);
    let summary = aggregate(&records);

    let mut issues: Vec<RowIssue> = input.issues.clone();
    issues.extend(catalog.report().issues.iter().cloned());
    issues.extend(joined.issues);

    let quality = DataQuality {
        malformed_identifiers: count(&input.issues, IssueKind::MalformedIdentifier)
            + joined.malformed,
        ambiguous_matches: joined.ambiguous,
        invalid_probabilities: count(&input.issues, IssueKind::InvalidProbability),
        invalid_catalog_rows: count(&input.issues, IssueKind::InvalidRow)
            + catalog.report().malformed,
        catalog_duplicates: catalog.report().duplicates,
    };

    info!(
        total = summary.total,
        matched = summary.matched,
        unmatched = summary.unmatched,
        accuracy = summary.accuracy_pct,
        "reconciliation complete"
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            threshold: threshold.value(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        quality,
        issues,
        records,
    })
}

fn count(issues: &[RowIssue], kind: IssueKind) -> usize {
    issues.iter().filter(|i| i.kind == kind).count()
}
