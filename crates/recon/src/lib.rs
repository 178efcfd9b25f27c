//! `exomerge-recon` reconciles model predictions with the Kepler, TESS and
//! K2 catalogs.
//!
//! Pure engine crate: receives pre-loaded rows (or CSV text), returns merged
//! records, statistics and a data-quality report. No CLI or filesystem access.

pub mod aggregate;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingest;
pub mod join;
pub mod model;
pub mod normalize;
pub mod query;

pub use catalog::{Catalog, CatalogReport, Lookup};
pub use classify::Threshold;
pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{
    CatalogRecord, Disposition, MergedRecord, Mission, PredictionRecord, ReconInput, ReconResult,
    RowIssue,
};
pub use normalize::{normalize, CanonicalKey};
pub use query::{filter, DispositionFilter, Query};
