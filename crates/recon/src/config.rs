use serde::Deserialize;

use crate::classify::Threshold;
use crate::error::ReconError;
use crate::ingest::IngestOptions;
use crate::join::JoinOptions;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Treat ambiguous matches as a failed run.
    #[serde(default)]
    pub fail_on_ambiguous: bool,
    #[serde(default)]
    pub classify: ClassifyConfig,
    #[serde(default)]
    pub join: JoinConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "exomerge".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            fail_on_ambiguous: false,
            classify: ClassifyConfig::default(),
            join: JoinConfig::default(),
            ingest: IngestConfig::default(),
            inputs: InputsConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The threshold stays a raw float here so that an out-of-range value
/// surfaces as [`ReconError::InvalidThreshold`] from [`ReconConfig::validate`]
/// instead of as a generic parse error.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    Threshold::DEFAULT.value()
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self { threshold: default_threshold() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinConfig {
    #[serde(default)]
    pub include_unpredicted: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    #[serde(default)]
    pub strict_columns: bool,
}

/// Input paths, relative to the config file's directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputsConfig {
    #[serde(default)]
    pub predictions: Option<String>,
    #[serde(default)]
    pub candidates: Option<String>,
    #[serde(default)]
    pub false_positives: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing + validation
// ---------------------------------------------------------------------------

impl ReconConfig {
    /// Parse and validate a TOML config.
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }
        self.threshold()?;
        Ok(())
    }

    pub fn threshold(&self) -> Result<Threshold, ReconError> {
        Threshold::new(self.classify.threshold)
    }

    pub fn join_options(&self) -> JoinOptions {
        JoinOptions { include_unpredicted: self.join.include_unpredicted }
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions { strict_columns: self.ingest.strict_columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let input = r#"
name = "final-output"
fail_on_ambiguous = true

[classify]
threshold = 0.7

[join]
include_unpredicted = true

[ingest]
strict_columns = true

[inputs]
predictions = "preds.csv"
candidates = "data/all_candidates_standard.csv"

[output]
csv = "out.csv"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.name, "final-output");
        assert!(config.fail_on_ambiguous);
        assert_eq!(config.threshold().unwrap().value(), 0.7);
        assert!(config.join_options().include_unpredicted);
        assert!(config.ingest_options().strict_columns);
        assert_eq!(config.inputs.predictions.as_deref(), Some("preds.csv"));
        assert_eq!(config.inputs.false_positives, None);
        assert_eq!(config.output.csv.as_deref(), Some("out.csv"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.name, "exomerge");
        assert_eq!(config.threshold().unwrap(), Threshold::DEFAULT);
        assert!(!config.join.include_unpredicted);
        assert!(!config.fail_on_ambiguous);
    }

    #[test]
    fn reject_threshold_out_of_range() {
        let err = ReconConfig::from_toml("[classify]\nthreshold = 1.5\n").unwrap_err();
        assert_eq!(err, ReconError::InvalidThreshold(1.5));
    }

    #[test]
    fn reject_unknown_keys() {
        let err = ReconConfig::from_toml("[classify]\ncutoff = 0.5\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_name() {
        let err = ReconConfig::from_toml("name = \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }
}
