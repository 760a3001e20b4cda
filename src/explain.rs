//! Free-text explanations keyed by field identifier.
//!
//! Lookups never fail: unknown keys resolve to [`FALLBACK_EXPLANATION`].

use crate::error::{AnalysisError, Result};
use crate::types::Field;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const FALLBACK_EXPLANATION: &str = "No explanation available for this variable.";

/// Explanations for the per-variable summaries and distributions.
pub const DISTRIBUTIONS_FILE: &str = "distributions_explanation.json";

/// Explanations for the per-region comparison.
pub const REGIONS_FILE: &str = "distribution_region_explanation.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Explanations {
    entries: HashMap<String, String>,
}

impl Explanations {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalysisError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Text for `key`. Files may be keyed by either name of a field, so a
    /// key that names a field also tries the field's other name.
    pub fn get(&self, key: &str) -> &str {
        if let Some(text) = self.entries.get(key) {
            return text;
        }
        key.parse::<Field>()
            .ok()
            .and_then(|f| {
                self.entries
                    .get(f.name())
                    .or_else(|| self.entries.get(f.source_name()))
            })
            .map(String::as_str)
            .unwrap_or(FALLBACK_EXPLANATION)
    }
}

/// Both lookup tables used by the reports.
#[derive(Debug, Clone, Default)]
pub struct ExplanationSet {
    pub distributions: Explanations,
    pub regions: Explanations,
}

impl ExplanationSet {
    pub fn load(assets: &Path) -> Result<Self> {
        Ok(ExplanationSet {
            distributions: Explanations::load(&assets.join(DISTRIBUTIONS_FILE))?,
            regions: Explanations::load(&assets.join(REGIONS_FILE))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lookup_with_alias_and_fallback() {
        let ex = Explanations::from_json(
            r#"{"departamento": "Households concentrate in a few regions.", "hogares": "Skewed."}"#,
        )
        .unwrap();
        assert_eq!(ex.entries.len(), 2);
        assert_eq!(ex.get("departamento"), "Households concentrate in a few regions.");
        assert_eq!(ex.get("region"), "Households concentrate in a few regions.");
        assert_eq!(ex.get("household_count"), "Skewed.");
        assert_eq!(ex.get("programa"), FALLBACK_EXPLANATION);
        assert_eq!(ex.get("nonsense"), FALLBACK_EXPLANATION);
    }

    #[test]
    fn test_load_set_from_assets_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(DISTRIBUTIONS_FILE), r#"{"hogares": "a"}"#).unwrap();
        let err = ExplanationSet::load(dir.path()).unwrap_err();
        assert!(matches!(err, AnalysisError::SourceNotFound { .. }));

        std::fs::write(dir.path().join(REGIONS_FILE), r#"{"hogares": "b"}"#).unwrap();
        let set = ExplanationSet::load(dir.path()).unwrap();
        assert_eq!(set.distributions.get("hogares"), "a");
        assert_eq!(set.regions.get("household_count"), "b");
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Explanations::from_json("[1, 2]"),
            Err(AnalysisError::Json(_))
        ));
    }
}
