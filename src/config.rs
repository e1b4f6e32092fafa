use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConsolidateError, Result};
use crate::headers::HeaderSynonyms;

pub const CONFIG_ENV: &str = "CONSOLIDATOR_CONFIG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelLanguage {
    #[default]
    English,
    Spanish,
}

/// Literals and labels the pipeline matches against. Every field has a default,
/// so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub service_group: String,
    pub shared_product: String,
    pub exclusive_product: String,
    pub resolved_status: String,
    pub missing_sentinel: String,
    pub week_labels: LabelLanguage,
    pub unassigned_supervisor: String,
    pub header_synonyms: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            service_group: "C_Ops Support".to_string(),
            shared_product: "van_compartida".to_string(),
            exclusive_product: "van_exclusive".to_string(),
            resolved_status: "solved".to_string(),
            missing_sentinel: "–".to_string(),
            week_labels: LabelLanguage::English,
            unassigned_supervisor: "Unassigned".to_string(),
            header_synonyms: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.header_synonym_table()?;
        Ok(config)
    }

    /// Explicit path first, then `CONSOLIDATOR_CONFIG`, then defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV).map(Into::into),
        };
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            ConsolidateError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), "loaded pipeline config");
        Self::from_json(&raw)
    }

    pub fn header_synonym_table(&self) -> Result<HeaderSynonyms> {
        HeaderSynonyms::with_overrides(&self.header_synonyms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            PipelineConfig::from_json(r#"{"service_group": "B2B Support", "week_labels": "spanish"}"#)
                .unwrap();
        assert_eq!(config.service_group, "B2B Support");
        assert_eq!(config.week_labels, LabelLanguage::Spanish);
        assert_eq!(config.exclusive_product, "van_exclusive");
        assert_eq!(config.missing_sentinel, "–");
    }

    #[test]
    fn invalid_synonyms_are_rejected() {
        let err = PipelineConfig::from_json(r#"{"header_synonyms": {"price": "amount", "amount": "total"}}"#)
            .unwrap_err();
        assert!(matches!(err, ConsolidateError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"resolved_status": "closed"}"#).unwrap();
        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.resolved_status, "closed");
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let err = PipelineConfig::load(Some(Path::new("/nonexistent/consolidator.json"))).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
