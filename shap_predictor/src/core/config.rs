// src/core/config.rs
//! Configuration records of the predictor.

use crate::core::{ClassLabel, FeatureType, PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Filters applied when summarizing local contributions.
/// Every field defaults to `None`, meaning no filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaskParams {
    /// Features never shown, by technical or domain name.
    #[serde(default)]
    pub features_to_hide: Option<Vec<String>>,
    /// Absolute contribution below which a contribution is hidden.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// `Some(true)` keeps positive contributions only, `Some(false)` negative only.
    #[serde(default)]
    pub positive: Option<bool>,
    /// Maximum number of contributions kept per row.
    #[serde(default)]
    pub max_contrib: Option<usize>,
}

impl MaskParams {
    pub fn validate(&self) -> Result<()> {
        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(PredictorError::config(format!(
                    "mask_params threshold must be a finite non-negative number, got {}.",
                    threshold
                )));
            }
        }
        if self.max_contrib == Some(0) {
            return Err(PredictorError::config(
                "mask_params max_contrib must be at least 1.",
            ));
        }
        Ok(())
    }

    /// Overwrites the fields set in `update`, leaving the others untouched.
    pub fn merged(&self, update: MaskParams) -> MaskParams {
        MaskParams {
            features_to_hide: update.features_to_hide.or_else(|| self.features_to_hide.clone()),
            threshold: update.threshold.or(self.threshold),
            positive: update.positive.or(self.positive),
            max_contrib: update.max_contrib.or(self.max_contrib),
        }
    }
}

/// Everything the host application declares about the explained model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Technical feature name to domain name.
    #[serde(default)]
    pub features_dict: HashMap<String, String>,
    /// Ordinal position to technical feature name; defines the column order.
    pub columns_dict: BTreeMap<usize, String>,
    /// Technical feature name to declared type.
    pub features_types: HashMap<String, FeatureType>,
    /// Class label to domain name (classification only).
    #[serde(default)]
    pub label_dict: Option<HashMap<ClassLabel, String>>,
    #[serde(default)]
    pub mask_params: MaskParams,
}

impl PredictorConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| {
            PredictorError::config_caused_by("Predictor configuration is malformed.", Box::new(e))
        })
    }

    /// Technical feature names in `columns_dict` order.
    pub fn ordered_features(&self) -> Vec<String> {
        self.columns_dict.values().cloned().collect()
    }

    /// Checks that does not depend on the model: column ordering, declared
    /// types and mask parameters.
    pub fn validate(&self) -> Result<()> {
        if self.columns_dict.is_empty() {
            return Err(PredictorError::config("columns_dict cannot be empty."));
        }
        let first = self.columns_dict.keys().next().copied().unwrap_or_default();
        for (rank, position) in self.columns_dict.keys().enumerate() {
            if *position != first + rank {
                return Err(PredictorError::config(format!(
                    "columns_dict keys must be contiguous integers, found {} after {}.",
                    position,
                    first + rank - 1
                )));
            }
        }
        for feature in self.columns_dict.values() {
            if !self.features_types.contains_key(feature) {
                return Err(PredictorError::config(format!(
                    "Feature '{}' of columns_dict has no entry in features_types.",
                    feature
                )));
            }
        }
        self.mask_params.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "features_dict": {"Age": "Age of passenger"},
        "columns_dict": {"0": "Age", "1": "Sex"},
        "features_types": {"Age": "float64", "Sex": "object"},
        "mask_params": {"threshold": 0.1, "max_contrib": 2}
    }"#;

    #[test]
    fn loads_from_json() -> Result<()> {
        let config = PredictorConfig::from_json(CONFIG)?;
        config.validate()?;
        assert_eq!(config.ordered_features(), vec!["Age", "Sex"]);
        assert_eq!(config.features_types["Sex"], FeatureType::Object);
        assert_eq!(config.mask_params.max_contrib, Some(2));
        assert_eq!(config.mask_params.positive, None);
        assert!(config.label_dict.is_none());
        Ok(())
    }

    #[test]
    fn unknown_mask_key_is_a_config_error() {
        let raw = r#"{"columns_dict": {"0": "A"}, "features_types": {"A": "int64"},
                      "mask_params": {"treshold": 1.0}}"#;
        assert!(matches!(
            PredictorConfig::from_json(raw),
            Err(PredictorError::Config { .. })
        ));
    }

    #[test]
    fn columns_dict_must_be_contiguous() {
        let mut config = PredictorConfig::from_json(CONFIG).unwrap();
        config.columns_dict.insert(3, "Fare".into());
        config.features_types.insert("Fare".into(), FeatureType::Float64);
        assert!(matches!(config.validate(), Err(PredictorError::Config { .. })));
    }

    #[test]
    fn columns_dict_may_start_anywhere() -> Result<()> {
        let raw = r#"{"columns_dict": {"1": "Age", "2": "Sex"},
                      "features_types": {"Age": "float64", "Sex": "object"}}"#;
        let config = PredictorConfig::from_json(raw)?;
        config.validate()?;
        assert_eq!(config.ordered_features(), vec!["Age", "Sex"]);
        Ok(())
    }

    #[test]
    fn every_column_needs_a_type() {
        let mut config = PredictorConfig::from_json(CONFIG).unwrap();
        config.features_types.remove("Sex");
        assert!(matches!(config.validate(), Err(PredictorError::Config { .. })));
    }

    #[test]
    fn mask_params_domains() {
        let negative = MaskParams {
            threshold: Some(-0.5),
            ..Default::default()
        };
        assert!(negative.validate().is_err());
        let nan = MaskParams {
            threshold: Some(f64::NAN),
            ..Default::default()
        };
        assert!(nan.validate().is_err());
        let zero = MaskParams {
            max_contrib: Some(0),
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        assert!(MaskParams::default().validate().is_ok());
    }

    #[test]
    fn merged_only_overwrites_given_fields() {
        let current = MaskParams {
            threshold: Some(0.2),
            max_contrib: Some(3),
            ..Default::default()
        };
        let merged = current.merged(MaskParams {
            positive: Some(true),
            max_contrib: Some(1),
            ..Default::default()
        });
        assert_eq!(merged.threshold, Some(0.2));
        assert_eq!(merged.positive, Some(true));
        assert_eq!(merged.max_contrib, Some(1));
        assert_eq!(merged.features_to_hide, None);
    }
}
