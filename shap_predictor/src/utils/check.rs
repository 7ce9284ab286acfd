// src/utils/check.rs
//! Input validation at the predictor boundary.

use crate::core::{
    Case, ClassLabel, Dataset, FeatureType, FeatureValue, Prediction, PredictorError, Result,
};
use ndarray::Array2;
use std::collections::{HashMap, HashSet};

/// Reorders the columns of `x` into the declared feature order.
pub fn order_columns(x: &Dataset, features: &[String]) -> Result<Dataset> {
    if let Some(unknown) = x.columns().iter().find(|c| !features.contains(c)) {
        return Err(PredictorError::shape(format!(
            "Feature '{}' of x is not declared in columns_dict.",
            unknown
        )));
    }
    x.align_to(x.index(), features)
}

pub fn check_feature_types(x: &Dataset, features_types: &HashMap<String, FeatureType>) -> Result<()> {
    for (j, column) in x.columns().iter().enumerate() {
        let ty = features_types.get(column).ok_or_else(|| {
            PredictorError::type_mismatch(format!("Feature '{}' has no declared type.", column))
        })?;
        if let Some(bad) = x.values().column(j).iter().find(|v| !v.matches(*ty)) {
            return Err(PredictorError::type_mismatch(format!(
                "Feature '{}' expects {} values, found '{}'.",
                column, ty, bad
            )));
        }
    }
    Ok(())
}

/// Builds a one-row dataset from a `feature -> value` record, casting every
/// value into its declared type.
pub fn record_to_dataset(
    record: &HashMap<String, FeatureValue>,
    features_types: &HashMap<String, FeatureType>,
    features: &[String],
) -> Result<Dataset> {
    if let Some(unknown) = record.keys().find(|k| !features_types.contains_key(*k)) {
        return Err(PredictorError::type_mismatch(format!(
            "All features of x must be in features_types; '{}' is not.",
            unknown
        )));
    }
    let mut row = Vec::with_capacity(features.len());
    for feature in features {
        let value = record.get(feature).ok_or_else(|| {
            PredictorError::shape(format!("Feature '{}' is missing from x.", feature))
        })?;
        let ty = features_types[feature.as_str()];
        let cast = value.cast(ty).ok_or_else(|| {
            PredictorError::type_mismatch(format!(
                "Value '{}' of feature '{}' cannot be read as {}.",
                value, feature, ty
            ))
        })?;
        row.push(cast);
    }
    let values = Array2::from_shape_vec((1, features.len()), row)?;
    Dataset::new(vec!["0".to_string()], features.to_vec(), values)
}

/// The prediction must cover exactly the rows of `x`; it is returned in `x`'s
/// row order. Classification labels must be declared classes.
pub fn check_ypred(x: &Dataset, ypred: &Prediction, case: &Case) -> Result<Prediction> {
    let aligned = ypred.align_to(x.index()).map_err(|_| {
        PredictorError::shape(
            "ypred must have exactly the same row keys as x, with one prediction per row.",
        )
    })?;
    for &value in aligned.values() {
        if !value.is_finite() {
            return Err(PredictorError::invalid_input(format!(
                "ypred contains a non-finite value ({}).",
                value
            )));
        }
        if case.is_classification() && case.class_position(value).is_none() {
            return Err(PredictorError::invalid_input(format!(
                "ypred value {} is not one of the model classes.",
                value
            )));
        }
    }
    Ok(aligned)
}

pub fn check_label_dict(label_dict: Option<&HashMap<ClassLabel, String>>, case: &Case) -> Result<()> {
    let (Some(label_dict), Some(classes)) = (label_dict, case.classes()) else {
        return Ok(());
    };
    let declared: HashSet<&ClassLabel> = label_dict.keys().collect();
    let expected: HashSet<&ClassLabel> = classes.iter().collect();
    if declared != expected {
        return Err(PredictorError::config(format!(
            "label_dict keys {:?} do not match the model classes {:?}.",
            label_dict.keys().collect::<Vec<_>>(),
            classes
        )));
    }
    Ok(())
}

/// Resolves feature names, technical first, then domain names from
/// `features_dict`, into feature positions.
pub fn check_features_name(
    names: &[String],
    features: &[String],
    features_dict: &HashMap<String, String>,
) -> Result<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            features
                .iter()
                .position(|f| f == name)
                .or_else(|| {
                    features
                        .iter()
                        .position(|f| features_dict.get(f).is_some_and(|label| label == name))
                })
                .ok_or_else(|| {
                    PredictorError::config(format!(
                        "Feature '{}' is neither a technical nor a domain feature name.",
                        name
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> Vec<String> {
        vec!["Age".into(), "Sex".into()]
    }

    fn types() -> HashMap<String, FeatureType> {
        HashMap::from([
            ("Age".to_string(), FeatureType::Float64),
            ("Sex".to_string(), FeatureType::Object),
        ])
    }

    #[test]
    fn columns_follow_declared_order() -> Result<()> {
        let x = Dataset::from_rows(
            vec!["Sex".into(), "Age".into()],
            vec![vec!["male".into(), FeatureValue::Float(22.0)]],
        )?;
        let ordered = order_columns(&x, &features())?;
        assert_eq!(ordered.columns(), features().as_slice());
        assert_eq!(ordered.values()[[0, 0]], FeatureValue::Float(22.0));

        let extra = Dataset::from_rows(
            vec!["Age".into(), "Sex".into(), "Fare".into()],
            vec![vec![FeatureValue::Float(1.0), "f".into(), FeatureValue::Float(2.0)]],
        )?;
        assert!(matches!(order_columns(&extra, &features()), Err(PredictorError::ShapeMismatch(_))));
        Ok(())
    }

    #[test]
    fn declared_types_are_enforced() -> Result<()> {
        let x = Dataset::from_rows(features(), vec![vec!["old".into(), "male".into()]])?;
        assert!(matches!(
            check_feature_types(&x, &types()),
            Err(PredictorError::TypeMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn record_values_are_cast() -> Result<()> {
        let record = HashMap::from([
            ("Sex".to_string(), FeatureValue::from("female")),
            ("Age".to_string(), FeatureValue::Int(30)),
        ]);
        let x = record_to_dataset(&record, &types(), &features())?;
        assert_eq!(x.nrows(), 1);
        assert_eq!(x.values()[[0, 0]], FeatureValue::Float(30.0));
        check_feature_types(&x, &types())?;

        let unknown = HashMap::from([("Fare".to_string(), FeatureValue::Float(1.0))]);
        assert!(matches!(
            record_to_dataset(&unknown, &types(), &features()),
            Err(PredictorError::TypeMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn ypred_must_match_rows_and_classes() -> Result<()> {
        let x = Dataset::from_rows(
            features(),
            vec![
                vec![FeatureValue::Float(1.0), "a".into()],
                vec![FeatureValue::Float(2.0), "b".into()],
            ],
        )?;
        let case = Case::Classification {
            classes: vec![0, 1],
        };
        assert!(check_ypred(&x, &Prediction::from_vec(vec![1.0, 0.0]), &case).is_ok());
        assert!(matches!(
            check_ypred(&x, &Prediction::from_vec(vec![1.0]), &case),
            Err(PredictorError::ShapeMismatch(_))
        ));
        assert!(matches!(
            check_ypred(&x, &Prediction::from_vec(vec![1.0, 2.0]), &case),
            Err(PredictorError::InvalidInput(_))
        ));
        assert!(check_ypred(&x, &Prediction::from_vec(vec![1.5, 2.0]), &Case::Regression).is_ok());
        Ok(())
    }

    #[test]
    fn label_dict_must_cover_classes() {
        let case = Case::Classification {
            classes: vec![0, 1],
        };
        let full = HashMap::from([(0, "Died".to_string()), (1, "Survived".to_string())]);
        let partial = HashMap::from([(1, "Survived".to_string())]);
        assert!(check_label_dict(Some(&full), &case).is_ok());
        assert!(check_label_dict(Some(&partial), &case).is_err());
        assert!(check_label_dict(Some(&partial), &Case::Regression).is_ok());
        assert!(check_label_dict(None, &case).is_ok());
    }

    #[test]
    fn feature_names_resolve_both_ways() -> Result<()> {
        let dict = HashMap::from([("Sex".to_string(), "Gender".to_string())]);
        let hidden = check_features_name(&["Gender".into(), "Age".into()], &features(), &dict)?;
        assert_eq!(hidden, vec![1, 0]);
        assert!(check_features_name(&["Fare".into()], &features(), &dict).is_err());
        Ok(())
    }
}
