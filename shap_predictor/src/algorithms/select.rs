// src/algorithms/select.rs
use crate::algorithms::state::{class_position, ContributionState};
use crate::core::{Case, ClassLabel, NumericFrame, Prediction, PredictorError, Result, RowKey};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A prediction as displayed next to its explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictedValue {
    /// Regression target.
    Value(f64),
    /// Class label without a domain name.
    Class(ClassLabel),
    /// Domain name of the class, from `label_dict`.
    Label(String),
}

impl fmt::Display for PredictedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictedValue::Value(v) => write!(f, "{:.4}", v),
            PredictedValue::Class(c) => write!(f, "{}", c),
            PredictedValue::Label(l) => f.write_str(l),
        }
    }
}

/// Predictions, plus the probability of the predicted class for classifiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutput {
    pub index: Vec<RowKey>,
    pub ypred: Vec<PredictedValue>,
    pub proba: Option<Vec<f64>>,
}

impl PredictionOutput {
    /// Leading column names: `ypred`, then `proba` when available.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec!["ypred".to_string()];
        if self.proba.is_some() {
            columns.push("proba".to_string());
        }
        columns
    }
}

/// Keeps, for each row, the contributions and probability of the predicted class.
pub fn keep_right_contributions(
    ypred: &Prediction,
    contributions: ContributionState,
    case: &Case,
    label_dict: Option<&HashMap<ClassLabel, String>>,
    proba_values: Option<&NumericFrame>,
) -> Result<(PredictionOutput, NumericFrame)> {
    let matched = contributions.select(ypred, case)?;

    let output = match case {
        Case::Regression => PredictionOutput {
            index: ypred.index().to_vec(),
            ypred: ypred.values().iter().map(|&v| PredictedValue::Value(v)).collect(),
            proba: None,
        },
        Case::Classification { classes } => {
            let proba_values = proba_values.ok_or_else(|| {
                PredictorError::config("Classification output needs predicted probabilities.")
            })?;
            if proba_values.index() != ypred.index() || proba_values.ncols() != classes.len() {
                return Err(PredictorError::shape(format!(
                    "Probabilities are {}x{}, expected one row per prediction and {} classes.",
                    proba_values.nrows(),
                    proba_values.ncols(),
                    classes.len()
                )));
            }
            let mut labels = Vec::with_capacity(ypred.len());
            let mut proba = Vec::with_capacity(ypred.len());
            for (i, &value) in ypred.values().iter().enumerate() {
                let pos = class_position(case, value)?;
                let class = classes[pos];
                proba.push(proba_values.values()[[i, pos]]);
                labels.push(match label_dict.and_then(|d| d.get(&class)) {
                    Some(name) => PredictedValue::Label(name.clone()),
                    None => PredictedValue::Class(class),
                });
            }
            PredictionOutput {
                index: ypred.index().to_vec(),
                ypred: labels,
                proba: Some(proba),
            }
        }
    };
    Ok((output, matched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn proba() -> NumericFrame {
        NumericFrame::from_rows(
            vec!["class_0".into(), "class_1".into()],
            vec![vec![0.8, 0.2], vec![0.35, 0.65]],
        )
        .unwrap()
    }

    #[test]
    fn regression_passes_through() -> Result<()> {
        let contrib = NumericFrame::from_rows(vec!["a".into()], vec![vec![0.1], vec![0.2]])?;
        let ypred = Prediction::from_vec(vec![10.0, 12.5]);
        let (out, matched) = keep_right_contributions(
            &ypred,
            ContributionState::Single(contrib.clone()),
            &Case::Regression,
            None,
            None,
        )?;
        assert_eq!(matched, contrib);
        assert_eq!(out.ypred, vec![PredictedValue::Value(10.0), PredictedValue::Value(12.5)]);
        assert_eq!(out.columns(), vec!["ypred"]);
        Ok(())
    }

    #[test]
    fn classification_matches_probability_and_label() -> Result<()> {
        let case = Case::Classification {
            classes: vec![0, 1],
        };
        let positive = NumericFrame::from_rows(vec!["a".into()], vec![vec![0.1], vec![0.4]])?;
        let negative = positive.mapv(|v| -v);
        let labels = HashMap::from([(1, "Survived".to_string())]);
        let (out, matched) = keep_right_contributions(
            &Prediction::from_vec(vec![0.0, 1.0]),
            ContributionState::PerClass(vec![negative, positive]),
            &case,
            Some(&labels),
            Some(&proba()),
        )?;
        assert_eq!(out.proba, Some(vec![0.8, 0.65]));
        assert_eq!(
            out.ypred,
            vec![PredictedValue::Class(0), PredictedValue::Label("Survived".into())]
        );
        assert_eq!(matched.values(), &array![[-0.1], [0.4]]);
        assert_eq!(out.columns(), vec!["ypred", "proba"]);
        Ok(())
    }

    #[test]
    fn classification_requires_probabilities() {
        let case = Case::Classification {
            classes: vec![0, 1],
        };
        let table = NumericFrame::from_rows(vec!["a".into()], vec![vec![0.1]]).unwrap();
        let res = keep_right_contributions(
            &Prediction::from_vec(vec![1.0]),
            ContributionState::PerClass(vec![table.clone(), table]),
            &case,
            None,
            None,
        );
        assert!(matches!(res, Err(PredictorError::Config { .. })));
    }
}
