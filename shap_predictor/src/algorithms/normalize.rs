// src/algorithms/normalize.rs
//! Converts contributions handed over by the explainer (or by the user) into
//! the representation expected for the model's case.

use crate::core::{Case, NumericFrame, PredictorError, Result};
use ndarray::Array2;

/// One contribution table, labeled or bare.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContributions {
    Frame(NumericFrame),
    Array(Array2<f64>),
}

/// Contributions as supplied: a single table, or one table per class.
#[derive(Debug, Clone, PartialEq)]
pub enum ContributionInput {
    Single(RawContributions),
    PerClass(Vec<RawContributions>),
}

impl RawContributions {
    fn shape(&self) -> (usize, usize) {
        match self {
            RawContributions::Frame(f) => (f.nrows(), f.ncols()),
            RawContributions::Array(a) => a.dim(),
        }
    }

    fn negated(&self) -> RawContributions {
        match self {
            RawContributions::Frame(f) => RawContributions::Frame(f.mapv(|v| -v)),
            RawContributions::Array(a) => RawContributions::Array(a.mapv(|v| -v)),
        }
    }

    /// Labeled table aligned on the preprocessed features it explains.
    /// Bare arrays borrow the labels of `x_preprocessed`.
    pub fn into_frame(self, x_preprocessed: &NumericFrame) -> Result<NumericFrame> {
        match self {
            RawContributions::Frame(frame) => {
                frame.align_to(x_preprocessed.index(), x_preprocessed.columns())
            }
            RawContributions::Array(values) => {
                if values.dim() != (x_preprocessed.nrows(), x_preprocessed.ncols()) {
                    return Err(PredictorError::shape(format!(
                        "Contributions are {}x{}, but the preprocessed data is {}x{}.",
                        values.nrows(),
                        values.ncols(),
                        x_preprocessed.nrows(),
                        x_preprocessed.ncols()
                    )));
                }
                NumericFrame::new(
                    x_preprocessed.index().to_vec(),
                    x_preprocessed.columns().to_vec(),
                    values,
                )
            }
        }
    }
}

impl From<NumericFrame> for ContributionInput {
    fn from(frame: NumericFrame) -> Self {
        ContributionInput::Single(RawContributions::Frame(frame))
    }
}

impl From<Array2<f64>> for ContributionInput {
    fn from(values: Array2<f64>) -> Self {
        ContributionInput::Single(RawContributions::Array(values))
    }
}

impl From<Vec<NumericFrame>> for ContributionInput {
    fn from(frames: Vec<NumericFrame>) -> Self {
        ContributionInput::PerClass(frames.into_iter().map(RawContributions::Frame).collect())
    }
}

impl From<Vec<Array2<f64>>> for ContributionInput {
    fn from(arrays: Vec<Array2<f64>>) -> Self {
        ContributionInput::PerClass(arrays.into_iter().map(RawContributions::Array).collect())
    }
}

/// A binary classifier may emit contributions toward the positive class only;
/// they become `[-contributions, contributions]`.
pub fn adapt_contributions(case: &Case, contributions: ContributionInput) -> Result<ContributionInput> {
    match (case, contributions) {
        (Case::Classification { classes }, ContributionInput::Single(raw)) => {
            if classes.len() != 2 {
                return Err(PredictorError::type_mismatch(format!(
                    "A single contribution table cannot explain a classifier with {} classes; \
                     provide one table per class.",
                    classes.len()
                )));
            }
            Ok(ContributionInput::PerClass(vec![raw.negated(), raw]))
        }
        (_, contributions) => Ok(contributions),
    }
}

/// Checks the representation against the case: a list of tables, one per
/// class, for classification; a single table for regression.
pub fn check_contribution_object(case: &Case, contributions: &ContributionInput) -> Result<()> {
    match (case, contributions) {
        (Case::Regression, ContributionInput::PerClass(_)) => Err(PredictorError::type_mismatch(
            "Regression contributions must be a single table, not a list.",
        )),
        (Case::Classification { .. }, ContributionInput::Single(_)) => Err(
            PredictorError::type_mismatch("Classification contributions must be a list of tables."),
        ),
        (Case::Classification { classes }, ContributionInput::PerClass(tables)) => {
            if tables.len() != classes.len() {
                return Err(PredictorError::shape(format!(
                    "Got {} contribution tables for {} classes.",
                    tables.len(),
                    classes.len()
                )));
            }
            let first = tables.first().map(RawContributions::shape);
            if tables.iter().any(|t| Some(t.shape()) != first) {
                return Err(PredictorError::shape(
                    "Every per-class contribution table must have the same shape.",
                ));
            }
            Ok(())
        }
        (Case::Regression, ContributionInput::Single(_)) => Ok(()),
    }
}

/// `adapt_contributions` followed by `check_contribution_object`.
pub fn normalize_contributions(case: &Case, contributions: ContributionInput) -> Result<ContributionInput> {
    let adapted = adapt_contributions(case, contributions)?;
    check_contribution_object(case, &adapted)?;
    Ok(adapted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn binary() -> Case {
        Case::Classification {
            classes: vec![0, 1],
        }
    }

    #[test]
    fn binary_single_table_becomes_opposite_pair() -> Result<()> {
        let contrib = array![[0.2, -0.4], [0.1, 0.3]];
        let adapted = normalize_contributions(&binary(), contrib.clone().into())?;
        let explicit: ContributionInput = vec![-contrib.clone(), contrib].into();
        assert_eq!(adapted, explicit);
        Ok(())
    }

    #[test]
    fn multiclass_single_table_is_rejected() {
        let case = Case::Classification {
            classes: vec![0, 1, 2],
        };
        let res = normalize_contributions(&case, array![[0.1]].into());
        assert!(matches!(res, Err(PredictorError::TypeMismatch(_))));
    }

    #[test]
    fn class_count_must_match() {
        let case = Case::Classification {
            classes: vec![0, 1, 2],
        };
        let res = normalize_contributions(&case, vec![array![[0.1]], array![[0.2]]].into());
        assert!(matches!(res, Err(PredictorError::ShapeMismatch(_))));
    }

    #[test]
    fn regression_rejects_lists() {
        let res = normalize_contributions(&Case::Regression, vec![array![[0.1]]].into());
        assert!(matches!(res, Err(PredictorError::TypeMismatch(_))));
        assert!(normalize_contributions(&Case::Regression, array![[0.1]].into()).is_ok());
    }

    #[test]
    fn arrays_take_the_preprocessed_labels() -> Result<()> {
        let x = NumericFrame::new(
            vec!["p1".into(), "p2".into()],
            vec!["a".into(), "b".into()],
            array![[1.0, 2.0], [3.0, 4.0]],
        )?;
        let frame = RawContributions::Array(array![[0.1, 0.2], [0.3, 0.4]]).into_frame(&x)?;
        assert_eq!(frame.index(), x.index());
        assert_eq!(frame.columns(), x.columns());

        let wrong = RawContributions::Array(array![[0.1, 0.2]]).into_frame(&x);
        assert!(matches!(wrong, Err(PredictorError::ShapeMismatch(_))));
        Ok(())
    }
}
