// src/traits.rs
//! Seams to the collaborators the predictor does not implement itself:
//! the trained model, the fitted explainer and the preprocessing pipeline.

use crate::algorithms::ContributionInput;
use crate::core::{BoxError, Case, ClassLabel, Dataset, NumericFrame, PredictorError, Result};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// A trained model evaluated on preprocessed features.
pub trait PredictModel {
    /// One prediction per row of `x` (class label or regression target).
    fn predict(&self, x: &NumericFrame) -> Result<Array1<f64>>;

    /// Number of preprocessed features the model was trained on.
    fn num_features(&self) -> usize;

    /// Declared classes, in the order used by `predict_proba` and by per-class
    /// contributions. `None` means the model is a regressor.
    fn classes(&self) -> Option<Vec<ClassLabel>> {
        None
    }

    /// Per-class probabilities, one column per entry of `classes()`.
    fn predict_proba(&self, _x: &NumericFrame) -> Result<Array2<f64>> {
        Err(PredictorError::config("model has no predict_proba method"))
    }
}

/// A fitted SHAP-style explainer, used as a black box.
pub trait Explainer {
    /// Raw contributions for every row of `x`: one table for a regressor, or
    /// one per class for a classifier.
    fn compute(&self, x: &NumericFrame) -> Result<ContributionInput>;

    /// Whether this explainer can explain a model of the given case.
    fn supports(&self, _case: &Case) -> bool {
        true
    }
}

/// Preprocessing applied to raw data before the model sees it.
pub trait Preprocessing {
    fn transform(&self, x: &Dataset) -> std::result::Result<NumericFrame, BoxError>;

    /// Original feature name to the encoded columns it expands into.
    /// Features absent from the map keep their own name as single column.
    fn encoded_columns(&self) -> HashMap<String, Vec<String>>;
}
