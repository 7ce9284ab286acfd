// src/lib.rs

//! `shap_predictor` explains the predictions of a trained model on new data:
//! it reconciles SHAP contributions with the preprocessing used before the
//! model, then summarizes the top contributing features of every prediction.

// Declare the main modules of the crate
pub mod algorithms;
pub mod core;
pub mod predictor;
pub mod traits;
pub mod utils;

// Re-export key components for easier use by library consumers
pub use crate::algorithms::{
    ContributionInput, Mask, PredictedValue, PredictionOutput, RawContributions, Summary,
    SummaryEntry,
};
pub use crate::core::{
    Case, ClassLabel, Dataset, FeatureType, FeatureValue, Frame, MaskParams, NumericFrame,
    Prediction, PredictorConfig, PredictorError, Result, RowKey,
};
pub use crate::predictor::{DatasetInput, DetailedContributions, NewInput, SmartPredictor, Stage};
pub use crate::traits::{Explainer, PredictModel, Preprocessing};
