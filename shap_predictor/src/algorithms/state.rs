// src/algorithms/state.rs
//! Single-table vs per-class behavior. Every operation is written once for a
//! single table; the per-class variant applies it to each class's table.

use crate::algorithms::normalize::ContributionInput;
use crate::algorithms::reconcile::inverse_transform_contributions;
use crate::core::{Case, Dataset, NumericFrame, Prediction, PredictorError, Result};
use crate::traits::Preprocessing;
use ndarray::Array2;

#[derive(Debug, Clone, PartialEq)]
pub enum ContributionState {
    Single(NumericFrame),
    PerClass(Vec<NumericFrame>),
}

impl ContributionState {
    /// Chooses the variant from the input's shape and labels every table
    /// after the preprocessed data it explains.
    pub fn validate(contributions: ContributionInput, x_preprocessed: &NumericFrame) -> Result<Self> {
        match contributions {
            ContributionInput::Single(raw) => {
                Ok(ContributionState::Single(raw.into_frame(x_preprocessed)?))
            }
            ContributionInput::PerClass(tables) => tables
                .into_iter()
                .map(|raw| raw.into_frame(x_preprocessed))
                .collect::<Result<Vec<_>>>()
                .map(ContributionState::PerClass),
        }
    }

    pub fn is_per_class(&self) -> bool {
        matches!(self, ContributionState::PerClass(_))
    }

    fn try_map<F>(self, f: F) -> Result<Self>
    where
        F: Fn(&NumericFrame) -> Result<NumericFrame>,
    {
        match self {
            ContributionState::Single(frame) => Ok(ContributionState::Single(f(&frame)?)),
            ContributionState::PerClass(frames) => frames
                .iter()
                .map(f)
                .collect::<Result<Vec<_>>>()
                .map(ContributionState::PerClass),
        }
    }

    fn tables(&self) -> &[NumericFrame] {
        match self {
            ContributionState::Single(frame) => std::slice::from_ref(frame),
            ContributionState::PerClass(frames) => frames,
        }
    }

    pub fn inverse_transform(
        self,
        preprocessing: Option<&dyn Preprocessing>,
        original_columns: &[String],
    ) -> Result<Self> {
        self.try_map(|frame| inverse_transform_contributions(frame, preprocessing, original_columns))
    }

    /// Every table must have exactly the rows and columns of `x`, in order.
    pub fn check_shape(&self, x: &Dataset) -> Result<()> {
        for frame in self.tables() {
            if frame.index() != x.index() || frame.columns() != x.columns() {
                return Err(PredictorError::shape(
                    "Prediction set and contributions should have exactly the same rows and columns, \
                     in the same order. Please check x, contributions and preprocessing arguments.",
                ));
            }
        }
        Ok(())
    }

    /// Collapses to one table: per-class contributions keep, for each row, the
    /// table of the class predicted for that row.
    pub fn select(self, ypred: &Prediction, case: &Case) -> Result<NumericFrame> {
        let frames = match self {
            ContributionState::Single(frame) => return Ok(frame),
            ContributionState::PerClass(frames) => frames,
        };
        let first = frames
            .first()
            .ok_or_else(|| PredictorError::shape("No per-class contribution table."))?;
        if ypred.index() != first.index() {
            return Err(PredictorError::shape(
                "Predictions and contributions do not share the same row keys.",
            ));
        }
        let mut selected = Array2::<f64>::zeros((first.nrows(), first.ncols()));
        for (i, &label) in ypred.values().iter().enumerate() {
            let class = class_position(case, label)?;
            let table = frames.get(class).ok_or_else(|| {
                PredictorError::shape(format!("No contribution table for class rank {}.", class))
            })?;
            selected.row_mut(i).assign(&table.row(i));
        }
        NumericFrame::new(first.index().to_vec(), first.columns().to_vec(), selected)
    }
}

pub(crate) fn class_position(case: &Case, label: f64) -> Result<usize> {
    case.class_position(label).ok_or_else(|| {
        PredictorError::invalid_input(format!(
            "Predicted value {} is not one of the model classes.",
            label
        ))
    })
}
