// src/algorithms/reconcile.rs
//! Maps contributions computed on encoded columns back onto the original
//! features: every original feature receives the sum of the contributions of
//! the encoded columns it expanded into.

use crate::core::{NumericFrame, PredictorError, Result};
use crate::traits::Preprocessing;
use ndarray::{Array2, Axis};
use std::collections::{HashMap, HashSet};

pub fn inverse_transform_contributions(
    contributions: &NumericFrame,
    preprocessing: Option<&dyn Preprocessing>,
    original_columns: &[String],
) -> Result<NumericFrame> {
    match preprocessing {
        Some(p) => sum_encoded_columns(contributions, &p.encoded_columns(), original_columns),
        None => Ok(contributions.clone()),
    }
}

/// Sums encoded columns onto their original feature, in `original_columns` order.
pub fn sum_encoded_columns(
    contributions: &NumericFrame,
    encoded_columns: &HashMap<String, Vec<String>>,
    original_columns: &[String],
) -> Result<NumericFrame> {
    let mut reconciled = Array2::<f64>::zeros((contributions.nrows(), original_columns.len()));
    let mut used = HashSet::with_capacity(contributions.ncols());

    for (j, feature) in original_columns.iter().enumerate() {
        let identity = std::slice::from_ref(feature);
        let encoded = encoded_columns
            .get(feature)
            .map(Vec::as_slice)
            .unwrap_or(identity);
        if encoded.is_empty() {
            return Err(PredictorError::reconciliation(format!(
                "Feature '{}' maps to no encoded column.",
                feature
            )));
        }
        let mut target = reconciled.column_mut(j);
        for name in encoded {
            let pos = contributions.column_position(name).ok_or_else(|| {
                PredictorError::reconciliation(format!(
                    "Encoded column '{}' of feature '{}' is absent from the contributions.",
                    name, feature
                ))
            })?;
            if !used.insert(pos) {
                return Err(PredictorError::reconciliation(format!(
                    "Encoded column '{}' is claimed by more than one feature.",
                    name
                )));
            }
            target += &contributions.values().index_axis(Axis(1), pos);
        }
    }

    if used.len() != contributions.ncols() {
        let orphans: Vec<&str> = contributions
            .columns()
            .iter()
            .enumerate()
            .filter(|(pos, _)| !used.contains(pos))
            .map(|(_, name)| name.as_str())
            .collect();
        return Err(PredictorError::reconciliation(format!(
            "Contribution columns {:?} belong to no original feature.",
            orphans
        )));
    }

    NumericFrame::new(
        contributions.index().to_vec(),
        original_columns.to_vec(),
        reconciled,
    )
}
