// src/utils/transform.rs
use crate::core::{BoxError, Dataset, NumericFrame, PredictorError, Result};
use crate::traits::Preprocessing;
use log::debug;

/// Numeric view of `x`, used when no preprocessing is configured.
pub fn to_numeric(x: &Dataset) -> std::result::Result<NumericFrame, BoxError> {
    let mut values = ndarray::Array2::<f64>::zeros((x.nrows(), x.ncols()));
    for ((i, j), cell) in x.values().indexed_iter() {
        values[[i, j]] = cell.as_f64().ok_or_else(|| {
            format!(
                "feature '{}' holds the non-numeric value '{}'",
                x.columns()[j],
                cell
            )
        })?;
    }
    Ok(NumericFrame::new(x.index().to_vec(), x.columns().to_vec(), values)?)
}

/// Runs the preprocessing on `x`. Any failure inside the transform is reported
/// as a configuration error carrying the original failure.
pub fn apply_preprocessing(x: &Dataset, preprocessing: Option<&dyn Preprocessing>) -> Result<NumericFrame> {
    let outcome = match preprocessing {
        Some(p) => p.transform(x),
        None => to_numeric(x),
    };
    let x_preprocessed = outcome.map_err(|e| {
        PredictorError::config_caused_by(
            "Preprocessing has failed. The preprocessing specified or the dataset doesn't match.",
            e,
        )
    })?;
    if x_preprocessed.index() != x.index() {
        return Err(PredictorError::shape(
            "Preprocessing must keep the row keys of x, in the same order.",
        ));
    }
    debug!(
        "preprocessed {} rows: {} features -> {} columns",
        x.nrows(),
        x.ncols(),
        x_preprocessed.ncols()
    );
    Ok(x_preprocessed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FeatureValue;
    use std::error::Error as _;

    #[test]
    fn identity_needs_numeric_values() -> Result<()> {
        let x = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![FeatureValue::Int(1), FeatureValue::Bool(true)]],
        )?;
        let numeric = apply_preprocessing(&x, None)?;
        assert_eq!(numeric.values()[[0, 1]], 1.0);

        let text = Dataset::from_rows(vec!["a".into()], vec![vec!["x".into()]])?;
        let err = apply_preprocessing(&text, None).unwrap_err();
        assert!(matches!(err, PredictorError::Config { .. }));
        assert!(err.source().is_some());
        Ok(())
    }
}
