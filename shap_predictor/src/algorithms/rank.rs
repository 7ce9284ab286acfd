// src/algorithms/rank.rs
use crate::core::{Dataset, FeatureValue, NumericFrame, PredictorError, Result, RowKey};
use ndarray::Array2;
use std::cmp::Ordering;

/// Contributions reordered per row by decreasing magnitude. Column `j` of each
/// table means "rank `j`", not a fixed feature.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedContributions {
    pub index: Vec<RowKey>,
    /// Contribution values in rank order.
    pub contrib_sorted: Array2<f64>,
    /// Feature values in rank order.
    pub x_sorted: Array2<FeatureValue>,
    /// Position of the original feature (in `x` column order) at each rank.
    pub var_dict: Array2<usize>,
}

impl RankedContributions {
    pub fn shape(&self) -> (usize, usize) {
        self.contrib_sorted.dim()
    }
}

/// Magnitude used for ordering; NaN contributions rank last.
fn magnitude(v: f64) -> f64 {
    if v.is_nan() {
        -1.0
    } else {
        v.abs()
    }
}

/// Feature positions of one row by decreasing absolute contribution.
/// The sort is stable, so ties keep the original column order.
pub fn rank_row(contributions: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..contributions.len()).collect();
    order.sort_by(|&a, &b| {
        magnitude(contributions[b])
            .partial_cmp(&magnitude(contributions[a]))
            .unwrap_or(Ordering::Equal)
    });
    order
}

pub fn rank_contributions(contributions: &NumericFrame, x: &Dataset) -> Result<RankedContributions> {
    if contributions.index() != x.index() || contributions.columns() != x.columns() {
        return Err(PredictorError::shape(
            "Contributions and dataset must share rows and columns to be ranked.",
        ));
    }
    let (nrows, ncols) = (contributions.nrows(), contributions.ncols());
    let mut contrib_sorted = Array2::<f64>::zeros((nrows, ncols));
    let mut x_sorted = Array2::from_elem((nrows, ncols), FeatureValue::Missing);
    let mut var_dict = Array2::<usize>::zeros((nrows, ncols));

    for i in 0..nrows {
        let row = contributions.row(i).to_vec();
        for (rank, &feature) in rank_row(&row).iter().enumerate() {
            contrib_sorted[[i, rank]] = row[feature];
            x_sorted[[i, rank]] = x.values()[[i, feature]].clone();
            var_dict[[i, rank]] = feature;
        }
    }

    Ok(RankedContributions {
        index: contributions.index().to_vec(),
        contrib_sorted,
        x_sorted,
        var_dict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn ties_keep_column_order() {
        // A, B, C, D
        assert_eq!(rank_row(&[0.5, -0.8, 0.5, 0.1]), vec![1, 0, 2, 3]);
    }

    #[test]
    fn nan_ranks_last() {
        assert_eq!(rank_row(&[f64::NAN, 0.0, -0.2]), vec![2, 1, 0]);
    }

    #[test]
    fn ranks_every_table_consistently() -> Result<()> {
        let columns = vec!["Age".to_string(), "Sex".to_string()];
        let contrib = NumericFrame::from_rows(
            columns.clone(),
            vec![vec![0.3, -0.1], vec![0.2, 0.4], vec![-0.5, 0.5]],
        )?;
        let x = Dataset::from_rows(
            columns,
            vec![
                vec![FeatureValue::Int(22), "male".into()],
                vec![FeatureValue::Int(38), "female".into()],
                vec![FeatureValue::Int(26), "female".into()],
            ],
        )?;
        let ranked = rank_contributions(&contrib, &x)?;
        assert_eq!(ranked.var_dict, array![[0, 1], [1, 0], [0, 1]]);
        assert_eq!(ranked.contrib_sorted, array![[0.3, -0.1], [0.4, 0.2], [-0.5, 0.5]]);
        assert_eq!(ranked.x_sorted[[1, 0]], FeatureValue::from("female"));
        assert_eq!(ranked.x_sorted[[1, 1]], FeatureValue::Int(38));
        Ok(())
    }
}
