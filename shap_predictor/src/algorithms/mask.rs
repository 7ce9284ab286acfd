// src/algorithms/mask.rs
//! Boolean keep-masks over ranked contributions (`true` = keep).

use crate::algorithms::rank::RankedContributions;
use crate::core::{MaskParams, NumericFrame, PredictorError, Result};
use ndarray::{Array2, Zip};

pub type Mask = Array2<bool>;

pub fn init_mask(shape: (usize, usize), value: bool) -> Mask {
    Array2::from_elem(shape, value)
}

/// Hides every rank holding one of the given feature positions.
pub fn hide_contributions(var_dict: &Array2<usize>, features: &[usize]) -> Mask {
    var_dict.mapv(|feature| !features.contains(&feature))
}

/// Keeps contributions whose magnitude reaches the threshold (boundary kept).
pub fn cap_contributions(contrib_sorted: &Array2<f64>, threshold: f64) -> Mask {
    contrib_sorted.mapv(|v| v.abs() >= threshold)
}

/// Keeps strictly positive contributions, or strictly negative ones.
pub fn sign_contributions(contrib_sorted: &Array2<f64>, positive: bool) -> Mask {
    if positive {
        contrib_sorted.mapv(|v| v > 0.0)
    } else {
        contrib_sorted.mapv(|v| v < 0.0)
    }
}

/// Element-wise AND of all masks.
pub fn combine_masks(masks: &[Mask]) -> Result<Mask> {
    let (first, rest) = masks
        .split_first()
        .ok_or_else(|| PredictorError::invalid_input("No mask to combine."))?;
    let mut combined = first.clone();
    for mask in rest {
        if mask.dim() != combined.dim() {
            return Err(PredictorError::shape(format!(
                "Cannot combine a {:?} mask with a {:?} mask.",
                mask.dim(),
                combined.dim()
            )));
        }
        Zip::from(&mut combined).and(mask).for_each(|c, &m| *c = *c && m);
    }
    Ok(combined)
}

/// Per row, keeps only the first `k` kept ranks.
pub fn cutoff_contributions(mask: &Mask, k: usize) -> Mask {
    let mut cut = mask.clone();
    for mut row in cut.rows_mut() {
        let mut kept = 0;
        for cell in row.iter_mut() {
            if *cell {
                kept += 1;
                if kept > k {
                    *cell = false;
                }
            }
        }
    }
    cut
}

/// Final mask for the given parameters. `hidden` holds the feature positions
/// resolved from `features_to_hide`.
pub fn build_mask(ranked: &RankedContributions, params: &MaskParams, hidden: &[usize]) -> Result<Mask> {
    let mut masks = vec![init_mask(ranked.shape(), true)];
    if params.features_to_hide.is_some() {
        masks.push(hide_contributions(&ranked.var_dict, hidden));
    }
    if let Some(threshold) = params.threshold {
        masks.push(cap_contributions(&ranked.contrib_sorted, threshold));
    }
    if let Some(positive) = params.positive {
        masks.push(sign_contributions(&ranked.contrib_sorted, positive));
    }
    let mask = combine_masks(&masks)?;
    Ok(match params.max_contrib {
        Some(k) => cutoff_contributions(&mask, k),
        None => mask,
    })
}

/// Sums, per row, the hidden negative and hidden positive contributions.
pub fn compute_masked_contributions(ranked: &RankedContributions, mask: &Mask) -> Result<NumericFrame> {
    if mask.dim() != ranked.shape() {
        return Err(PredictorError::shape(
            "Mask and ranked contributions have different shapes.",
        ));
    }
    let mut totals = Array2::<f64>::zeros((mask.nrows(), 2));
    Zip::indexed(&ranked.contrib_sorted)
        .and(mask)
        .for_each(|(i, _), &v, &keep| {
            if !keep && v < 0.0 {
                totals[[i, 0]] += v;
            } else if !keep && v > 0.0 {
                totals[[i, 1]] += v;
            }
        });
    NumericFrame::new(
        ranked.index.clone(),
        vec!["masked_neg".to_string(), "masked_pos".to_string()],
        totals,
    )
}
