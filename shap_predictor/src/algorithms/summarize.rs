// src/algorithms/summarize.rs
use crate::algorithms::mask::Mask;
use crate::algorithms::rank::RankedContributions;
use crate::algorithms::select::{PredictedValue, PredictionOutput};
use crate::core::{FeatureValue, PredictorError, Result, RowKey};
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// One kept contribution of a row: (feature label, value, contribution).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub feature: String,
    pub value: FeatureValue,
    pub contribution: f64,
}

/// Per-row top contributions next to the prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub prediction: PredictionOutput,
    /// Number of (feature, value, contribution) slots per row.
    pub width: usize,
    /// `width` slots per row, `None` where fewer contributions survived.
    pub rows: Vec<Vec<Option<SummaryEntry>>>,
}

impl Summary {
    pub fn index(&self) -> &[RowKey] {
        &self.prediction.index
    }

    /// Kept entry of `row` at 1-based `rank`.
    pub fn entry(&self, row: usize, rank: usize) -> Option<&SummaryEntry> {
        self.rows.get(row)?.get(rank.checked_sub(1)?)?.as_ref()
    }

    /// Flat column names: prediction columns, then
    /// `feature_i, value_i, contribution_i` for `i = 1..=width`.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = self.prediction.columns();
        for i in 1..=self.width {
            columns.push(format!("feature_{}", i));
            columns.push(format!("value_{}", i));
            columns.push(format!("contribution_{}", i));
        }
        columns
    }

    /// One JSON object per row keyed by `columns()`, `null` in empty slots.
    pub fn records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, slots)| {
                let mut record = Map::new();
                let ypred = self.prediction.ypred.get(i).map_or(Value::Null, predicted_json);
                record.insert("ypred".into(), ypred);
                if let Some(proba) = &self.prediction.proba {
                    record.insert("proba".into(), proba.get(i).copied().map_or(Value::Null, Value::from));
                }
                for (rank, slot) in slots.iter().enumerate() {
                    let (feature, value, contribution) = match slot {
                        Some(e) => (
                            Value::String(e.feature.clone()),
                            feature_json(&e.value),
                            Value::from(e.contribution),
                        ),
                        None => (Value::Null, Value::Null, Value::Null),
                    };
                    record.insert(format!("feature_{}", rank + 1), feature);
                    record.insert(format!("value_{}", rank + 1), value);
                    record.insert(format!("contribution_{}", rank + 1), contribution);
                }
                Value::Object(record)
            })
            .collect()
    }
}

fn predicted_json(value: &PredictedValue) -> Value {
    match value {
        PredictedValue::Value(v) => Value::from(*v),
        PredictedValue::Class(c) => Value::from(*c),
        PredictedValue::Label(l) => Value::String(l.clone()),
    }
}

fn feature_json(value: &FeatureValue) -> Value {
    match value {
        FeatureValue::Bool(b) => Value::Bool(*b),
        FeatureValue::Int(v) => Value::from(*v),
        FeatureValue::Float(v) => Value::from(*v),
        FeatureValue::Text(s) => Value::String(s.clone()),
        FeatureValue::Missing => Value::Null,
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        for (i, slots) in self.rows.iter().enumerate() {
            write!(f, "  Row {}:", self.index().get(i).map_or("?", String::as_str))?;
            if let Some(ypred) = self.prediction.ypred.get(i) {
                write!(f, " prediction {}", ypred)?;
            }
            if let Some(p) = self.prediction.proba.as_ref().and_then(|p| p.get(i)) {
                write!(f, " (proba {:.4})", p)?;
            }
            writeln!(f)?;
            for (rank, entry) in slots.iter().enumerate() {
                if let Some(e) = entry {
                    writeln!(
                        f,
                        "    {}. {} = {}: {:.4}",
                        rank + 1,
                        e.feature,
                        e.value,
                        e.contribution
                    )?;
                }
            }
        }
        Ok(())
    }
}

/// Projects ranked contributions through the mask. `features` gives the
/// technical name of each feature position; `features_dict` turns it into a
/// domain label when an entry exists.
pub fn summarize(
    ranked: &RankedContributions,
    mask: &Mask,
    features: &[String],
    features_dict: &HashMap<String, String>,
    prediction: PredictionOutput,
) -> Result<Summary> {
    if mask.dim() != ranked.shape() {
        return Err(PredictorError::shape(
            "Mask and ranked contributions have different shapes.",
        ));
    }
    if prediction.index != ranked.index {
        return Err(PredictorError::shape(
            "Predictions and contributions do not share the same row keys.",
        ));
    }

    let mut kept_rows = Vec::with_capacity(mask.nrows());
    for (i, keep) in mask.rows().into_iter().enumerate() {
        let mut kept = Vec::new();
        for (rank, &k) in keep.iter().enumerate() {
            if !k {
                continue;
            }
            let position = ranked.var_dict[[i, rank]];
            let technical = features.get(position).ok_or_else(|| {
                PredictorError::shape(format!("No feature name for position {}.", position))
            })?;
            let label = features_dict.get(technical).unwrap_or(technical);
            kept.push(SummaryEntry {
                feature: label.clone(),
                value: ranked.x_sorted[[i, rank]].clone(),
                contribution: ranked.contrib_sorted[[i, rank]],
            });
        }
        kept_rows.push(kept);
    }

    let width = kept_rows.iter().map(Vec::len).max().unwrap_or(0);
    if kept_rows.iter().any(Vec::is_empty) && !kept_rows.is_empty() {
        warn!("mask parameters leave at least one row without any contribution");
    }
    let rows = kept_rows
        .into_iter()
        .map(|kept| {
            let mut slots: Vec<Option<SummaryEntry>> = kept.into_iter().map(Some).collect();
            slots.resize(width, None);
            slots
        })
        .collect();

    Ok(Summary {
        prediction,
        width,
        rows,
    })
}
