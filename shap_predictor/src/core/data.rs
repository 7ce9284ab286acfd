// src/core/data.rs
use crate::core::{PredictorError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Identifier of an observation (the row key of every table).
pub type RowKey = String;

/// Class label of a classification model.
pub type ClassLabel = i64;

/// Declared type of an original feature, spelled the way pandas names dtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "float64")]
    Float64,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "object", alias = "string")]
    Object,
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureType::Int64 => "int64",
            FeatureType::Float64 => "float64",
            FeatureType::Bool => "bool",
            FeatureType::Object => "object",
        };
        f.write_str(name)
    }
}

/// A single cell of the raw (not preprocessed) dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl FeatureValue {
    /// Whether the value can live in a column of the declared type.
    /// `object` columns hold anything; missing values only fit float and object.
    pub fn matches(&self, ty: FeatureType) -> bool {
        match (self, ty) {
            (_, FeatureType::Object) => true,
            (FeatureValue::Int(_), FeatureType::Int64) => true,
            (FeatureValue::Float(_), FeatureType::Float64) => true,
            (FeatureValue::Missing, FeatureType::Float64) => true,
            (FeatureValue::Bool(_), FeatureType::Bool) => true,
            _ => false,
        }
    }

    /// Lossless cast into the declared type, `None` when it is not possible.
    pub fn cast(&self, ty: FeatureType) -> Option<FeatureValue> {
        if self.matches(ty) {
            return Some(self.clone());
        }
        match (self, ty) {
            (FeatureValue::Bool(b), FeatureType::Int64) => Some(FeatureValue::Int(i64::from(*b))),
            (FeatureValue::Float(v), FeatureType::Int64)
                if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 =>
            {
                Some(FeatureValue::Int(*v as i64))
            }
            (FeatureValue::Text(s), FeatureType::Int64) => s.trim().parse().ok().map(FeatureValue::Int),
            (FeatureValue::Int(v), FeatureType::Float64) => Some(FeatureValue::Float(*v as f64)),
            (FeatureValue::Bool(b), FeatureType::Float64) => {
                Some(FeatureValue::Float(if *b { 1.0 } else { 0.0 }))
            }
            (FeatureValue::Text(s), FeatureType::Float64) => {
                s.trim().parse().ok().map(FeatureValue::Float)
            }
            (FeatureValue::Int(0), FeatureType::Bool) => Some(FeatureValue::Bool(false)),
            (FeatureValue::Int(1), FeatureType::Bool) => Some(FeatureValue::Bool(true)),
            (FeatureValue::Text(s), FeatureType::Bool) => match s.trim() {
                "true" | "True" => Some(FeatureValue::Bool(true)),
                "false" | "False" => Some(FeatureValue::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Numeric view used when no preprocessing is configured.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FeatureValue::Int(v) => Some(*v as f64),
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Missing => Some(f64::NAN),
            FeatureValue::Text(_) => None,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Bool(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Bool(b) => write!(f, "{}", b),
            FeatureValue::Int(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Text(s) => f.write_str(s),
            FeatureValue::Missing => f.write_str("NaN"),
        }
    }
}

/// A labeled 2-D table: row keys, named columns and a dense body.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<T> {
    index: Vec<RowKey>,
    columns: Vec<String>,
    values: Array2<T>,
}

/// Raw observations, one typed value per original feature.
pub type Dataset = Frame<FeatureValue>;

/// Numeric table: preprocessed features, contributions or probabilities.
pub type NumericFrame = Frame<f64>;

impl<T: Clone> Frame<T> {
    pub fn new(index: Vec<RowKey>, columns: Vec<String>, values: Array2<T>) -> Result<Self> {
        if values.nrows() != index.len() || values.ncols() != columns.len() {
            return Err(PredictorError::shape(format!(
                "Table body is {}x{}, but {} row keys and {} column names were given.",
                values.nrows(),
                values.ncols(),
                index.len(),
                columns.len()
            )));
        }
        check_unique(&index, "row key")?;
        check_unique(&columns, "column")?;
        Ok(Frame {
            index,
            columns,
            values,
        })
    }

    /// Builds a table from row vectors with a default `0..n` index.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<T>>) -> Result<Self> {
        let ncols = columns.len();
        let nrows = rows.len();
        let index = (0..nrows).map(|i| i.to_string()).collect();
        let mut flat = Vec::with_capacity(nrows * ncols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != ncols {
                return Err(PredictorError::shape(format!(
                    "Row {} has {} values, expected {}.",
                    i,
                    row.len(),
                    ncols
                )));
            }
            flat.extend(row);
        }
        let values = Array2::from_shape_vec((nrows, ncols), flat)?;
        Frame::new(index, columns, values)
    }

    pub fn index(&self) -> &[RowKey] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<T> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, T> {
        self.values.row(i)
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Same body, element-wise mapped.
    pub fn mapv<U: Clone, F: Fn(T) -> U>(&self, f: F) -> Frame<U> {
        Frame {
            index: self.index.clone(),
            columns: self.columns.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Reorders rows and columns to the given labels. Both label sets must be
    /// exactly the ones this table already carries.
    pub fn align_to(&self, index: &[RowKey], columns: &[String]) -> Result<Self> {
        let row_pos = positions(&self.index, index, "row keys")?;
        let col_pos = positions(&self.columns, columns, "columns")?;
        let values = self
            .values
            .select(Axis(0), &row_pos)
            .select(Axis(1), &col_pos);
        Ok(Frame {
            index: index.to_vec(),
            columns: columns.to_vec(),
            values,
        })
    }
}

fn check_unique(labels: &[String], what: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(PredictorError::shape(format!(
                "Duplicate {} '{}'.",
                what, label
            )));
        }
    }
    Ok(())
}

/// Position in `have` of each label of `want`; fails unless both are the same set.
fn positions(have: &[String], want: &[String], what: &str) -> Result<Vec<usize>> {
    if have.len() != want.len() {
        return Err(PredictorError::shape(format!(
            "Expected {} {}, found {}.",
            want.len(),
            what,
            have.len()
        )));
    }
    let lookup: HashMap<&str, usize> = have
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();
    want.iter()
        .map(|label| {
            lookup.get(label.as_str()).copied().ok_or_else(|| {
                PredictorError::shape(format!("Missing {} entry '{}'.", what, label))
            })
        })
        .collect()
}

/// Model output aligned by row key with the explained dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    index: Vec<RowKey>,
    values: Array1<f64>,
}

impl Prediction {
    pub fn new(index: Vec<RowKey>, values: Array1<f64>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(PredictorError::shape(format!(
                "Prediction has {} values for {} row keys.",
                values.len(),
                index.len()
            )));
        }
        check_unique(&index, "row key")?;
        Ok(Prediction { index, values })
    }

    /// Predictions with a default `0..n` index.
    pub fn from_vec(values: Vec<f64>) -> Self {
        let index = (0..values.len()).map(|i| i.to_string()).collect();
        Prediction {
            index,
            values: Array1::from(values),
        }
    }

    pub fn index(&self) -> &[RowKey] {
        &self.index
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reorders the predictions to follow `index`; the key sets must match.
    pub fn align_to(&self, index: &[RowKey]) -> Result<Self> {
        let pos = positions(&self.index, index, "prediction row keys")?;
        Ok(Prediction {
            index: index.to_vec(),
            values: self.values.select(Axis(0), &pos),
        })
    }
}

/// Kind of problem the model solves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Case {
    Regression,
    Classification { classes: Vec<ClassLabel> },
}

impl Case {
    pub fn is_classification(&self) -> bool {
        matches!(self, Case::Classification { .. })
    }

    pub fn classes(&self) -> Option<&[ClassLabel]> {
        match self {
            Case::Regression => None,
            Case::Classification { classes } => Some(classes),
        }
    }

    /// Position of a predicted value within the declared classes.
    pub fn class_position(&self, value: f64) -> Option<usize> {
        let classes = self.classes()?;
        if value.fract() != 0.0 || !value.is_finite() {
            return None;
        }
        classes.iter().position(|&c| c as f64 == value)
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Case::Regression => f.write_str("regression"),
            Case::Classification { .. } => f.write_str("classification"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn frame_rejects_mismatched_labels() {
        let res = NumericFrame::new(
            vec!["a".into()],
            cols(&["x", "y"]),
            array![[1.0, 2.0], [3.0, 4.0]],
        );
        assert!(matches!(res, Err(PredictorError::ShapeMismatch(_))));
    }

    #[test]
    fn frame_rejects_duplicate_labels() {
        let rows = NumericFrame::new(
            vec!["a".into(), "a".into()],
            cols(&["x"]),
            array![[1.0], [2.0]],
        );
        assert!(matches!(rows, Err(PredictorError::ShapeMismatch(_))));
        let columns = NumericFrame::from_rows(cols(&["x", "x"]), vec![vec![1.0, 2.0]]);
        assert!(matches!(columns, Err(PredictorError::ShapeMismatch(_))));
    }

    #[test]
    fn align_to_reorders_rows_and_columns() -> Result<()> {
        let frame = NumericFrame::from_rows(cols(&["x", "y"]), vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
        let aligned = frame.align_to(&["1".to_string(), "0".to_string()], &cols(&["y", "x"]))?;
        assert_eq!(aligned.values(), &array![[4.0, 3.0], [2.0, 1.0]]);
        assert_eq!(aligned.index(), &["1".to_string(), "0".to_string()]);

        let missing = frame.align_to(frame.index(), &cols(&["x", "z"]));
        assert!(matches!(missing, Err(PredictorError::ShapeMismatch(_))));
        Ok(())
    }

    #[test]
    fn casts_follow_declared_types() {
        assert_eq!(
            FeatureValue::Int(3).cast(FeatureType::Float64),
            Some(FeatureValue::Float(3.0))
        );
        assert_eq!(
            FeatureValue::Float(2.0).cast(FeatureType::Int64),
            Some(FeatureValue::Int(2))
        );
        assert_eq!(FeatureValue::Float(2.5).cast(FeatureType::Int64), None);
        assert_eq!(FeatureValue::from("abc").cast(FeatureType::Float64), None);
        assert!(FeatureValue::from("abc").matches(FeatureType::Object));
        assert!(!FeatureValue::Missing.matches(FeatureType::Int64));
    }

    #[test]
    fn feature_types_use_dtype_names() {
        let ty: FeatureType = serde_json::from_str("\"float64\"").unwrap();
        assert_eq!(ty, FeatureType::Float64);
        let ty: FeatureType = serde_json::from_str("\"string\"").unwrap();
        assert_eq!(ty, FeatureType::Object);
        assert_eq!(FeatureType::Int64.to_string(), "int64");
    }

    #[test]
    fn class_position_requires_integral_labels() {
        let case = Case::Classification {
            classes: vec![0, 1, 3],
        };
        assert_eq!(case.class_position(3.0), Some(2));
        assert_eq!(case.class_position(1.5), None);
        assert_eq!(case.class_position(2.0), None);
        assert_eq!(Case::Regression.class_position(1.0), None);
    }

    #[test]
    fn prediction_aligns_by_key() -> Result<()> {
        let pred = Prediction::new(vec!["b".into(), "a".into()], array![2.0, 1.0])?;
        let aligned = pred.align_to(&["a".to_string(), "b".to_string()])?;
        assert_eq!(aligned.values(), &array![1.0, 2.0]);
        Ok(())
    }
}
