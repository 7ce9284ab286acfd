// src/predictor.rs
//! `SmartPredictor`: explains a trained model's predictions on new datasets
//! that have the same structure as the training data.

use crate::algorithms::{
    build_mask, compute_masked_contributions, keep_right_contributions, normalize_contributions,
    rank_contributions, summarize, ContributionInput, ContributionState, Mask, PredictionOutput,
    RankedContributions, Summary,
};
use crate::core::{
    Case, Dataset, FeatureValue, MaskParams, NumericFrame, Prediction, PredictorConfig,
    PredictorError, Result,
};
use crate::traits::{Explainer, PredictModel, Preprocessing};
use crate::utils::{
    apply_preprocessing, check_feature_types, check_features_name, check_label_dict, check_ypred,
    order_columns, record_to_dataset,
};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Raw data handed to `add_input`: a full dataset or a single observation.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetInput {
    Frame(Dataset),
    Record(HashMap<String, FeatureValue>),
}

impl From<Dataset> for DatasetInput {
    fn from(x: Dataset) -> Self {
        DatasetInput::Frame(x)
    }
}

impl From<HashMap<String, FeatureValue>> for DatasetInput {
    fn from(record: HashMap<String, FeatureValue>) -> Self {
        DatasetInput::Record(record)
    }
}

/// Arguments of `add_input`. Omitted parts are taken from the current input.
#[derive(Debug, Clone, Default)]
pub struct NewInput {
    pub x: Option<DatasetInput>,
    pub ypred: Option<Prediction>,
    pub contributions: Option<ContributionInput>,
}

impl NewInput {
    pub fn x(x: impl Into<DatasetInput>) -> Self {
        NewInput {
            x: Some(x.into()),
            ..Default::default()
        }
    }

    pub fn ypred(ypred: Prediction) -> Self {
        NewInput {
            ypred: Some(ypred),
            ..Default::default()
        }
    }

    pub fn with_ypred(mut self, ypred: Prediction) -> Self {
        self.ypred = Some(ypred);
        self
    }

    pub fn with_contributions(mut self, contributions: impl Into<ContributionInput>) -> Self {
        self.contributions = Some(contributions.into());
        self
    }
}

/// Where the predictor stands in its call sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uninitialized,
    HasData,
    Summarized,
}

/// Predictions next to the full contributions in original feature space.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedContributions {
    pub prediction: PredictionOutput,
    pub contributions: NumericFrame,
}

impl DetailedContributions {
    pub fn columns(&self) -> Vec<String> {
        let mut columns = self.prediction.columns();
        columns.extend(self.contributions.columns().iter().cloned());
        columns
    }
}

#[derive(Debug, Clone)]
struct InputBundle {
    x: Dataset,
    x_preprocessed: NumericFrame,
    ypred: Option<Prediction>,
    matched: Option<DetailedContributions>,
}

#[derive(Debug, Clone)]
struct Filtered {
    ranked: RankedContributions,
    mask: Mask,
    masked_contributions: NumericFrame,
}

#[derive(Debug, Clone)]
enum PredictorState {
    Uninitialized,
    HasData(InputBundle),
    Summarized {
        bundle: InputBundle,
        filtered: Filtered,
    },
}

pub struct SmartPredictor<M: PredictModel, E: Explainer> {
    model: M,
    explainer: E,
    preprocessing: Option<Box<dyn Preprocessing>>,
    config: PredictorConfig,
    features: Vec<String>,
    case: Case,
    state: PredictorState,
}

fn check_model<M: PredictModel>(model: &M) -> Result<Case> {
    match model.classes() {
        None => Ok(Case::Regression),
        Some(classes) => {
            let distinct: HashSet<_> = classes.iter().collect();
            if classes.len() < 2 || distinct.len() != classes.len() {
                return Err(PredictorError::config(format!(
                    "A classifier needs at least two distinct classes, got {:?}.",
                    classes
                )));
            }
            Ok(Case::Classification { classes })
        }
    }
}

impl<M: PredictModel, E: Explainer> SmartPredictor<M, E> {
    pub fn new(
        model: M,
        explainer: E,
        config: PredictorConfig,
        preprocessing: Option<Box<dyn Preprocessing>>,
    ) -> Result<Self> {
        config.validate()?;
        let case = check_model(&model)?;
        if !explainer.supports(&case) {
            return Err(PredictorError::config(format!(
                "The explainer cannot explain a {} model.",
                case
            )));
        }
        check_label_dict(config.label_dict.as_ref(), &case)?;
        let features = config.ordered_features();
        if let Some(names) = &config.mask_params.features_to_hide {
            check_features_name(names, &features, &config.features_dict)?;
        }
        debug!(
            "smart predictor ready: {} model over {} features",
            case,
            features.len()
        );
        Ok(SmartPredictor {
            model,
            explainer,
            preprocessing,
            config,
            features,
            case,
            state: PredictorState::Uninitialized,
        })
    }

    pub fn case(&self) -> &Case {
        &self.case
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn mask_params(&self) -> &MaskParams {
        &self.config.mask_params
    }

    pub fn stage(&self) -> Stage {
        match self.state {
            PredictorState::Uninitialized => Stage::Uninitialized,
            PredictorState::HasData(_) => Stage::HasData,
            PredictorState::Summarized { .. } => Stage::Summarized,
        }
    }

    /// Current dataset, in declared column order.
    pub fn x(&self) -> Option<&Dataset> {
        self.bundle().ok().map(|b| &b.x)
    }

    pub fn x_preprocessed(&self) -> Option<&NumericFrame> {
        self.bundle().ok().map(|b| &b.x_preprocessed)
    }

    pub fn ypred(&self) -> Option<&Prediction> {
        self.bundle().ok().and_then(|b| b.ypred.as_ref())
    }

    /// Mask of the last summary.
    pub fn mask(&self) -> Option<&Mask> {
        match &self.state {
            PredictorState::Summarized { filtered, .. } => Some(&filtered.mask),
            _ => None,
        }
    }

    /// Hidden negative and positive contribution totals of the last summary.
    pub fn masked_contributions(&self) -> Option<&NumericFrame> {
        match &self.state {
            PredictorState::Summarized { filtered, .. } => Some(&filtered.masked_contributions),
            _ => None,
        }
    }

    fn bundle(&self) -> Result<&InputBundle> {
        match &self.state {
            PredictorState::Uninitialized => {
                Err(PredictorError::order("add_input must be called first."))
            }
            PredictorState::HasData(bundle) | PredictorState::Summarized { bundle, .. } => Ok(bundle),
        }
    }

    /// Adds a dataset, a prediction and/or contributions, then matches the
    /// contributions to the predictions. A new `x` discards everything stored
    /// for the previous one. Nothing is stored unless every step succeeds.
    pub fn add_input(&mut self, input: NewInput) -> Result<()> {
        let NewInput {
            x,
            ypred,
            contributions,
        } = input;
        let mut bundle = match x {
            Some(x) => self.prepare(x)?,
            None => self
                .bundle()
                .map_err(|_| PredictorError::order("No dataset x specified."))?
                .clone(),
        };
        if let Some(ypred) = ypred {
            bundle.ypred = Some(check_ypred(&bundle.x, &ypred, &self.case)?);
        }
        let matched = self.match_contributions(&mut bundle, contributions)?;
        bundle.matched = Some(matched);
        debug!("input added: {} rows", bundle.x.nrows());
        self.state = PredictorState::HasData(bundle);
        Ok(())
    }

    fn prepare(&self, x: DatasetInput) -> Result<InputBundle> {
        let x = match x {
            DatasetInput::Frame(x) => order_columns(&x, &self.features)?,
            DatasetInput::Record(record) => {
                record_to_dataset(&record, &self.config.features_types, &self.features)?
            }
        };
        check_feature_types(&x, &self.config.features_types)?;
        let x_preprocessed = apply_preprocessing(&x, self.preprocessing.as_deref())?;
        if x_preprocessed.ncols() != self.model.num_features() {
            return Err(PredictorError::shape(format!(
                "Preprocessed data has {} features, but model expects {}.",
                x_preprocessed.ncols(),
                self.model.num_features()
            )));
        }
        Ok(InputBundle {
            x,
            x_preprocessed,
            ypred: None,
            matched: None,
        })
    }

    fn predict_bundle(&self, bundle: &InputBundle) -> Result<Prediction> {
        let values = self.model.predict(&bundle.x_preprocessed)?;
        let ypred = Prediction::new(bundle.x_preprocessed.index().to_vec(), values)?;
        check_ypred(&bundle.x, &ypred, &self.case)
    }

    fn proba_bundle(&self, bundle: &InputBundle) -> Result<NumericFrame> {
        let classes = self.case.classes().ok_or_else(|| {
            PredictorError::config("predict_proba is only available for classification models.")
        })?;
        let proba = self.model.predict_proba(&bundle.x_preprocessed)?;
        NumericFrame::new(
            bundle.x_preprocessed.index().to_vec(),
            classes.iter().map(|c| format!("class_{}", c)).collect(),
            proba,
        )
    }

    fn match_contributions(
        &self,
        bundle: &mut InputBundle,
        contributions: Option<ContributionInput>,
    ) -> Result<DetailedContributions> {
        let ypred = match &bundle.ypred {
            Some(ypred) => ypred.clone(),
            None => {
                let ypred = self.predict_bundle(bundle)?;
                bundle.ypred = Some(ypred.clone());
                ypred
            }
        };
        let raw = match contributions {
            Some(contributions) => contributions,
            None => self.explainer.compute(&bundle.x_preprocessed)?,
        };
        let normalized = normalize_contributions(&self.case, raw)?;
        let state = ContributionState::validate(normalized, &bundle.x_preprocessed)?;
        debug!(
            "reconciling {} contributions",
            if state.is_per_class() { "per-class" } else { "single-table" }
        );
        let state = state.inverse_transform(self.preprocessing.as_deref(), bundle.x.columns())?;
        state.check_shape(&bundle.x)?;

        let proba = if self.case.is_classification() {
            Some(self.proba_bundle(bundle)?)
        } else {
            None
        };
        let (prediction, contributions) = keep_right_contributions(
            &ypred,
            state,
            &self.case,
            self.config.label_dict.as_ref(),
            proba.as_ref(),
        )?;
        debug!(
            "contributions matched: {} rows x {} features",
            contributions.nrows(),
            contributions.ncols()
        );
        Ok(DetailedContributions {
            prediction,
            contributions,
        })
    }

    /// Model predictions for the current dataset; they replace any stored
    /// prediction. Contributions matched to a different prediction are dropped.
    pub fn predict(&mut self) -> Result<Prediction> {
        let mut bundle = self.bundle()?.clone();
        let ypred = self.predict_bundle(&bundle)?;
        if bundle.ypred.as_ref() != Some(&ypred) {
            bundle.matched = None;
        }
        bundle.ypred = Some(ypred.clone());
        self.state = PredictorState::HasData(bundle);
        Ok(ypred)
    }

    /// Per-class probabilities, one `class_<label>` column per class.
    pub fn predict_proba(&self) -> Result<NumericFrame> {
        self.proba_bundle(self.bundle()?)
    }

    /// Computes (or takes the given) contributions and matches them to the
    /// current predictions, predicting first when no prediction is stored.
    pub fn compute_contributions(
        &mut self,
        contributions: Option<ContributionInput>,
    ) -> Result<(PredictionOutput, NumericFrame)> {
        let mut bundle = self.bundle()?.clone();
        let matched = self.match_contributions(&mut bundle, contributions)?;
        bundle.matched = Some(matched.clone());
        self.state = PredictorState::HasData(bundle);
        Ok((matched.prediction, matched.contributions))
    }

    /// Same as `compute_contributions`, with predictions and contributions side by side.
    pub fn detail_contributions(
        &mut self,
        contributions: Option<ContributionInput>,
    ) -> Result<DetailedContributions> {
        let (prediction, contributions) = self.compute_contributions(contributions)?;
        Ok(DetailedContributions {
            prediction,
            contributions,
        })
    }

    fn matched<'a>(&self, bundle: &'a InputBundle) -> Result<&'a DetailedContributions> {
        bundle.matched.as_ref().ok_or_else(|| {
            PredictorError::order("compute_contributions must be called after predict.")
        })
    }

    fn filtered(&self, bundle: &InputBundle) -> Result<Filtered> {
        let matched = self.matched(bundle)?;
        let ranked = rank_contributions(&matched.contributions, &bundle.x)?;
        let params = &self.config.mask_params;
        let hidden = match &params.features_to_hide {
            Some(names) => check_features_name(names, &self.features, &self.config.features_dict)?,
            None => Vec::new(),
        };
        let mask = build_mask(&ranked, params, &hidden)?;
        let masked_contributions = compute_masked_contributions(&ranked, &mask)?;
        Ok(Filtered {
            ranked,
            mask,
            masked_contributions,
        })
    }

    /// Keep-mask of the ranked contributions under the current mask parameters.
    pub fn filter(&self) -> Result<Mask> {
        Ok(self.filtered(self.bundle()?)?.mask)
    }

    /// Top contributions of every prediction under the current mask parameters.
    pub fn summarize(&mut self) -> Result<Summary> {
        let bundle = self.bundle()?.clone();
        let filtered = self.filtered(&bundle)?;
        let prediction = self.matched(&bundle)?.prediction.clone();
        let summary = summarize(
            &filtered.ranked,
            &filtered.mask,
            bundle.x.columns(),
            &self.config.features_dict,
            prediction,
        )?;
        debug!(
            "summarized {} rows with up to {} contributions each",
            summary.rows.len(),
            summary.width
        );
        self.state = PredictorState::Summarized { bundle, filtered };
        Ok(summary)
    }

    /// Updates only the mask parameters that are set in `update`.
    pub fn modify_mask(&mut self, update: MaskParams) -> Result<()> {
        let merged = self.config.mask_params.merged(update);
        self.set_mask_params(merged)
    }

    /// Replaces all mask parameters, `None` fields disabling their filter.
    pub fn set_mask_params(&mut self, params: MaskParams) -> Result<()> {
        params.validate()?;
        if let Some(names) = &params.features_to_hide {
            check_features_name(names, &self.features, &self.config.features_dict)?;
        }
        debug!("mask parameters set to {:?}", params);
        self.config.mask_params = params;
        Ok(())
    }
}
