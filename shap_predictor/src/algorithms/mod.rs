//! The contribution pipeline, leaf to root: normalize, reconcile, select,
//! rank, mask, summarize.

pub mod mask;
pub mod normalize;
pub mod rank;
pub mod reconcile;
pub mod select;
pub mod state;
pub mod summarize;

pub use mask::{build_mask, compute_masked_contributions, Mask};
pub use normalize::{normalize_contributions, ContributionInput, RawContributions};
pub use rank::{rank_contributions, RankedContributions};
pub use select::{keep_right_contributions, PredictedValue, PredictionOutput};
pub use state::ContributionState;
pub use summarize::{summarize, Summary, SummaryEntry};
