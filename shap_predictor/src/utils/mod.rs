pub mod check;
pub mod transform;

pub use check::*;
pub use transform::{apply_preprocessing, to_numeric};
