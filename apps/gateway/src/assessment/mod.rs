//! Assessment scoring: answered quiz questions → learner profile.

pub mod inference;
pub mod scorer;

pub use inference::infer_category;
pub use scorer::score_assessment;
