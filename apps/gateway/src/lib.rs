//! Resilient generation gateway for AI-produced course curricula.
//!
//! - `gateway`: rate limiting, retry, the single request entry point and
//!   response classification.
//! - `normalize`: repairs loosely shaped payloads into invariant-preserving
//!   `Course` trees, question lists, personas and practice problems.
//! - `assessment`: folds quiz answers into a `UserAssessment` learner profile.
//! - `generation`: the per-endpoint service tying the above together.
//! - `store`: the persistence port and its JSON file implementation.

pub mod assessment;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod generation;
pub mod models;
pub mod normalize;
pub mod store;
