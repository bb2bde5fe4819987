//! Persistence port for saved courses and learner progress.
//!
//! The core only depends on `CourseStore`; `JsonFileStore` is the bundled
//! implementation. Callers hold it as `Arc<dyn CourseStore>`.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::course::Course;
use crate::models::progress::UserProgress;

pub mod json_file;

pub use json_file::JsonFileStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Load at startup, save on every mutation.
#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn load_courses(&self) -> Result<Vec<Course>, StoreError>;
    async fn save_courses(&self, courses: &[Course]) -> Result<(), StoreError>;
    async fn load_progress(&self) -> Result<UserProgress, StoreError>;
    async fn save_progress(&self, progress: &UserProgress) -> Result<(), StoreError>;
}
