//! Single-document JSON file store.
//!
//! Writes go to a sibling temp file that is then renamed over the target, so a
//! crash mid-write leaves the previous document intact. A missing file reads as empty.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::course::Course;
use crate::models::progress::UserProgress;
use crate::store::{CourseStore, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    courses: Vec<Course>,
    #[serde(default)]
    progress: UserProgress,
}

pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles; courses and progress share one file.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Document, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Document::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("store {} does not exist yet", self.path.display());
                Ok(Document::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, document: &Document) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(document)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("store written to {} ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }
}

#[async_trait]
impl CourseStore for JsonFileStore {
    async fn load_courses(&self) -> Result<Vec<Course>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.courses)
    }

    async fn save_courses(&self, courses: &[Course]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read().await?;
        document.courses = courses.to_vec();
        self.write(&document).await?;
        info!("Saved {} course(s)", courses.len());
        Ok(())
    }

    async fn load_progress(&self) -> Result<UserProgress, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.progress)
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read().await?;
        document.progress = progress.clone();
        self.write(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_course, CourseContext};
    use serde_json::json;

    fn course(id: &str) -> Course {
        let raw = json!({"id": id, "topic": "Rust", "modules": [{"title": "Ownership"}]});
        normalize_course(&raw, &CourseContext::default()).value
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));

        assert!(store.load_courses().await.unwrap().is_empty());
        assert_eq!(store.load_progress().await.unwrap(), UserProgress::default());
    }

    #[tokio::test]
    async fn test_courses_and_progress_round_trip_independently() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("store.json"));

        let courses = vec![course("c1"), course("c2")];
        store.save_courses(&courses).await.unwrap();

        let mut progress = UserProgress::default();
        progress.active_course_id = Some("c2".to_string());
        progress.record_lesson("lesson_m1_1");
        store.save_progress(&progress).await.unwrap();

        assert_eq!(store.load_courses().await.unwrap(), courses);
        assert_eq!(store.load_progress().await.unwrap(), progress);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_malformed_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(store.load_courses().await, Err(StoreError::Serde(_))));
    }

    #[tokio::test]
    async fn test_store_usable_as_trait_object() {
        let dir = tempfile::tempdir().unwrap();
        let store: std::sync::Arc<dyn CourseStore> =
            std::sync::Arc::new(JsonFileStore::new(dir.path().join("store.json")));
        store.save_courses(&[course("c1")]).await.unwrap();
        assert_eq!(store.load_courses().await.unwrap().len(), 1);
    }
}
