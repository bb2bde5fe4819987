use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::assessment::UserAssessment;

/// Learner progress record kept next to the saved courses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub active_course_id: Option<String>,
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    #[serde(default)]
    pub completed_sessions: Vec<String>,
    pub assessment: Option<UserAssessment>,
    pub last_active: Option<DateTime<Utc>>,
}

impl UserProgress {
    /// Records a lesson completion once; returns false if it was already recorded.
    pub fn record_lesson(&mut self, lesson_id: &str) -> bool {
        self.last_active = Some(Utc::now());
        if self.completed_lessons.iter().any(|id| id == lesson_id) {
            return false;
        }
        self.completed_lessons.push(lesson_id.to_string());
        true
    }

    pub fn record_session(&mut self, session_id: &str) -> bool {
        self.last_active = Some(Utc::now());
        if self.completed_sessions.iter().any(|id| id == session_id) {
            return false;
        }
        self.completed_sessions.push(session_id.to_string());
        true
    }
}
