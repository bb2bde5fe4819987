//! Generation request types.
//!
//! Every request is validated before any network attempt; a failed check is an
//! `INVALID_REQUEST` error and never reaches the backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::GatewayError;
use crate::models::assessment::{LearningStyle, UserAssessment};
use crate::models::course::{Difficulty, DurationClass};
use crate::models::persona::PersonaContentKind;
use crate::normalize::course::DEFAULT_SESSION_MINUTES;

pub const MIN_SESSION_MINUTES: u32 = 5;
pub const MAX_SESSION_MINUTES: u32 = 240;
pub const MAX_ASSESSMENT_QUESTIONS: u32 = 20;
pub const MAX_PRACTICE_PROBLEMS: u32 = 10;
const MAX_TOPIC_CHARS: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request kinds
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    #[default]
    Quiz,
    Test,
    Practice,
}

impl AssessmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentKind::Quiz => "quiz",
            AssessmentKind::Test => "test",
            AssessmentKind::Practice => "practice",
        }
    }
}

impl FromStr for AssessmentKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quiz" => Ok(AssessmentKind::Quiz),
            "test" => Ok(AssessmentKind::Test),
            "practice" => Ok(AssessmentKind::Practice),
            other => Err(GatewayError::InvalidRequest(format!(
                "assessment type must be one of quiz, test, practice (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Code,
    Visual,
    Practice,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Code => "code",
            ContentKind::Visual => "visual",
            ContentKind::Practice => "practice",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ContentKind::Text),
            "code" => Ok(ContentKind::Code),
            "visual" => Ok(ContentKind::Visual),
            "practice" => Ok(ContentKind::Practice),
            other => Err(GatewayError::InvalidRequest(format!(
                "content type must be one of text, code, visual, practice (got '{other}')"
            ))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CourseRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub duration: DurationClass,
}

impl CourseRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require_topic(&self.topic)
    }

    pub fn payload(&self) -> Value {
        json!({
            "topic": self.topic.trim(),
            "difficulty": self.difficulty,
            "duration": self.duration,
        })
    }
}

/// Course personalized by a completed assessment.
#[derive(Debug, Clone)]
pub struct AssessmentCourseRequest {
    pub topic: String,
    pub assessment: UserAssessment,
    pub duration: DurationClass,
}

impl AssessmentCourseRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require_topic(&self.topic)
    }

    pub fn payload(&self) -> Value {
        json!({
            "topic": self.topic.trim(),
            "assessment": self.assessment,
            "duration": self.duration,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ModuleLessonsRequest {
    pub course_id: String,
    pub module_id: String,
    pub topic: String,
    pub module_title: String,
    pub module_description: String,
    pub difficulty: Difficulty,
    pub learning_style: LearningStyle,
    pub assessment: Option<UserAssessment>,
}

impl ModuleLessonsRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require_topic(&self.topic)?;
        require("course_id", &self.course_id)?;
        require("module_id", &self.module_id)?;
        require("module_title", &self.module_title)
    }

    pub fn payload(&self) -> Value {
        json!({
            "course_id": self.course_id,
            "module_id": self.module_id,
            "topic": self.topic.trim(),
            "module_name": self.module_title,
            "module_description": self.module_description,
            "difficulty": self.difficulty,
            "learning_style": self.learning_style,
            "user_assessment": self.assessment,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub user_id: String,
    pub course_id: String,
    pub module_id: String,
    pub lesson_id: Option<String>,
    pub topic: String,
    pub difficulty: Difficulty,
    pub learning_style: LearningStyle,
    /// Titles of sessions already taken, oldest first.
    pub previous_sessions: Vec<String>,
    pub duration_minutes: u32,
}

impl SessionRequest {
    pub fn new(user_id: &str, course_id: &str, module_id: &str, topic: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            module_id: module_id.to_string(),
            lesson_id: None,
            topic: topic.to_string(),
            difficulty: Difficulty::default(),
            learning_style: LearningStyle::default(),
            previous_sessions: Vec::new(),
            duration_minutes: DEFAULT_SESSION_MINUTES,
        }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        require_topic(&self.topic)?;
        require("user_id", &self.user_id)?;
        require("course_id", &self.course_id)?;
        require("module_id", &self.module_id)?;
        if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&self.duration_minutes) {
            return Err(GatewayError::InvalidRequest(format!(
                "session duration must be between {MIN_SESSION_MINUTES} and {MAX_SESSION_MINUTES} minutes (got {})",
                self.duration_minutes
            )));
        }
        Ok(())
    }

    /// Id the generated session is filed under.
    pub fn parent_id(&self) -> &str {
        self.lesson_id.as_deref().unwrap_or(&self.module_id)
    }

    pub fn payload(&self) -> Value {
        let dominant = self
            .learning_style
            .dominant()
            .map_or("mixed", |axis| axis.as_str());
        let previous: Vec<Value> = self
            .previous_sessions
            .iter()
            .map(|title| json!({ "title": title }))
            .collect();
        json!({
            "user_id": self.user_id,
            "course_id": self.course_id,
            "module_id": self.module_id,
            "lesson_id": self.lesson_id,
            "topic": self.topic.trim(),
            "difficulty": self.difficulty,
            "learning_style": self.learning_style,
            "dominant_learning_style": dominant,
            "previous_sessions": previous,
            "duration_minutes": self.duration_minutes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AssessmentRequest {
    pub topic: String,
    pub kind: AssessmentKind,
    /// Clamped to `1..=20` when sent.
    pub count: u32,
}

impl AssessmentRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require_topic(&self.topic)
    }

    pub fn clamped_count(&self) -> u32 {
        self.count.clamp(1, MAX_ASSESSMENT_QUESTIONS)
    }

    pub fn payload(&self) -> Value {
        json!({
            "topic": self.topic.trim(),
            "type": self.kind,
            "count": self.clamped_count(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub topic: String,
    pub kind: ContentKind,
    pub context: Option<Value>,
}

impl ContentRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require_topic(&self.topic)
    }

    pub fn payload(&self) -> Value {
        json!({
            "topic": self.topic.trim(),
            "type": self.kind,
            "context": self.context,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PracticeRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    /// Most recent interactions; only the last three are sent.
    pub previous_interactions: Vec<String>,
}

impl PracticeRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require_topic(&self.topic)
    }

    pub fn payload(&self) -> Value {
        let skip = self.previous_interactions.len().saturating_sub(3);
        let recent: Vec<Value> = self.previous_interactions[skip..]
            .iter()
            .map(|content| json!({ "content": content }))
            .collect();
        json!({
            "topic": self.topic.trim(),
            "difficulty": self.difficulty,
            "previousInteractions": recent,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub context: Option<Value>,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require("message", &self.message)
    }

    pub fn payload(&self) -> Value {
        json!({
            "message": self.message,
            "context": self.context,
        })
    }
}

/// Batch of standalone practice problems.
#[derive(Debug, Clone)]
pub struct PracticeProblemsRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    /// Clamped to `1..=10` when sent.
    pub count: u32,
    pub include_solutions: bool,
}

impl PracticeProblemsRequest {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            difficulty: Difficulty::Intermediate,
            count: 3,
            include_solutions: true,
        }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        require_topic(&self.topic)
    }

    pub fn clamped_count(&self) -> u32 {
        self.count.clamp(1, MAX_PRACTICE_PROBLEMS)
    }

    pub fn payload(&self) -> Value {
        json!({
            "topic": self.topic.trim(),
            "difficulty": self.difficulty,
            "count": self.clamped_count(),
            "includeSolutions": self.include_solutions,
        })
    }
}

/// Builds a teaching persona and learner profile from free-text self description.
#[derive(Debug, Clone)]
pub struct PersonaRequest {
    pub user_input: String,
    pub topic: String,
}

impl PersonaRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require_topic(&self.topic)?;
        require("user_input", &self.user_input)
    }

    pub fn payload(&self) -> Value {
        json!({
            "userInput": self.user_input,
            "topic": self.topic.trim(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PersonaUpdateRequest {
    pub persona_id: String,
    /// Free-form field overrides, passed through as sent.
    pub changes: Value,
}

impl PersonaUpdateRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require("persona_id", &self.persona_id)?;
        match &self.changes {
            Value::Object(map) if !map.is_empty() => Ok(()),
            _ => Err(GatewayError::InvalidRequest(
                "changes must be a non-empty object".to_string(),
            )),
        }
    }

    pub fn payload(&self) -> Value {
        json!({
            "personaId": self.persona_id,
            "changes": self.changes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PersonaContentRequest {
    pub persona_id: String,
    pub topic: String,
    pub kind: PersonaContentKind,
}

impl PersonaContentRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require("persona_id", &self.persona_id)?;
        require_topic(&self.topic)
    }

    pub fn payload(&self) -> Value {
        json!({
            "personaId": self.persona_id,
            "topic": self.topic.trim(),
            "contentType": self.kind,
        })
    }
}

/// Course generated in the voice of an existing persona.
#[derive(Debug, Clone)]
pub struct PersonaCourseRequest {
    pub persona_id: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub duration: DurationClass,
}

impl PersonaCourseRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require("persona_id", &self.persona_id)?;
        require_topic(&self.topic)
    }

    pub fn payload(&self) -> Value {
        json!({
            "personaId": self.persona_id,
            "topic": self.topic.trim(),
            "difficulty": self.difficulty,
            "duration": self.duration,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Where in a course a persona chat takes place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PersonaChatRequest {
    pub persona_id: String,
    pub message: String,
    pub history: Vec<ChatTurn>,
    pub course_context: Option<CourseLocation>,
}

impl PersonaChatRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        require("persona_id", &self.persona_id)?;
        require("message", &self.message)
    }

    pub fn payload(&self) -> Value {
        json!({
            "personaId": self.persona_id,
            "message": self.message,
            "history": self.history,
            "courseContext": self.course_context,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackRequest {
    pub course_id: Option<String>,
    /// 1–5.
    pub rating: u8,
    pub comment: String,
}

impl FeedbackRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        if !(1..=5).contains(&self.rating) {
            return Err(GatewayError::InvalidRequest(format!(
                "rating must be between 1 and 5 (got {})",
                self.rating
            )));
        }
        Ok(())
    }

    pub fn payload(&self) -> Value {
        json!({
            "courseId": self.course_id,
            "rating": self.rating,
            "comment": self.comment,
        })
    }
}

fn require(field: &str, value: &str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_topic(topic: &str) -> Result<(), GatewayError> {
    require("topic", topic)?;
    if topic.trim().chars().count() > MAX_TOPIC_CHARS {
        return Err(GatewayError::InvalidRequest(format!(
            "topic cannot be longer than {MAX_TOPIC_CHARS} characters"
        )));
    }
    Ok(())
}
