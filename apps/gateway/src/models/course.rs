use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;

/// Requested course difficulty. Doubles as the learner's prior-knowledge level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(GatewayError::InvalidRequest(format!(
                "difficulty must be one of beginner, intermediate, advanced (got '{other}')"
            ))),
        }
    }
}

/// Requested course length. Drives the per-module duration estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationClass {
    #[serde(rename = "2-weeks")]
    TwoWeeks,
    #[default]
    #[serde(rename = "4-weeks")]
    FourWeeks,
    #[serde(rename = "8-weeks")]
    EightWeeks,
    #[serde(rename = "12-weeks")]
    TwelveWeeks,
}

/// Number of modules a generated course is planned around.
const PLANNED_MODULES: u32 = 6;

impl DurationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationClass::TwoWeeks => "2-weeks",
            DurationClass::FourWeeks => "4-weeks",
            DurationClass::EightWeeks => "8-weeks",
            DurationClass::TwelveWeeks => "12-weeks",
        }
    }

    pub fn weeks(&self) -> u32 {
        match self {
            DurationClass::TwoWeeks => 2,
            DurationClass::FourWeeks => 4,
            DurationClass::EightWeeks => 8,
            DurationClass::TwelveWeeks => 12,
        }
    }

    /// Default module length in days: the course's days spread across six modules.
    /// 2-weeks → 2, 4-weeks → 4, 8-weeks → 9, 12-weeks → 14.
    pub fn module_days(&self) -> u32 {
        (self.weeks() * 7 / PLANNED_MODULES).max(1)
    }
}

impl fmt::Display for DurationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationClass {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "2-weeks" => Ok(DurationClass::TwoWeeks),
            "4-weeks" => Ok(DurationClass::FourWeeks),
            "8-weeks" => Ok(DurationClass::EightWeeks),
            "12-weeks" => Ok(DurationClass::TwelveWeeks),
            other => Err(GatewayError::InvalidRequest(format!(
                "duration must be one of 2-weeks, 4-weeks, 8-weeks, 12-weeks (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub duration: DurationClass,
    /// Sum of module durations, in days.
    pub total_days: u32,
    pub modules: Vec<Module>,
    pub prerequisites: Vec<String>,
    pub learning_goals: Vec<String>,
    /// 0–100.
    pub progress: u8,
    /// Set when `progress` was supplied by the caller; recomputation leaves it alone.
    #[serde(default)]
    pub manual_progress: bool,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub title: String,
    pub description: String,
    pub order: usize,
    /// Days.
    pub duration: u32,
    pub lessons: Vec<Lesson>,
    pub progress: u8,
    #[serde(default)]
    pub manual_progress: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub order: usize,
    /// Minutes.
    pub duration: u32,
    pub sessions: Vec<Session>,
    pub exercises: Vec<Exercise>,
    pub resources: Vec<Resource>,
    pub progress: u8,
    #[serde(default)]
    pub manual_progress: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub learning_objective: String,
    pub order: usize,
    /// Minutes.
    pub duration: u32,
    pub sections: Vec<SessionSection>,
    pub progress: u8,
    #[serde(default)]
    pub manual_progress: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Introduction,
    Content,
    Activity,
    Assessment,
    Resources,
    Next,
}

impl SectionKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "introduction" | "intro" => Some(SectionKind::Introduction),
            "content" => Some(SectionKind::Content),
            "activity" | "exercise" | "practice" => Some(SectionKind::Activity),
            "assessment" | "quiz" => Some(SectionKind::Assessment),
            "resources" | "resource" => Some(SectionKind::Resources),
            "next" => Some(SectionKind::Next),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Introduction => "introduction",
            SectionKind::Content => "content",
            SectionKind::Activity => "activity",
            SectionKind::Assessment => "assessment",
            SectionKind::Resources => "resources",
            SectionKind::Next => "next",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSection {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub title: String,
    pub content: String,
    pub order: usize,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<SectionQuestion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

/// A quick-check question embedded in an assessment section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Course {
    pub fn module(&self, module_id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn module_mut(&mut self, module_id: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.id == module_id)
    }
}

impl Module {
    pub fn lesson_mut(&mut self, lesson_id: &str) -> Option<&mut Lesson> {
        self.lessons.iter_mut().find(|l| l.id == lesson_id)
    }
}

impl Lesson {
    pub fn session_mut(&mut self, session_id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == session_id)
    }
}
