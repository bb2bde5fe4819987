use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaRole {
    Mentor,
    #[default]
    Teacher,
    Coach,
    Guide,
    Expert,
}

impl PersonaRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "mentor" => Some(PersonaRole::Mentor),
            "teacher" => Some(PersonaRole::Teacher),
            "coach" => Some(PersonaRole::Coach),
            "guide" => Some(PersonaRole::Guide),
            "expert" => Some(PersonaRole::Expert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaRole::Mentor => "mentor",
            PersonaRole::Teacher => "teacher",
            PersonaRole::Coach => "coach",
            PersonaRole::Guide => "guide",
            PersonaRole::Expert => "expert",
        }
    }
}

/// What a persona is asked to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaContentKind {
    Summary,
    #[default]
    Introduction,
    Explanation,
}

impl PersonaContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaContentKind::Summary => "summary",
            PersonaContentKind::Introduction => "introduction",
            PersonaContentKind::Explanation => "explanation",
        }
    }
}

impl fmt::Display for PersonaContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonaContentKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" => Ok(PersonaContentKind::Summary),
            "introduction" => Ok(PersonaContentKind::Introduction),
            "explanation" => Ok(PersonaContentKind::Explanation),
            other => Err(GatewayError::InvalidRequest(format!(
                "content type must be one of summary, introduction, explanation (got '{other}')"
            ))),
        }
    }
}

/// AI teaching persona matched to a learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub description: String,
    pub role: PersonaRole,
    pub specialties: Vec<String>,
    pub teaching_style: String,
    pub tone: String,
    pub background: String,
    pub characteristics: Vec<String>,
    pub supporting_qualities: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub user_profile_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Learner profile inferred from free-text self description. Unlike
/// `UserAssessment` every field is prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub goals: Vec<String>,
    pub learning_style: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub content_preferences: Vec<String>,
    pub time_availability: String,
    pub background: String,
    pub interests: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaContent {
    pub id: String,
    pub persona_id: String,
    pub title: String,
    pub content: String,
    pub topic: String,
    #[serde(rename = "type")]
    pub kind: PersonaContentKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of `persona/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaBundle {
    pub user_profile: UserProfile,
    pub persona: Persona,
    pub initial_content: PersonaContent,
}

/// Result of `persona/update`: the revised persona and, when the backend wrote
/// one, a content sample in the new voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaUpdate {
    pub persona: Persona,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<PersonaContent>,
}
