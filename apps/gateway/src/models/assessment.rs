use serde::{Deserialize, Serialize};

use crate::models::course::Difficulty;

/// Semantic bucket of a quiz question; decides which part of the profile it updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    LearningStyle,
    TimeAvailability,
    PriorExperience,
    Preferences,
    Challenges,
    Goals,
    GeneralKnowledge,
}

impl QuestionCategory {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "learning_style" => Some(QuestionCategory::LearningStyle),
            "time_availability" => Some(QuestionCategory::TimeAvailability),
            "prior_experience" => Some(QuestionCategory::PriorExperience),
            "preferences" => Some(QuestionCategory::Preferences),
            "challenges" => Some(QuestionCategory::Challenges),
            "goals" => Some(QuestionCategory::Goals),
            "general_knowledge" => Some(QuestionCategory::GeneralKnowledge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::LearningStyle => "learning_style",
            QuestionCategory::TimeAvailability => "time_availability",
            QuestionCategory::PriorExperience => "prior_experience",
            QuestionCategory::Preferences => "preferences",
            QuestionCategory::Challenges => "challenges",
            QuestionCategory::Goals => "goals",
            QuestionCategory::GeneralKnowledge => "general_knowledge",
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

/// Multiple-choice quiz question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MCQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    /// `None` when the backend omitted it; scoring then infers one from the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<QuestionCategory>,
    /// Positive multiplier.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningAxis {
    Visual,
    Auditory,
    Reading,
    Kinesthetic,
}

impl LearningAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningAxis::Visual => "visual",
            LearningAxis::Auditory => "auditory",
            LearningAxis::Reading => "reading",
            LearningAxis::Kinesthetic => "kinesthetic",
        }
    }
}

/// Accumulated learning-style weights. Not normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningStyle {
    pub visual: f64,
    pub auditory: f64,
    pub reading: f64,
    pub kinesthetic: f64,
}

impl LearningStyle {
    pub fn add(&mut self, axis: LearningAxis, amount: f64) {
        match axis {
            LearningAxis::Visual => self.visual += amount,
            LearningAxis::Auditory => self.auditory += amount,
            LearningAxis::Reading => self.reading += amount,
            LearningAxis::Kinesthetic => self.kinesthetic += amount,
        }
    }

    pub fn get(&self, axis: LearningAxis) -> f64 {
        match axis {
            LearningAxis::Visual => self.visual,
            LearningAxis::Auditory => self.auditory,
            LearningAxis::Reading => self.reading,
            LearningAxis::Kinesthetic => self.kinesthetic,
        }
    }

    /// Heaviest axis, first one winning ties. `None` when every weight is zero.
    pub fn dominant(&self) -> Option<LearningAxis> {
        let mut best: Option<(LearningAxis, f64)> = None;
        for axis in [
            LearningAxis::Visual,
            LearningAxis::Auditory,
            LearningAxis::Reading,
            LearningAxis::Kinesthetic,
        ] {
            let weight = self.get(axis);
            if weight > 0.0 && best.map_or(true, |(_, w)| weight > w) {
                best = Some((axis, weight));
            }
        }
        best.map(|(axis, _)| axis)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    #[default]
    Evening,
    Anytime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeCommitment {
    pub hours_per_week: u32,
    pub preferred_time_of_day: TimeOfDay,
}

impl Default for TimeCommitment {
    fn default() -> Self {
        Self {
            hours_per_week: 5,
            preferred_time_of_day: TimeOfDay::Evening,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorKnowledge {
    pub level: Difficulty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPreferences {
    pub practical_projects: bool,
    pub group_work: bool,
    pub reading_materials: bool,
    pub video_content: bool,
    pub interactive_exercises: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Relaxed,
    #[default]
    Standard,
    Intensive,
}

/// Learner profile produced once per completed quiz. Never mutated afterwards;
/// a new quiz yields a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAssessment {
    pub learning_style: LearningStyle,
    pub time_commitment: TimeCommitment,
    pub prior_knowledge: PriorKnowledge,
    pub preferences: LearningPreferences,
    pub challenges: Vec<String>,
    pub recommended_pace: Pace,
}

impl UserAssessment {
    /// Starting point before any answer is applied.
    pub fn baseline(level: Option<Difficulty>) -> Self {
        Self {
            learning_style: LearningStyle::default(),
            time_commitment: TimeCommitment::default(),
            prior_knowledge: PriorKnowledge {
                level: level.unwrap_or_default(),
            },
            preferences: LearningPreferences::default(),
            challenges: Vec::new(),
            recommended_pace: Pace::Standard,
        }
    }

    pub fn dominant_learning_style(&self) -> Option<LearningAxis> {
        self.learning_style.dominant()
    }
}
