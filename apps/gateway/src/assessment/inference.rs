//! Category inference for questions the backend sent without a `category`.
//!
//! This is a fallback for backend omissions only. Questions normally carry a
//! category and are scored on it directly.

use crate::models::assessment::{MCQuestion, QuestionCategory};

/// Keyword table, checked in priority order. The first category with any hit wins.
const KEYWORDS: [(QuestionCategory, &[&str]); 6] = [
    (
        QuestionCategory::Preferences,
        &["type of content", "content type", "format", "group", "project", "video"],
    ),
    (
        QuestionCategory::LearningStyle,
        &["learn best", "learning style", "prefer to learn", "visual", "auditory", "hands-on"],
    ),
    (
        QuestionCategory::TimeAvailability,
        &["hours", "time", "week", "schedule"],
    ),
    (
        QuestionCategory::PriorExperience,
        &["experience", "familiar", "background", "knowledge"],
    ),
    (
        QuestionCategory::Challenges,
        &["challenge", "difficult", "struggle", "obstacle"],
    ),
    (
        QuestionCategory::Goals,
        &["goal", "pace", "motivat", "achieve"],
    ),
];

/// Deterministic category guess from the question text and its options.
/// Falls back to `GeneralKnowledge`, which contributes nothing to the profile.
pub fn infer_category(question: &MCQuestion) -> QuestionCategory {
    let haystack = std::iter::once(question.question.as_str())
        .chain(question.options.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| haystack.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(QuestionCategory::GeneralKnowledge)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str, options: &[&str]) -> MCQuestion {
        MCQuestion {
            id: "q".to_string(),
            question: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            category: None,
            weight: 1.0,
        }
    }

    #[test]
    fn test_infers_each_category() {
        assert_eq!(
            infer_category(&q("Which format suits you?", &["a", "b"])),
            QuestionCategory::Preferences
        );
        assert_eq!(
            infer_category(&q("How do you learn best?", &["a", "b"])),
            QuestionCategory::LearningStyle
        );
        assert_eq!(
            infer_category(&q("How many hours can you commit?", &["1", "2"])),
            QuestionCategory::TimeAvailability
        );
        assert_eq!(
            infer_category(&q("How familiar are you with SQL?", &["a", "b"])),
            QuestionCategory::PriorExperience
        );
        assert_eq!(
            infer_category(&q("What is your biggest obstacle?", &["a", "b"])),
            QuestionCategory::Challenges
        );
        assert_eq!(
            infer_category(&q("What is your main goal?", &["a", "b"])),
            QuestionCategory::Goals
        );
        assert_eq!(
            infer_category(&q("What does SQL stand for?", &["a", "b"])),
            QuestionCategory::GeneralKnowledge
        );
    }

    #[test]
    fn test_priority_order_breaks_ties() {
        // Mentions both a video (preferences) and hours (time availability).
        let question = q("How many hours of video per week?", &["1", "2"]);
        assert_eq!(infer_category(&question), QuestionCategory::Preferences);
    }

    #[test]
    fn test_options_are_searched() {
        let question = q("Pick one", &["Visual diagrams", "Podcasts"]);
        assert_eq!(infer_category(&question), QuestionCategory::LearningStyle);
    }
}
