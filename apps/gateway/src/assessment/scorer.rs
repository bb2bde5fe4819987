//! Folds answered quiz questions into a `UserAssessment`.
//!
//! Algorithm:
//! 1. Start from `UserAssessment::baseline(level)`.
//! 2. Skip unanswered questions.
//! 3. Branch on the question's category (inferred when missing) and apply the
//!    answer index through the fixed tables below.
//!
//! Out-of-range answer indices contribute nothing.

use std::collections::HashMap;

use tracing::debug;

use crate::assessment::inference::infer_category;
use crate::models::assessment::{
    LearningAxis, LearningPreferences, MCQuestion, Pace, QuestionCategory, TimeOfDay,
    UserAssessment,
};
use crate::models::course::Difficulty;

// ────────────────────────────────────────────────────────────────────────────
// Answer tables
// ────────────────────────────────────────────────────────────────────────────

const AXES: [LearningAxis; 4] = [
    LearningAxis::Visual,
    LearningAxis::Auditory,
    LearningAxis::Reading,
    LearningAxis::Kinesthetic,
];

const HOURS_PER_WEEK: [u32; 4] = [2, 5, 10, 15];

const TIME_OF_DAY: [TimeOfDay; 4] = [
    TimeOfDay::Morning,
    TimeOfDay::Afternoon,
    TimeOfDay::Evening,
    TimeOfDay::Anytime,
];

const EXPERIENCE: [Difficulty; 4] = [
    Difficulty::Beginner,
    Difficulty::Beginner,
    Difficulty::Intermediate,
    Difficulty::Advanced,
];

const PACE: [Pace; 4] = [Pace::Relaxed, Pace::Standard, Pace::Standard, Pace::Intensive];

/// Preference flags set by each answer. Indices 0, 2 and 3 set two flags each.
fn apply_preference(prefs: &mut LearningPreferences, index: usize) {
    match index {
        0 => {
            prefs.practical_projects = true;
            prefs.video_content = true;
        }
        1 => prefs.group_work = true,
        2 => {
            prefs.reading_materials = true;
            prefs.video_content = true;
        }
        3 => {
            prefs.practical_projects = true;
            prefs.interactive_exercises = true;
        }
        _ => {}
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Builds a learner profile from `answers` (question id → selected option index).
/// `level` seeds `priorKnowledge.level`; it is usually the course's requested difficulty.
pub fn score_assessment(
    questions: &[MCQuestion],
    answers: &HashMap<String, usize>,
    level: Option<Difficulty>,
) -> UserAssessment {
    let mut profile = UserAssessment::baseline(level);

    for question in questions {
        let Some(&answer) = answers.get(&question.id) else {
            continue;
        };
        let category = question.category.unwrap_or_else(|| {
            let inferred = infer_category(question);
            debug!(question = %question.id, "category missing, inferred {}", inferred.as_str());
            inferred
        });
        apply_answer(&mut profile, question, category, answer);
    }

    profile
}

fn apply_answer(
    profile: &mut UserAssessment,
    question: &MCQuestion,
    category: QuestionCategory,
    answer: usize,
) {
    let text = question.question.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| text.contains(w));

    match category {
        QuestionCategory::LearningStyle => {
            if let Some(axis) = AXES.get(answer) {
                profile.learning_style.add(*axis, question.weight);
            }
        }
        QuestionCategory::TimeAvailability => {
            // Independent checks: one question can set both fields.
            if mentions(&["hour", "time"]) {
                if let Some(hours) = HOURS_PER_WEEK.get(answer) {
                    profile.time_commitment.hours_per_week = *hours;
                }
            }
            if mentions(&["prefer", "day"]) {
                if let Some(slot) = TIME_OF_DAY.get(answer) {
                    profile.time_commitment.preferred_time_of_day = *slot;
                }
            }
        }
        QuestionCategory::PriorExperience => {
            if mentions(&["experience", "familiar"]) {
                if let Some(level) = EXPERIENCE.get(answer) {
                    profile.prior_knowledge.level = *level;
                }
            }
        }
        QuestionCategory::Preferences => apply_preference(&mut profile.preferences, answer),
        QuestionCategory::Challenges => {
            if let Some(option) = question.options.get(answer) {
                profile.challenges.push(option.clone());
            }
        }
        QuestionCategory::Goals => {
            if mentions(&["pace", "speed"]) {
                if let Some(pace) = PACE.get(answer) {
                    profile.recommended_pace = *pace;
                }
            }
        }
        QuestionCategory::GeneralKnowledge => {}
    }
}
