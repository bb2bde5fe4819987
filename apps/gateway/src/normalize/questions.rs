//! Assessment question normalization.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::models::assessment::{MCQuestion, QuestionCategory};
use crate::normalize::{coerce_object, id_of, payload_list, strings, text, Normalized, RepairLog};

const PLACEHOLDER_OPTIONS: [&str; 4] = ["Option A", "Option B", "Option C", "Option D"];

/// Normalizes a generated question list. Accepts a bare array or an object
/// carrying `questions`; an empty result is replaced by a fixed starter set.
pub fn normalize_questions(raw: &Value) -> Normalized<Vec<MCQuestion>> {
    let mut log = RepairLog::default();
    let items = payload_list(raw, "questions", "questions", &mut log);

    let mut maps = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("questions[{i}]");
        if item.is_null() {
            log.record(&path, "dropped null question");
            continue;
        }
        let map = match item {
            Value::String(text) => {
                log.record(&path, "wrapped bare text as a question");
                let mut map = Map::new();
                map.insert("question".to_string(), Value::String(text.clone()));
                map
            }
            other => coerce_object(other, &path, &mut log),
        };
        maps.push((path, map));
    }

    // Generated ids never take one that a later question carries explicitly.
    let reserved: HashSet<String> = maps.iter().filter_map(|(_, map)| id_of(map)).collect();
    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(maps.len());
    for (path, map) in &maps {
        let question = question_from(map, questions.len(), &mut seen, &reserved, path, &mut log);
        questions.push(question);
    }

    if questions.is_empty() {
        log.record("questions", "no usable questions, using the starter set");
        questions = starter_questions();
    }
    log.finish(questions, "assessment questions")
}

fn question_from(
    map: &Map<String, Value>,
    index: usize,
    seen: &mut HashSet<String>,
    reserved: &HashSet<String>,
    path: &str,
    log: &mut RepairLog,
) -> MCQuestion {
    let explicit = id_of(map);
    if explicit.is_some() && !matches!(map.get("id"), Some(Value::String(_))) {
        log.record(path, "converted non-string id to string");
    }
    let id = match explicit.filter(|id| !seen.contains(id)) {
        Some(id) => id,
        None => {
            let mut candidate = format!("q_{}", index + 1);
            let mut suffix = 2;
            while seen.contains(&candidate) || reserved.contains(&candidate) {
                candidate = format!("q_{}_{suffix}", index + 1);
                suffix += 1;
            }
            log.record(path, format!("assigned id '{candidate}'"));
            candidate
        }
    };
    seen.insert(id.clone());

    let question = match map.get("question").and_then(Value::as_str) {
        Some(q) if !q.trim().is_empty() => q.to_string(),
        _ => {
            let fallback =
                text(map, &["text", "prompt"]).unwrap_or_else(|| format!("Question {}", index + 1));
            log.record(path, "missing question text");
            fallback
        }
    };

    let mut options = strings(map, &["options", "choices"]);
    if options.len() < 2 {
        log.record(path, "fewer than two options, using placeholders");
        options = PLACEHOLDER_OPTIONS.iter().map(|o| o.to_string()).collect();
    }

    let category = match map.get("category") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => {
            let parsed = QuestionCategory::parse(raw);
            match parsed {
                None => log.record(path, format!("dropped unknown category '{raw}'")),
                Some(c) if c.as_str() != raw.as_str() => {
                    log.record(path, format!("category '{raw}' read as '{}'", c.as_str()))
                }
                Some(_) => {}
            }
            parsed
        }
        Some(other) => {
            log.record(path, format!("dropped non-text category {other}"));
            None
        }
    };

    let weight = match map.get("weight").and_then(Value::as_f64) {
        Some(w) if w > 0.0 && w.is_finite() => w,
        Some(w) => {
            log.record(path, format!("weight {w} is not positive, using 1"));
            1.0
        }
        None => {
            if map.contains_key("weight") {
                log.record(path, "unreadable weight, using 1");
            }
            1.0
        }
    };

    MCQuestion {
        id,
        question,
        options,
        category,
        weight,
    }
}

/// Used when the backend returns no usable questions. Option order follows the
/// scorer's answer tables.
pub fn starter_questions() -> Vec<MCQuestion> {
    let question = |id: &str, text: &str, options: [&str; 4], category: QuestionCategory| MCQuestion {
        id: id.to_string(),
        question: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        category: Some(category),
        weight: 1.0,
    };
    vec![
        question(
            "q_prior_experience",
            "How would you rate your familiarity with this topic?",
            [
                "Not familiar at all",
                "Somewhat familiar",
                "Comfortable with the basics",
                "Very familiar",
            ],
            QuestionCategory::PriorExperience,
        ),
        question(
            "q_learning_style",
            "How do you prefer to learn new concepts?",
            [
                "Watching videos",
                "Listening to explanations",
                "Reading text",
                "Hands-on practice",
            ],
            QuestionCategory::LearningStyle,
        ),
        question(
            "q_goals",
            "What pace would you like to learn at?",
            [
                "Relaxed, a little at a time",
                "Steady",
                "Focused",
                "Intensive, as fast as possible",
            ],
            QuestionCategory::Goals,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_questions_are_repaired() {
        let raw = json!({"questions": [
            {"question": "How many hours per week?", "options": ["1", "2", "3", "4"], "category": "time availability", "weight": 0},
            {"id": "dup", "question": "A?", "options": ["x"]},
            {"id": "dup", "question": "B?", "options": ["x", "y"], "category": "astrology"},
            "What is your goal?",
            null
        ]});
        let questions = normalize_questions(&raw).value;
        assert_eq!(questions.len(), 4);

        assert_eq!(questions[0].id, "q_1");
        assert_eq!(questions[0].category, Some(QuestionCategory::TimeAvailability));
        assert_eq!(questions[0].weight, 1.0);

        assert_eq!(questions[1].id, "dup");
        assert_eq!(questions[1].options, PLACEHOLDER_OPTIONS.to_vec());

        assert_eq!(questions[2].id, "q_3");
        assert_eq!(questions[2].category, None);

        assert_eq!(questions[3].question, "What is your goal?");
        assert_eq!(questions[3].options.len(), 4);
    }

    #[test]
    fn test_generated_ids_skip_later_explicit_ids() {
        let raw = json!([
            {"question": "A?", "options": ["x", "y"]},
            {"id": "q_1", "question": "B?", "options": ["x", "y"]}
        ]);
        let questions = normalize_questions(&raw).value;
        assert_eq!(questions[1].id, "q_1");
        assert_eq!(questions[0].id, "q_1_2");
        assert_ne!(questions[0].id, questions[1].id);
    }

    #[test]
    fn test_questions_are_idempotent() {
        let raw = json!([{"question": "Q?", "options": ["a", "b"], "weight": 2.5}, {}]);
        let first = normalize_questions(&raw);
        let again = normalize_questions(&serde_json::to_value(&first.value).unwrap());
        assert_eq!(again.value, first.value);
        assert!(again.repairs.is_empty(), "unexpected repairs: {:?}", again.repairs);
    }

    #[test]
    fn test_empty_payload_uses_starter_set() {
        for raw in [json!({"questions": []}), json!([]), json!("nothing useful")] {
            let normalized = normalize_questions(&raw);
            assert_eq!(normalized.value, starter_questions());
            assert!(normalized.was_repaired());
        }
    }

    #[test]
    fn test_missing_category_is_left_for_inference() {
        let raw = json!([{"id": "q1", "question": "Do you like videos?", "options": ["yes", "no"]}]);
        let normalized = normalize_questions(&raw);
        assert_eq!(normalized.value[0].category, None);
        assert!(normalized.repairs.is_empty());
    }
}
