//! Course tree normalization: Course → Module → Lesson → Session → Section.
//!
//! Parents are normalized before their children so default child ids can be
//! derived from the parent id. Aggregate progress is computed on the way back up.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::course::{
    Course, Difficulty, DurationClass, Exercise, Lesson, Module, Resource, SectionKind,
    SectionQuestion, Session, SessionSection,
};
use crate::normalize::{
    check_order, coerce_object, collection, flag, id_of, kind_of, payload_list,
    percent, positive_or, prepare_siblings, progress_or, strings, text, text_or, Normalized, RepairLog, Sibling,
};

/// Default lesson length in minutes.
pub const DEFAULT_LESSON_MINUTES: u32 = 60;
/// Default session length in minutes.
pub const DEFAULT_SESSION_MINUTES: u32 = 30;

/// What the caller asked for. Used only where the payload itself is silent.
#[derive(Debug, Clone, Default)]
pub struct CourseContext {
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub duration: Option<DurationClass>,
}

pub fn normalize_course(raw: &Value, ctx: &CourseContext) -> Normalized<Course> {
    let mut log = RepairLog::default();
    let course = course_from(raw, ctx, &mut log);
    log.finish(course, "course")
}

pub fn normalize_module(
    raw: &Value,
    course_id: &str,
    index: usize,
    duration: DurationClass,
) -> Normalized<Module> {
    let mut log = RepairLog::default();
    let sibling = lone(raw, "module", course_id, index, &mut log);
    let module = module_from(sibling, duration, &mut log);
    log.finish(module, "module")
}

pub fn normalize_lesson(raw: &Value, module_id: &str, index: usize) -> Normalized<Lesson> {
    let mut log = RepairLog::default();
    let sibling = lone(raw, "lesson", module_id, index, &mut log);
    let lesson = lesson_from(sibling, &mut log);
    log.finish(lesson, "lesson")
}

pub fn normalize_session(raw: &Value, lesson_id: &str, index: usize) -> Normalized<Session> {
    let mut log = RepairLog::default();
    let sibling = lone(raw, "session", lesson_id, index, &mut log);
    let session = session_from(sibling, &mut log);
    log.finish(session, "session")
}

pub fn normalize_section(raw: &Value, session_id: &str, index: usize) -> Normalized<SessionSection> {
    let mut log = RepairLog::default();
    let sibling = lone(raw, "section", session_id, index, &mut log);
    let section = section_from(sibling, &mut log);
    log.finish(section, "section")
}

/// Normalizes a freshly generated lesson list for `module_id`. Accepts a bare
/// array or an object carrying `lessons`.
pub fn normalize_lessons(raw: &Value, module_id: &str) -> Normalized<Vec<Lesson>> {
    let mut log = RepairLog::default();
    let items = payload_list(raw, "lessons", "lessons", &mut log);
    let lessons = prepare_siblings(items, "lesson", module_id, "lessons", &mut log)
        .into_iter()
        .map(|s| lesson_from(s, &mut log))
        .collect();
    log.finish(lessons, "lessons")
}

/// Normalizes a practice exercise list owned by `owner_id`. Accepts a bare array
/// or an object carrying `exercises`.
pub fn normalize_exercises(raw: &Value, owner_id: &str) -> Normalized<Vec<Exercise>> {
    let mut log = RepairLog::default();
    let items = payload_list(raw, "exercises", "exercises", &mut log);
    let exercises = prepare_siblings(items, "exercise", owner_id, "exercises", &mut log)
        .into_iter()
        .map(|s| exercise_from(s, &mut log))
        .collect();
    log.finish(exercises, "exercises")
}

fn course_from(raw: &Value, ctx: &CourseContext, log: &mut RepairLog) -> Course {
    let mut map = coerce_object(raw, "course", log);
    if !map.contains_key("modules") {
        if let Some(Value::Object(inner)) = map.get("course") {
            let inner = inner.clone();
            log.record("course", "unwrapped nested course object");
            map = inner;
        }
    }

    let id = match map.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        _ => {
            let id = id_of(&map).unwrap_or_else(|| format!("course_{}", Uuid::new_v4().simple()));
            log.record("course", format!("assigned id '{id}'"));
            id
        }
    };

    let topic = match (map.get("topic").and_then(Value::as_str), &ctx.topic) {
        (Some(topic), _) if !topic.trim().is_empty() => topic.to_string(),
        (_, Some(requested)) => {
            log.record("course", "missing topic, taken from request");
            requested.clone()
        }
        (Some(blank), None) => blank.to_string(),
        (None, None) => {
            log.record("course", "missing topic, defaulted to empty");
            String::new()
        }
    };

    let difficulty = enum_field(&map, "difficulty", ctx.difficulty, log);
    let duration = enum_field(&map, "duration", ctx.duration, log);

    let title = text_or(
        &map,
        &["title", "name"],
        || {
            if topic.trim().is_empty() {
                "Untitled Course".to_string()
            } else {
                format!("Course on {topic}")
            }
        },
        "course",
        log,
    );
    let description = text_or(&map, &["description", "summary"], String::new, "course", log);

    let items = collection(&map, "modules", "course", log);
    let modules: Vec<Module> = prepare_siblings(items, "module", &id, "course.modules", log)
        .into_iter()
        .map(|s| module_from(s, duration, log))
        .collect();

    let total_days = match map.get("totalDays").and_then(Value::as_u64) {
        Some(days) => u32::try_from(days).unwrap_or(u32::MAX),
        None => {
            let days = modules
                .iter()
                .fold(0u32, |acc, m| acc.saturating_add(m.duration));
            log.record("course", format!("derived totalDays {days} from modules"));
            days
        }
    };

    let done = modules.iter().filter(|m| m.completed).count();
    let (progress, manual_progress) = progress_or(&map, percent(done, modules.len()), "course", log);

    let prerequisites = list_field(&map, &["prerequisites"], "course", log);
    let learning_goals = list_field(
        &map,
        &["learningGoals", "learning_goals", "goals"],
        "course",
        log,
    );

    let created_at = ["createdAt", "created_at"]
        .iter()
        .find_map(|key| map.get(*key))
        .and_then(|v| serde_json::from_value::<DateTime<Utc>>(v.clone()).ok());
    let created_at = match created_at {
        Some(at) => at,
        None => {
            log.record("course", "missing createdAt, stamped now");
            Utc::now()
        }
    };

    Course {
        id,
        title,
        description,
        topic,
        difficulty,
        duration,
        total_days,
        modules,
        prerequisites,
        learning_goals,
        progress,
        manual_progress,
        completed: flag(&map, "completed", "course", log),
        created_at,
    }
}

fn module_from(s: Sibling, duration: DurationClass, log: &mut RepairLog) -> Module {
    let Sibling {
        map,
        id,
        index,
        path,
    } = s;
    check_order(&map, index, &path, log);

    let items = collection(&map, "lessons", &path, log);
    let lessons: Vec<Lesson> =
        prepare_siblings(items, "lesson", &id, &format!("{path}.lessons"), log)
            .into_iter()
            .map(|s| lesson_from(s, log))
            .collect();

    let done = lessons.iter().filter(|l| l.completed).count();
    let (progress, manual_progress) = progress_or(&map, percent(done, lessons.len()), &path, log);

    Module {
        title: text_or(
            &map,
            &["title", "name"],
            || format!("Module {}", index + 1),
            &path,
            log,
        ),
        description: text_or(&map, &["description", "summary"], String::new, &path, log),
        order: index,
        duration: positive_or(
            &map,
            &["duration", "durationDays"],
            duration.module_days(),
            &path,
            log,
        ),
        lessons,
        progress,
        manual_progress,
        completed: flag(&map, "completed", &path, log),
        id,
    }
}

fn lesson_from(s: Sibling, log: &mut RepairLog) -> Lesson {
    let Sibling {
        map,
        id,
        index,
        path,
    } = s;
    check_order(&map, index, &path, log);

    let items = collection(&map, "sessions", &path, log);
    let sessions: Vec<Session> =
        prepare_siblings(items, "session", &id, &format!("{path}.sessions"), log)
            .into_iter()
            .map(|s| session_from(s, log))
            .collect();

    let items = collection(&map, "exercises", &path, log);
    let exercises = prepare_siblings(items, "exercise", &id, &format!("{path}.exercises"), log)
        .into_iter()
        .map(|s| exercise_from(s, log))
        .collect();

    let items = collection(&map, "resources", &path, log);
    let resources = resources_from(items, &format!("{path}.resources"), log);

    let done = sessions.iter().filter(|s| s.completed).count();
    let (progress, manual_progress) = progress_or(&map, percent(done, sessions.len()), &path, log);

    Lesson {
        title: text_or(
            &map,
            &["title", "name"],
            || format!("Lesson {}", index + 1),
            &path,
            log,
        ),
        description: text_or(&map, &["description", "summary"], String::new, &path, log),
        content: text_or(&map, &["content", "contentSummary"], String::new, &path, log),
        order: index,
        duration: positive_or(
            &map,
            &["duration", "estimatedDuration"],
            DEFAULT_LESSON_MINUTES,
            &path,
            log,
        ),
        sessions,
        exercises,
        resources,
        progress,
        manual_progress,
        completed: flag(&map, "completed", &path, log),
        id,
    }
}

fn session_from(s: Sibling, log: &mut RepairLog) -> Session {
    let Sibling {
        map,
        id,
        index,
        path,
    } = s;
    check_order(&map, index, &path, log);

    let items = collection(&map, "sections", &path, log);
    let sections: Vec<SessionSection> =
        prepare_siblings(items, "section", &id, &format!("{path}.sections"), log)
            .into_iter()
            .map(|s| section_from(s, log))
            .collect();

    let done = sections.iter().filter(|s| s.completed).count();
    let (progress, manual_progress) = progress_or(&map, percent(done, sections.len()), &path, log);

    Session {
        title: text_or(
            &map,
            &["title", "name"],
            || format!("Session {}", index + 1),
            &path,
            log,
        ),
        learning_objective: text_or(
            &map,
            &["learningObjective", "learning_objective", "objective"],
            String::new,
            &path,
            log,
        ),
        order: index,
        duration: positive_or(
            &map,
            &["duration", "durationMinutes", "duration_minutes"],
            DEFAULT_SESSION_MINUTES,
            &path,
            log,
        ),
        sections,
        progress,
        manual_progress,
        completed: flag(&map, "completed", &path, log),
        id,
    }
}

fn section_from(s: Sibling, log: &mut RepairLog) -> SessionSection {
    let Sibling {
        map,
        id,
        index,
        path,
    } = s;
    check_order(&map, index, &path, log);

    let raw_kind = ["type", "kind", "sectionType"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str));
    let kind = match raw_kind.map(|k| (k, SectionKind::parse(k))) {
        Some((k, Some(kind))) => {
            if k != kind.as_str() {
                log.record(&path, format!("section type '{k}' read as '{}'", kind.as_str()));
            }
            kind
        }
        Some((k, None)) => {
            log.record(&path, format!("unknown section type '{k}', using content"));
            SectionKind::Content
        }
        None => {
            log.record(&path, "missing section type, using content");
            SectionKind::Content
        }
    };

    let questions = match optional_list(&map, "questions", &path, log) {
        Some(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, q)| section_question_from(q, &format!("{path}.questions[{i}]"), log))
            .collect(),
        None => Vec::new(),
    };
    let resources = match optional_list(&map, "resources", &path, log) {
        Some(items) => resources_from(items.clone(), &format!("{path}.resources"), log),
        None => Vec::new(),
    };

    SessionSection {
        kind,
        title: text_or(
            &map,
            &["title", "heading"],
            || format!("Section {}", index + 1),
            &path,
            log,
        ),
        content: text_or(&map, &["content", "body", "text"], String::new, &path, log),
        order: index,
        completed: flag(&map, "completed", &path, log),
        instructions: text(&map, &["instructions"]),
        expected_outcome: text(&map, &["expectedOutcome", "expected_outcome"]),
        questions,
        resources,
        id,
    }
}

/// A list that may be absent. Anything else under `key` is dropped with a repair.
fn optional_list<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
    log: &mut RepairLog,
) -> Option<&'a Vec<Value>> {
    match map.get(key)? {
        Value::Array(items) => Some(items),
        other => {
            log.record(path, format!("{key} was {}, dropped", kind_of(other)));
            None
        }
    }
}

fn section_question_from(raw: &Value, path: &str, log: &mut RepairLog) -> Option<SectionQuestion> {
    let Value::Object(map) = raw else {
        log.record(path, "dropped malformed question");
        return None;
    };
    let Some(question) = text(map, &["question", "text"]) else {
        log.record(path, "dropped question without text");
        return None;
    };
    let correct_answer = match map.get("correctAnswer").or_else(|| map.get("correct_answer")) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    Some(SectionQuestion {
        question,
        options: strings(map, &["options", "choices"]),
        correct_answer,
        explanation: text(map, &["explanation"]),
    })
}

fn exercise_from(s: Sibling, log: &mut RepairLog) -> Exercise {
    let Sibling {
        map,
        id,
        index,
        path,
    } = s;
    Exercise {
        question: text_or(
            &map,
            &["question", "title", "prompt", "description"],
            || format!("Exercise {}", index + 1),
            &path,
            log,
        ),
        steps: strings(&map, &["steps"]),
        solution: text(&map, &["solution", "answer"]),
        id,
    }
}

fn resources_from(items: Vec<Value>, base_path: &str, log: &mut RepairLog) -> Vec<Resource> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let path = format!("{base_path}[{i}]");
            match item {
                Value::String(title) if !title.trim().is_empty() => {
                    log.record(&path, "wrapped bare text resource");
                    Some(Resource {
                        title,
                        url: None,
                        kind: None,
                        description: None,
                    })
                }
                Value::Object(map) => Some(Resource {
                    title: text_or(
                        &map,
                        &["title", "name", "url"],
                        || format!("Resource {}", i + 1),
                        &path,
                        log,
                    ),
                    url: text(&map, &["url", "link"]),
                    kind: text(&map, &["type", "kind"]),
                    description: text(&map, &["description"]),
                }),
                _ => {
                    log.record(&path, "dropped malformed resource");
                    None
                }
            }
        })
        .collect()
}

/// A single entity normalized outside of a sibling list.
fn lone(raw: &Value, kind: &str, parent_id: &str, index: usize, log: &mut RepairLog) -> Sibling {
    let map = coerce_object(raw, kind, log);
    let id = match map.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        _ => {
            let id = id_of(&map).unwrap_or_else(|| format!("{kind}_{parent_id}_{}", index + 1));
            log.record(kind, format!("assigned id '{id}'"));
            id
        }
    };
    Sibling {
        map,
        id,
        index,
        path: kind.to_string(),
    }
}

/// Reads `difficulty`/`duration`, falling back to the request then the default.
fn enum_field<T>(map: &Map<String, Value>, key: &str, requested: Option<T>, log: &mut RepairLog) -> T
where
    T: std::str::FromStr + Default + Copy + std::fmt::Display,
{
    let raw = map.get(key).and_then(Value::as_str);
    match raw.map(|r| (r, r.parse::<T>())) {
        Some((r, Ok(value))) => {
            if r != value.to_string() {
                log.record("course", format!("{key} '{r}' read as '{value}'"));
            }
            value
        }
        _ => {
            let value = requested.unwrap_or_default();
            log.record("course", format!("missing or unknown {key}, using '{value}'"));
            value
        }
    }
}

fn list_field(map: &Map<String, Value>, keys: &[&str], path: &str, log: &mut RepairLog) -> Vec<String> {
    if !keys.iter().any(|k| map.get(*k).is_some_and(Value::is_array)) {
        log.record(path, format!("missing {}, defaulted to []", keys[0]));
    } else if !map.get(keys[0]).is_some_and(Value::is_array) {
        log.record(path, format!("read {} from an alias field", keys[0]));
    }
    strings(map, keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn ctx() -> CourseContext {
        CourseContext {
            topic: Some("Rust".to_string()),
            difficulty: Some(Difficulty::Intermediate),
            duration: Some(DurationClass::EightWeeks),
        }
    }

    fn messy_course() -> Value {
        json!({
            "title": "Rust in Depth",
            "modules": [
                {
                    "title": "Ownership",
                    "order": 2,
                    "lessons": [
                        {"title": "Borrowing", "estimatedDuration": "45", "completed": true},
                        "Lifetimes",
                        null
                    ]
                },
                {
                    "id": 7,
                    "title": "Basics",
                    "order": 1,
                    "duration": 3,
                    "lessons": {"title": "Hello", "sessions": [
                        {"title": "Setup", "sections": [
                            {"type": "intro", "content": "Install rustup"},
                            {"type": "diagram", "title": "Toolchain"},
                            {"type": "quiz", "questions": [
                                {"question": "Which tool?", "options": ["cargo", "npm"], "correctAnswer": 0},
                                "not a question"
                            ]}
                        ]}
                    ]}
                },
                {"title": "Traits", "lessons": [], "progress": 250}
            ]
        })
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let course = normalize_course(&messy_course(), &ctx()).value;

        assert!(course.id.starts_with("course_"));
        assert_eq!(course.topic, "Rust");
        assert_eq!(course.difficulty, Difficulty::Intermediate);
        assert_eq!(course.duration, DurationClass::EightWeeks);

        let titles: Vec<_> = course.modules.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Basics", "Ownership", "Traits"]);
        for (i, module) in course.modules.iter().enumerate() {
            assert_eq!(module.order, i);
        }

        let basics = &course.modules[0];
        assert_eq!(basics.id, "7");
        assert_eq!(basics.duration, 3);
        assert_eq!(basics.lessons.len(), 1);
        assert_eq!(basics.lessons[0].id, "lesson_7_1");
        assert_eq!(basics.lessons[0].duration, DEFAULT_LESSON_MINUTES);

        let ownership = &course.modules[1];
        assert_eq!(ownership.id, format!("module_{}_2", course.id));
        assert_eq!(ownership.duration, DurationClass::EightWeeks.module_days());
        assert_eq!(ownership.lessons.len(), 2);
        assert_eq!(ownership.lessons[0].duration, 45);
        assert_eq!(ownership.lessons[1].title, "Lifetimes");
        assert_eq!(ownership.progress, 50);
        assert!(!ownership.completed);

        assert_eq!(course.modules[2].progress, 100);
        assert_eq!(course.total_days, 3 + 9 + 9);
        assert_eq!(course.progress, 0);
    }

    #[test]
    fn test_sections_are_repaired() {
        let course = normalize_course(&messy_course(), &ctx()).value;
        let session = &course.modules[0].lessons[0].sessions[0];
        assert_eq!(session.duration, DEFAULT_SESSION_MINUTES);

        let kinds: Vec<_> = session.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SectionKind::Introduction, SectionKind::Content, SectionKind::Assessment]
        );
        assert_eq!(session.sections[2].title, "Section 3");
        assert_eq!(session.sections[2].questions.len(), 1);
        assert_eq!(
            session.sections[2].questions[0].correct_answer.as_deref(),
            Some("0")
        );
        assert_eq!(session.sections[0].id, format!("section_{}_1", session.id));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let first = normalize_course(&messy_course(), &ctx());
        assert!(first.was_repaired());

        let again = normalize_course(
            &serde_json::to_value(&first.value).unwrap(),
            &CourseContext::default(),
        );
        assert_eq!(again.value, first.value);
        assert!(again.repairs.is_empty(), "unexpected repairs: {:?}", again.repairs);
    }

    #[test]
    fn test_idempotent_for_empty_and_garbage_input() {
        for raw in [json!(null), json!("no json here"), json!(42), json!({})] {
            let first = normalize_course(&raw, &CourseContext::default()).value;
            assert!(first.modules.is_empty());
            let again =
                normalize_course(&serde_json::to_value(&first).unwrap(), &CourseContext::default());
            assert_eq!(again.value, first);
            assert!(again.repairs.is_empty());
        }
    }

    #[test]
    fn test_text_payload_is_parsed() {
        let raw = json!("Here is your course:\n```json\n{\"title\": \"Go\", \"modules\": [{\"title\": \"Intro\"}]}\n```");
        let course = normalize_course(&raw, &CourseContext::default()).value;
        assert_eq!(course.title, "Go");
        assert_eq!(course.modules.len(), 1);
        assert_eq!(course.duration, DurationClass::FourWeeks);
        assert_eq!(course.modules[0].duration, 4);
    }

    #[test]
    fn test_nested_course_object_is_unwrapped() {
        let raw = json!({"course": {"id": "c1", "modules": [{"title": "A"}]}});
        let course = normalize_course(&raw, &ctx()).value;
        assert_eq!(course.id, "c1");
        assert_eq!(course.title, "Course on Rust");
        assert_eq!(course.modules[0].id, "module_c1_1");
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let raw = json!({
            "id": "c1",
            "topic": "SQL",
            "difficulty": "advanced",
            "duration": "2-weeks",
            "totalDays": 30,
            "progress": 40,
            "modules": [{"id": "m1", "title": "Joins", "lessons": [], "completed": true}]
        });
        let course = normalize_course(&raw, &ctx()).value;
        assert_eq!(course.topic, "SQL");
        assert_eq!(course.difficulty, Difficulty::Advanced);
        assert_eq!(course.duration, DurationClass::TwoWeeks);
        assert_eq!(course.total_days, 30);
        assert_eq!(course.progress, 40);
        assert!(course.modules[0].completed);
        assert_eq!(course.modules[0].duration, 2);
    }

    #[test]
    fn test_normalize_lessons_accepts_wrapped_list() {
        let raw = json!({"lessons": [{"title": "A"}, {"title": "B", "order": 0}]});
        let lessons = normalize_lessons(&raw, "m1").value;
        assert_eq!(lessons[0].title, "B");
        assert_eq!(lessons[1].title, "A");
        assert_eq!(lessons[0].id, "lesson_m1_1");

        let again = normalize_lessons(&serde_json::to_value(&lessons).unwrap(), "m1");
        assert_eq!(again.value, lessons);
        assert!(again.repairs.is_empty());
    }

    #[test]
    fn test_normalize_session_standalone() {
        let raw = json!({"title": "Pattern matching", "duration_minutes": 45, "sections": []});
        let session = normalize_session(&raw, "l1", 2).value;
        assert_eq!(session.id, "session_l1_3");
        assert_eq!(session.order, 2);
        assert_eq!(session.duration, 45);
    }

    #[test]
    fn test_normalize_module_and_section_standalone() {
        let module = normalize_module(&json!({"title": "Async"}), "c9", 0, DurationClass::TwelveWeeks);
        assert_eq!(module.value.id, "module_c9_1");
        assert_eq!(module.value.duration, 14);

        let section = normalize_section(&json!({"type": "activity"}), "s1", 1).value;
        assert_eq!(section.kind, SectionKind::Activity);
        assert_eq!(section.order, 1);

        let lesson = normalize_lesson(&json!({"contentSummary": "Futures"}), "m1", 0).value;
        assert_eq!(lesson.content, "Futures");
    }

    #[test]
    fn test_normalize_exercises_from_practice_payload() {
        let raw = json!({
            "title": "Practice",
            "exercises": [
                {"id": "exercise_1", "question": "Write a loop", "steps": ["a", "b"], "solution": "for x in xs {}"},
                {"prompt": "Explain borrowing"}
            ]
        });
        let exercises = normalize_exercises(&raw, "practice").value;
        assert_eq!(exercises[0].id, "exercise_1");
        assert_eq!(exercises[0].steps.len(), 2);
        assert_eq!(exercises[1].id, "exercise_practice_2");
        assert_eq!(exercises[1].question, "Explain borrowing");
    }

    #[test]
    fn test_total_days_saturates_instead_of_overflowing() {
        let raw = json!({
            "id": "c1",
            "modules": [
                {"id": "m1", "duration": 3000000000u64},
                {"id": "m2", "duration": 3000000000u64}
            ]
        });
        let course = normalize_course(&raw, &ctx()).value;
        assert_eq!(course.modules[0].duration, 3_000_000_000);
        assert_eq!(course.total_days, u32::MAX);
    }

    #[test]
    fn test_zero_duration_falls_back_to_alias() {
        let raw = json!({"title": "Closures", "duration": 0, "estimatedDuration": 45});
        let lesson = normalize_lesson(&raw, "m1", 0).value;
        assert_eq!(lesson.duration, 45);
    }

    #[test]
    fn test_malformed_section_lists_are_reported() {
        let raw = json!({"type": "assessment", "questions": "see below", "resources": null});
        let section = normalize_section(&raw, "s1", 0);
        assert!(section.value.questions.is_empty());
        assert!(section.value.resources.is_empty());

        let details: Vec<_> = section.repairs.iter().map(|r| r.detail.as_str()).collect();
        assert!(details.contains(&"questions was text, dropped"), "{details:?}");
        assert!(details.contains(&"resources was null, dropped"), "{details:?}");
    }

    #[test]
    fn test_non_finite_order_is_ignored() {
        let raw = json!({"id": "c1", "modules": [
            {"id": "a", "order": "NaN"},
            {"id": "b", "order": 0},
            {"id": "c", "order": "inf"}
        ]});
        let course = normalize_course(&raw, &ctx()).value;
        let ids: Vec<_> = course.modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    const KEYS: &[&str] = &[
        "id", "order", "title", "name", "description", "summary", "topic", "difficulty",
        "duration", "estimatedDuration", "totalDays", "progress", "manualProgress", "completed",
        "modules", "lessons", "sessions", "sections", "exercises", "resources", "questions",
        "options", "type", "content", "url", "learningGoals", "goals", "createdAt", "course",
    ];

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            (-5i64..500).prop_map(Value::from),
            (-10.0f64..250.0).prop_map(Value::from),
            prop::sample::select(vec![
                "",
                "  ",
                "0",
                "45 minutes",
                "NaN",
                "quiz",
                "intro",
                "Advanced",
                "8-weeks",
                "true",
                "m1",
                "lesson_m1_1",
                "2024-03-01T10:00:00Z",
                "```json\n{\"title\": \"Traits\"}\n```",
            ])
            .prop_map(Value::from),
        ]
    }

    fn json_tree() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(4, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map(prop::sample::select(KEYS.to_vec()), inner, 0..6)
                    .prop_map(|fields| {
                        Value::Object(
                            fields
                                .into_iter()
                                .map(|(key, value)| (key.to_string(), value))
                                .collect(),
                        )
                    }),
            ]
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn test_normalize_is_idempotent_for_any_tree(raw in json_tree()) {
            let first = normalize_course(&raw, &CourseContext::default()).value;
            let again = normalize_course(
                &serde_json::to_value(&first).unwrap(),
                &CourseContext::default(),
            );
            prop_assert_eq!(&again.value, &first);
            prop_assert!(again.repairs.is_empty(), "unexpected repairs: {:?}", again.repairs);
        }
    }
}
