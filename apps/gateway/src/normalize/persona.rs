//! Persona, learner-profile and practice-problem normalization.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::persona::{
    Persona, PersonaBundle, PersonaContent, PersonaContentKind, PersonaRole, PersonaUpdate,
    UserProfile,
};
use crate::models::practice::PracticeProblem;
use crate::normalize::{
    coerce_object, id_of, kind_of, payload_list, positive_or, prepare_siblings, strings, text,
    text_or, Normalized, RepairLog, Sibling,
};

/// Default practice problem length in minutes.
pub const DEFAULT_PROBLEM_MINUTES: u32 = 10;

/// Normalizes a `persona/generate` payload for `topic`.
pub fn normalize_persona_bundle(raw: &Value, topic: &str) -> Normalized<PersonaBundle> {
    let mut log = RepairLog::default();
    let map = coerce_object(raw, "persona_bundle", &mut log);

    let persona = persona_from(member(&map, "persona", &mut log), topic, None, &mut log);
    let user_profile = profile_from(member(&map, "userProfile", &mut log), topic, &mut log);
    let initial_content = content_from(
        member(&map, "initialContent", &mut log),
        &persona.id,
        topic,
        PersonaContentKind::Introduction,
        "initialContent",
        &mut log,
    );

    let bundle = PersonaBundle {
        user_profile,
        persona,
        initial_content,
    };
    log.finish(bundle, "persona")
}

/// Normalizes a `persona/update` payload. The persona keeps `persona_id` unless
/// the backend names another one.
pub fn normalize_persona_update(raw: &Value, persona_id: &str) -> Normalized<PersonaUpdate> {
    let mut log = RepairLog::default();
    let map = coerce_object(raw, "persona_update", &mut log);

    let persona = persona_from(member(&map, "persona", &mut log), "", Some(persona_id), &mut log);
    let content = match map.get("content") {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let topic = persona.specialties.first().cloned().unwrap_or_default();
            Some(content_from(
                coerce_object(raw, "content", &mut log),
                &persona.id,
                &topic,
                PersonaContentKind::Introduction,
                "content",
                &mut log,
            ))
        }
    };
    log.finish(PersonaUpdate { persona, content }, "persona update")
}

pub fn normalize_persona_content(
    raw: &Value,
    persona_id: &str,
    topic: &str,
    kind: PersonaContentKind,
) -> Normalized<PersonaContent> {
    let mut log = RepairLog::default();
    let map = coerce_object(raw, "content", &mut log);
    let content = content_from(map, persona_id, topic, kind, "content", &mut log);
    log.finish(content, "persona content")
}

/// Normalizes a `practice/problems` payload. Accepts a bare array or an object
/// carrying `problems`.
pub fn normalize_practice_problems(
    raw: &Value,
    topic: &str,
    difficulty: &str,
) -> Normalized<Vec<PracticeProblem>> {
    let mut log = RepairLog::default();
    let items = payload_list(raw, "problems", "problems", &mut log);
    let problems = prepare_siblings(items, "problem", "practice", "problems", &mut log)
        .into_iter()
        .map(|s| problem_from(s, topic, difficulty, &mut log))
        .collect();
    log.finish(problems, "practice problems")
}

fn persona_from(
    mut map: Map<String, Value>,
    topic: &str,
    known_id: Option<&str>,
    log: &mut RepairLog,
) -> Persona {
    let path = "persona";
    if !map.contains_key("name") {
        if let Some(Value::Object(inner)) = map.get("teachingPersona") {
            let inner = inner.clone();
            log.record(path, "unwrapped teachingPersona object");
            map = inner;
        }
    }
    let subject = subject(topic);

    let id = match (id_of(&map), known_id) {
        (Some(id), _) if matches!(map.get("id"), Some(Value::String(_))) => id,
        (found, known) => {
            let id = found
                .or_else(|| known.map(str::to_string))
                .unwrap_or_else(|| format!("persona_{}", Uuid::new_v4().simple()));
            log.record(path, format!("assigned id '{id}'"));
            id
        }
    };

    let role = match map.get("role").and_then(Value::as_str) {
        Some(raw) => match PersonaRole::parse(raw) {
            Some(role) => {
                if raw != role.as_str() {
                    log.record(path, format!("role '{raw}' read as '{}'", role.as_str()));
                }
                role
            }
            None => {
                log.record(path, format!("unknown role '{raw}', using teacher"));
                PersonaRole::Teacher
            }
        },
        None => {
            log.record(path, "missing role, using teacher");
            PersonaRole::Teacher
        }
    };

    let image_url = match map.get("imageUrl") {
        Some(Value::String(url)) if !url.trim().is_empty() => Some(url.clone()),
        None | Some(Value::Null) => None,
        Some(other) => {
            log.record(path, format!("dropped imageUrl ({})", kind_of(other)));
            None
        }
    };

    let (created_at, updated_at) = stamps(&map, path, log);
    Persona {
        name: text_or(&map, &["name"], || format!("AI Teacher for {subject}"), path, log),
        description: text_or(
            &map,
            &["description"],
            || format!("A helpful AI teacher focused on {subject}."),
            path,
            log,
        ),
        role,
        specialties: list_or(
            &map,
            "specialties",
            || vec![subject.to_string(), "Interactive Learning".into(), "Personalized Education".into()],
            path,
            log,
        ),
        teaching_style: text_or(
            &map,
            &["teachingStyle", "teaching_style"],
            || "Adaptive and responsive to learner needs".to_string(),
            path,
            log,
        ),
        tone: text_or(&map, &["tone"], || "Supportive and encouraging".to_string(), path, log),
        background: text_or(
            &map,
            &["background"],
            || format!("Specialized in teaching {subject} with a focus on practical applications"),
            path,
            log,
        ),
        characteristics: list_or(
            &map,
            "characteristics",
            || owned(&["Patient", "Clear", "Knowledgeable", "Adaptable", "Supportive"]),
            path,
            log,
        ),
        supporting_qualities: list_or(
            &map,
            "supportingQualities",
            || owned(&["Clear explanations", "Practical examples", "Personalized feedback"]),
            path,
            log,
        ),
        image_url,
        user_profile_id: text_or(&map, &["userProfileId"], || "default".to_string(), path, log),
        created_at,
        updated_at,
        id,
    }
}

fn profile_from(map: Map<String, Value>, topic: &str, log: &mut RepairLog) -> UserProfile {
    let path = "userProfile";
    let id = match map.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        _ => {
            let id = id_of(&map).unwrap_or_else(|| format!("profile_{}", Uuid::new_v4().simple()));
            log.record(path, format!("assigned id '{id}'"));
            id
        }
    };
    let (created_at, updated_at) = stamps(&map, path, log);
    UserProfile {
        goals: list_or(
            &map,
            "goals",
            || owned(&["Learn practical skills", "Understand core concepts", "Apply knowledge effectively"]),
            path,
            log,
        ),
        learning_style: text_or(&map, &["learningStyle"], || "Mixed".to_string(), path, log),
        strengths: list_or(
            &map,
            "strengths",
            || owned(&["Self-motivated", "Technical aptitude", "Problem-solving"]),
            path,
            log,
        ),
        weaknesses: list_or(
            &map,
            "weaknesses",
            || owned(&["Limited time availability", "Needs practical examples"]),
            path,
            log,
        ),
        content_preferences: list_or(
            &map,
            "contentPreferences",
            || owned(&["Interactive exercises", "Real-world examples", "Visual aids"]),
            path,
            log,
        ),
        time_availability: text_or(&map, &["timeAvailability"], || "Limited".to_string(), path, log),
        background: text_or(&map, &["background"], || "Beginner".to_string(), path, log),
        interests: list_or(&map, "interests", || vec![subject(topic).to_string()], path, log),
        created_at,
        updated_at,
        id,
    }
}

fn content_from(
    map: Map<String, Value>,
    persona_id: &str,
    topic: &str,
    kind: PersonaContentKind,
    path: &str,
    log: &mut RepairLog,
) -> PersonaContent {
    let id = match map.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        _ => {
            let id = id_of(&map).unwrap_or_else(|| format!("content_{}", Uuid::new_v4().simple()));
            log.record(path, format!("assigned id '{id}'"));
            id
        }
    };
    let kind = match map.get("type").and_then(Value::as_str) {
        Some(raw) => match raw.parse::<PersonaContentKind>() {
            Ok(parsed) => {
                if raw != parsed.as_str() {
                    log.record(path, format!("type '{raw}' read as '{parsed}'"));
                }
                parsed
            }
            Err(_) => {
                log.record(path, format!("unknown type '{raw}', using '{kind}'"));
                kind
            }
        },
        None => {
            log.record(path, format!("missing type, using '{kind}'"));
            kind
        }
    };
    let topic = text_or(&map, &["topic"], || topic.to_string(), path, log);
    let (created_at, updated_at) = stamps(&map, path, log);
    PersonaContent {
        persona_id: text_or(&map, &["personaId", "persona_id"], || persona_id.to_string(), path, log),
        title: text_or(
            &map,
            &["title"],
            || default_title(kind, subject(&topic)),
            path,
            log,
        ),
        content: text_or(&map, &["content", "body", "text"], String::new, path, log),
        topic,
        kind,
        created_at,
        updated_at,
        id,
    }
}

fn problem_from(s: Sibling, topic: &str, difficulty: &str, log: &mut RepairLog) -> PracticeProblem {
    let Sibling {
        map,
        id,
        index,
        path,
    } = s;
    let difficulty = text_or(&map, &["difficulty"], || difficulty.to_string(), &path, log);
    PracticeProblem {
        title: text_or(
            &map,
            &["title", "name"],
            || format!("Problem {}", index + 1),
            &path,
            log,
        ),
        description: text_or(
            &map,
            &["description", "problem", "question"],
            String::new,
            &path,
            log,
        ),
        category: text_or(&map, &["category"], || "General Practice".to_string(), &path, log),
        tags: list_or(
            &map,
            "tags",
            || vec![topic.trim().to_string(), difficulty.clone()],
            &path,
            log,
        ),
        solution: text(&map, &["solution", "answer"]),
        hints: list_or(
            &map,
            "hints",
            || owned(&["Break the problem down into steps", "Think about similar examples you've seen before"]),
            &path,
            log,
        ),
        expected_time: positive_or(
            &map,
            &["expectedTime", "expected_time", "estimatedTime"],
            DEFAULT_PROBLEM_MINUTES,
            &path,
            log,
        ),
        difficulty,
        id,
    }
}

/// An object-valued member; anything else is replaced by an empty object.
fn member(map: &Map<String, Value>, key: &str, log: &mut RepairLog) -> Map<String, Value> {
    match map.get(key) {
        Some(raw) => coerce_object(raw, key, log),
        None => {
            log.record(key, format!("missing {key}, built from defaults"));
            Map::new()
        }
    }
}

/// Non-empty string list under `key`, or `default` with a repair.
fn list_or(
    map: &Map<String, Value>,
    key: &str,
    default: impl FnOnce() -> Vec<String>,
    path: &str,
    log: &mut RepairLog,
) -> Vec<String> {
    let items = strings(map, &[key]);
    if !items.is_empty() {
        return items;
    }
    log.record(path, format!("missing {key}, defaulted"));
    default()
}

/// `createdAt`/`updatedAt`. Naive timestamps are read as UTC; a missing
/// `updatedAt` copies `createdAt`.
fn stamps(map: &Map<String, Value>, path: &str, log: &mut RepairLog) -> (DateTime<Utc>, DateTime<Utc>) {
    let created_at = match timestamp(map.get("createdAt")) {
        Some(at) => at,
        None => {
            log.record(path, "missing createdAt, stamped now");
            Utc::now()
        }
    };
    let updated_at = match timestamp(map.get("updatedAt")) {
        Some(at) => at,
        None => {
            log.record(path, "missing updatedAt, copied createdAt");
            created_at
        }
    };
    (created_at, updated_at)
}

fn timestamp(raw: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = raw?.as_str()?.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn subject(topic: &str) -> &str {
    match topic.trim() {
        "" => "your subject",
        trimmed => trimmed,
    }
}

fn default_title(kind: PersonaContentKind, subject: &str) -> String {
    match kind {
        PersonaContentKind::Introduction => format!("Introduction to {subject}"),
        PersonaContentKind::Summary => format!("Summary of {subject}"),
        PersonaContentKind::Explanation => format!("Understanding {subject}"),
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
