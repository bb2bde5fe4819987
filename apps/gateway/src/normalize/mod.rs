//! Schema normalization: coerces loosely shaped AI payloads into strict domain objects.
//!
//! Every function here is total: malformed input is repaired with defaults, never
//! rejected. Each repair is returned to the caller and logged. Normalizing an
//! already-normalized value is a no-op and records no repairs.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub mod course;
pub mod json_extract;
pub mod persona;
pub mod progress;
pub mod questions;

pub use course::{
    normalize_course, normalize_exercises, normalize_lesson, normalize_lessons, normalize_module,
    normalize_section, normalize_session, CourseContext,
};
pub use persona::{
    normalize_persona_bundle, normalize_persona_content, normalize_persona_update,
    normalize_practice_problems,
};
pub use questions::normalize_questions;

use json_extract::extract_json;

/// One coercion applied while normalizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repair {
    /// Location in the source tree, e.g. `course.modules[1].lessons[0]`.
    pub path: String,
    pub detail: String,
}

/// A normalized value together with the repairs it needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub value: T,
    pub repairs: Vec<Repair>,
}

impl<T> Normalized<T> {
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn was_repaired(&self) -> bool {
        !self.repairs.is_empty()
    }
}

#[derive(Debug, Default)]
pub(crate) struct RepairLog {
    repairs: Vec<Repair>,
}

impl RepairLog {
    pub(crate) fn record(&mut self, path: &str, detail: impl Into<String>) {
        let detail = detail.into();
        debug!(path, "schema repair: {detail}");
        self.repairs.push(Repair {
            path: path.to_string(),
            detail,
        });
    }

    pub(crate) fn finish<T>(self, value: T, what: &str) -> Normalized<T> {
        if !self.repairs.is_empty() {
            warn!(
                repairs = self.repairs.len(),
                "{what} coerced with defaults; first: {} ({})",
                self.repairs[0].detail,
                self.repairs[0].path
            );
        }
        Normalized {
            value,
            repairs: self.repairs,
        }
    }
}

/// Turns any JSON node into an object. Strings are mined for embedded JSON and
/// otherwise become the entity's title.
pub(crate) fn coerce_object(raw: &Value, path: &str, log: &mut RepairLog) -> Map<String, Value> {
    match raw {
        Value::Object(map) => map.clone(),
        Value::String(text) => match extract_json(text) {
            Some(Value::Object(map)) => {
                log.record(path, "parsed object out of a text payload");
                map
            }
            _ => {
                let mut map = Map::new();
                if !text.trim().is_empty() {
                    map.insert("title".to_string(), Value::String(text.trim().to_string()));
                }
                log.record(path, "wrapped bare text as a title");
                map
            }
        },
        other => {
            log.record(path, format!("replaced non-object value ({})", kind_of(other)));
            Map::new()
        }
    }
}

/// Reads a collection field, tolerating a missing key, a single object, or text.
pub(crate) fn collection(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    log: &mut RepairLog,
) -> Vec<Value> {
    match map.get(key) {
        Some(Value::Array(items)) => items.clone(),
        None | Some(Value::Null) => {
            log.record(path, format!("missing {key}, defaulted to []"));
            Vec::new()
        }
        Some(Value::Object(obj)) => {
            log.record(path, format!("wrapped single {key} object in a list"));
            vec![Value::Object(obj.clone())]
        }
        Some(Value::String(text)) => match extract_json(text) {
            Some(Value::Array(items)) => {
                log.record(path, format!("parsed {key} out of a text payload"));
                items
            }
            _ => {
                log.record(path, format!("unreadable {key} text, defaulted to []"));
                Vec::new()
            }
        },
        Some(other) => {
            log.record(path, format!("{key} was {}, defaulted to []", kind_of(other)));
            Vec::new()
        }
    }
}

/// A sibling entity after ordering and id assignment.
pub(crate) struct Sibling {
    pub map: Map<String, Value>,
    pub id: String,
    pub index: usize,
    pub path: String,
}

/// Coerces, orders and identifies a list of sibling entities.
///
/// If any sibling carries a numeric `order`, siblings are stably sorted by it
/// (those without one keep their relative position after the rest). Ids are kept
/// when present and unique; otherwise `<kind>_<parent_id>_<n>` is assigned, with
/// `n` the one-based position.
pub(crate) fn prepare_siblings(
    items: Vec<Value>,
    kind: &str,
    parent_id: &str,
    base_path: &str,
    log: &mut RepairLog,
) -> Vec<Sibling> {
    let mut maps = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("{base_path}[{i}]");
        if item.is_null() {
            log.record(&path, format!("dropped null {kind}"));
            continue;
        }
        maps.push(coerce_object(item, &path, log));
    }

    if maps.iter().any(|m| order_of(m).is_some()) {
        // Stable: ties and order-less entries keep their relative position.
        maps.sort_by(|a, b| match (order_of(a), order_of(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }

    let explicit: Vec<Option<String>> = maps.iter().map(id_of).collect();
    let reserved: HashSet<&str> = explicit.iter().flatten().map(String::as_str).collect();
    let mut assigned: HashSet<String> = HashSet::new();

    let mut siblings = Vec::with_capacity(maps.len());
    for (index, (map, explicit_id)) in maps.into_iter().zip(explicit.iter()).enumerate() {
        let path = format!("{base_path}[{index}]");

        let id = match explicit_id {
            Some(id) if !assigned.contains(id) => {
                if !matches!(map.get("id"), Some(Value::String(_))) {
                    log.record(&path, "converted non-string id to string");
                }
                id.clone()
            }
            other => {
                let base = format!("{kind}_{parent_id}_{}", index + 1);
                let mut candidate = base.clone();
                let mut suffix = 2;
                while assigned.contains(&candidate) || reserved.contains(candidate.as_str()) {
                    candidate = format!("{base}_{suffix}");
                    suffix += 1;
                }
                match other {
                    Some(dup) => log.record(&path, format!("duplicate id '{dup}' replaced with '{candidate}'")),
                    None => log.record(&path, format!("assigned id '{candidate}'")),
                }
                candidate
            }
        };
        assigned.insert(id.clone());

        siblings.push(Sibling {
            map,
            id,
            index,
            path,
        });
    }
    siblings
}

/// Records a repair unless the entity's explicit `order` already equals `index`.
pub(crate) fn check_order(map: &Map<String, Value>, index: usize, path: &str, log: &mut RepairLog) {
    match map.get("order") {
        Some(Value::Number(n)) if n.as_u64() == Some(index as u64) => {}
        None | Some(Value::Null) => log.record(path, format!("assigned order {index}")),
        Some(other) => log.record(path, format!("renumbered order {other} to {index}")),
    }
}

pub(crate) fn order_of(map: &Map<String, Value>) -> Option<f64> {
    let order = match map.get("order")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    // "NaN" parses; sorting needs a total order.
    order.filter(|o: &f64| o.is_finite())
}

pub(crate) fn id_of(map: &Map<String, Value>) -> Option<String> {
    match map.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-empty string among `keys`.
pub(crate) fn text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// Reads a text field, recording a repair when it has to fall back to an alias
/// or to `default`. `keys[0]` is the canonical field name.
pub(crate) fn text_or(
    map: &Map<String, Value>,
    keys: &[&str],
    default: impl FnOnce() -> String,
    path: &str,
    log: &mut RepairLog,
) -> String {
    let canonical = map.get(keys[0]).and_then(Value::as_str);
    if let Some(value) = canonical.filter(|v| !v.trim().is_empty()) {
        return value.to_string();
    }
    if let Some(value) = text(map, &keys[1..]) {
        log.record(path, format!("read {} from an alias field", keys[0]));
        return value;
    }
    let fallback = default();
    match canonical {
        // An empty string is a legitimate value when there is nothing better to use.
        Some(value) if fallback.is_empty() => value.to_string(),
        _ => {
            log.record(path, format!("missing {}, defaulted", keys[0]));
            fallback
        }
    }
}

/// The list inside a list-shaped payload: a bare array, an object carrying the
/// list under `key`, or text containing either.
pub(crate) fn payload_list(raw: &Value, key: &str, path: &str, log: &mut RepairLog) -> Vec<Value> {
    match raw {
        Value::Array(items) => items.clone(),
        Value::Object(map) => collection(map, key, path, log),
        Value::String(text) => match extract_json(text) {
            Some(Value::Array(items)) => {
                log.record(path, format!("parsed {key} out of a text payload"));
                items
            }
            Some(Value::Object(map)) => {
                log.record(path, format!("parsed {key} out of a text payload"));
                collection(&map, key, path, log)
            }
            _ => {
                log.record(path, format!("unreadable {key} text, defaulted to []"));
                Vec::new()
            }
        },
        other => {
            log.record(path, format!("{key} payload was {}, defaulted to []", kind_of(other)));
            Vec::new()
        }
    }
}

/// Non-negative whole number from a number or numeric string.
pub(crate) fn count(map: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|key| {
        let n = match map.get(*key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => leading_number(s)?,
            _ => return None,
        };
        (n.is_finite() && n >= 0.0).then(|| n.round().min(u32::MAX as f64) as u32)
    })
}

/// Positive count field with a fallback, recorded as a repair when used.
pub(crate) fn positive_or(
    map: &Map<String, Value>,
    keys: &[&str],
    default: u32,
    path: &str,
    log: &mut RepairLog,
) -> u32 {
    let exact = map.get(keys[0]).and_then(Value::as_u64).filter(|n| *n > 0);
    if let Some(n) = exact.and_then(|n| u32::try_from(n).ok()) {
        return n;
    }
    // A zero under one key must not hide a usable alias.
    match keys.iter().find_map(|key| count(map, &[*key]).filter(|n| *n > 0)) {
        Some(n) => {
            log.record(path, format!("coerced {} to {n}", keys[0]));
            n
        }
        None => {
            log.record(path, format!("missing {}, defaulted to {default}", keys[0]));
            default
        }
    }
}

pub(crate) fn flag(map: &Map<String, Value>, key: &str, path: &str, log: &mut RepairLog) -> bool {
    match map.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => {
            log.record(path, format!("coerced {key} text to true"));
            true
        }
        Some(_) => {
            log.record(path, format!("coerced {key} to false"));
            false
        }
        None => {
            log.record(path, format!("missing {key}, defaulted to false"));
            false
        }
    }
}

/// Caller-supplied progress, clamped to 0..=100. `None` means derive it.
pub(crate) fn explicit_progress(
    map: &Map<String, Value>,
    path: &str,
    log: &mut RepairLog,
) -> Option<u8> {
    let raw = match map.get("progress")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => leading_number(s)?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    let clamped = raw.clamp(0.0, 100.0).round();
    if clamped != raw {
        log.record(path, format!("clamped progress {raw} to {clamped}"));
    }
    Some(clamped as u8)
}

/// Resolves a node's progress against the value derived from its children.
///
/// Returns the progress and whether it is caller-owned. A supplied `progress`
/// is kept when `manualProgress` is true or absent; with `manualProgress: false`
/// it must match the derived value.
pub(crate) fn progress_or(
    map: &Map<String, Value>,
    derived: u8,
    path: &str,
    log: &mut RepairLog,
) -> (u8, bool) {
    let explicit = explicit_progress(map, path, log);
    let manual = match map.get("manualProgress") {
        None => explicit.is_some(),
        Some(Value::Bool(manual)) => *manual,
        Some(other) => {
            log.record(path, format!("ignored manualProgress {other}"));
            explicit.is_some()
        }
    };
    match (explicit, manual) {
        (Some(progress), true) => (progress, true),
        (None, true) => {
            log.record(path, "manualProgress without progress, derived instead");
            (derived, false)
        }
        (Some(progress), false) if progress != derived => {
            log.record(path, format!("progress {progress} replaced by derived {derived}"));
            (derived, false)
        }
        _ => (derived, false),
    }
}

/// Percentage of completed children, `100 * done / max(1, total)`.
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    (100.0 * done as f64 / total.max(1) as f64).round() as u8
}

/// List of strings; non-string entries use their `title`/`text` field if any.
pub(crate) fn strings(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let Some(items) = keys.iter().find_map(|k| map.get(*k).and_then(Value::as_array)) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Object(obj) => text(obj, &["title", "text", "name"]),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn leading_number(s: &str) -> Option<f64> {
    let digits: String = s
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
