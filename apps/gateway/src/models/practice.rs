use serde::{Deserialize, Serialize};

/// Standalone practice problem from `practice/problems`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeProblem {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Free text; the backend echoes whatever level was requested.
    pub difficulty: String,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    pub hints: Vec<String>,
    /// Minutes.
    pub expected_time: u32,
}
