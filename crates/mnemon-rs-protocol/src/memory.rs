//! Memory engine data model and retain/recall/reflect request shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a recalled memory.
///
/// Unknown kinds reported by the engine are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemoryType {
    /// Objective fact about the world or the user.
    World,
    /// Something the assistant itself did or went through.
    Experience,
    /// Synthesized insight derived from other memories.
    Observation,
    /// Any other engine-defined kind.
    Other(String),
}

impl MemoryType {
    /// Wire name of the memory type.
    pub fn as_str(&self) -> &str {
        match self {
            MemoryType::World => "world",
            MemoryType::Experience => "experience",
            MemoryType::Observation => "observation",
            MemoryType::Other(value) => value.as_str(),
        }
    }

    /// Human-facing label used in compact memory lines.
    pub fn label(&self) -> &str {
        match self {
            MemoryType::World => "fact",
            MemoryType::Observation => "insight",
            MemoryType::Experience => "experience",
            MemoryType::Other(value) => value.as_str(),
        }
    }
}

impl From<&str> for MemoryType {
    fn from(value: &str) -> Self {
        match value {
            "world" => MemoryType::World,
            "experience" => MemoryType::Experience,
            "observation" => MemoryType::Observation,
            other => MemoryType::Other(other.to_string()),
        }
    }
}

impl From<String> for MemoryType {
    fn from(value: String) -> Self {
        MemoryType::from(value.as_str())
    }
}

impl From<MemoryType> for String {
    fn from(value: MemoryType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recalled fact, experience, or observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Identifier, unique within one recall response.
    pub id: String,
    /// Memory text, possibly containing model-generated markdown.
    pub text: String,
    /// Memory kind; `None` when the engine did not report one.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub memory_type: Option<MemoryType>,
    /// Linked entity names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
    /// Free-form context label supplied at retain time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Start of the interval the memory describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_start: Option<DateTime<Utc>>,
    /// End of the interval the memory describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_end: Option<DateTime<Utc>>,
    /// When the memory was stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentioned_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
}

impl MemoryRecord {
    /// Create an untyped, undated record.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the memory type.
    pub fn with_type(mut self, memory_type: MemoryType) -> Self {
        self.memory_type = Some(memory_type);
        self
    }

    /// Set the start of the event interval.
    pub fn with_occurred_start(mut self, occurred_start: DateTime<Utc>) -> Self {
        self.occurred_start = Some(occurred_start);
        self
    }

    /// Set the storage timestamp.
    pub fn with_mentioned_at(mut self, mentioned_at: DateTime<Utc>) -> Self {
        self.mentioned_at = Some(mentioned_at);
        self
    }

    /// Timestamp used for temporal labels: event start, falling back to storage time.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.occurred_start.or(self.mentioned_at)
    }
}

/// Previously recalled fact cited by a reflect answer.
pub type Fact = MemoryRecord;

/// One observation attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityObservation {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentioned_at: Option<DateTime<Utc>>,
}

/// Engine-maintained state for a named entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Stable identifier.
    pub entity_id: String,
    /// Canonical display name.
    pub canonical_name: String,
    /// Observations in engine order.
    #[serde(default)]
    pub observations: Vec<EntityObservation>,
}

/// Effort level for recall and reflect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Low,
    #[default]
    Mid,
    High,
}

impl Budget {
    /// Wire name of the budget.
    pub fn as_str(self) -> &'static str {
        match self {
            Budget::Low => "low",
            Budget::Mid => "mid",
            Budget::High => "high",
        }
    }
}

/// Options for a retain call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetainOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Ask the engine to process the content in the background.
    #[serde(default, rename = "async")]
    pub is_async: bool,
}

/// Result of a retain call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainResponse {
    pub success: bool,
    pub bank_id: String,
    #[serde(default)]
    pub items_count: usize,
    #[serde(default, rename = "async")]
    pub is_async: bool,
}

/// Options for a recall call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecallOptions {
    /// Restrict results to these memory types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<MemoryType>>,
    /// Token budget for returned memories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(default)]
    pub trace: bool,
    /// Reference time for temporal queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub include_entities: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entity_tokens: Option<usize>,
    #[serde(default)]
    pub include_chunks: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunk_tokens: Option<usize>,
}

/// Result of a recall call; `results` are ordered best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecallResponse {
    #[serde(default)]
    pub results: Vec<MemoryRecord>,
    /// Entity states keyed by entity id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<BTreeMap<String, EntityState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<serde_json::Value>,
}

/// Options for a reflect call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

/// Result of a reflect call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on: Option<Vec<Fact>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn memory_type_labels_map_known_kinds() {
        assert_eq!(MemoryType::World.label(), "fact");
        assert_eq!(MemoryType::Observation.label(), "insight");
        assert_eq!(MemoryType::Experience.label(), "experience");
        assert_eq!(MemoryType::from("opinion").label(), "opinion");
    }

    #[test]
    fn record_parses_without_type_and_keeps_unknown_kinds() {
        let untyped: MemoryRecord = serde_json::from_value(json!({
            "id": "m1",
            "text": "Igor is CTO",
        }))
        .expect("untyped record");
        assert_eq!(untyped.memory_type, None);
        assert_eq!(untyped.mentioned_at, None);

        let custom: MemoryRecord = serde_json::from_value(json!({
            "id": "m2",
            "text": "prefers tea",
            "type": "opinion",
            "mentioned_at": "2025-03-01T10:00:00Z",
        }))
        .expect("typed record");
        assert_eq!(
            custom.memory_type,
            Some(MemoryType::Other("opinion".to_string()))
        );
        let value = serde_json::to_value(&custom).expect("serialize");
        assert_eq!(value["type"], json!("opinion"));
    }

    #[test]
    fn reference_time_prefers_occurred_start() {
        let mentioned = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let occurred = mentioned - Duration::days(3);
        let record = MemoryRecord::new("m1", "text").with_mentioned_at(mentioned);
        assert_eq!(record.reference_time(), Some(mentioned));
        let record = record.with_occurred_start(occurred);
        assert_eq!(record.reference_time(), Some(occurred));
        assert_eq!(MemoryRecord::new("m2", "text").reference_time(), None);
    }

    #[test]
    fn retain_options_use_async_wire_name() {
        let options = RetainOptions {
            is_async: true,
            tags: Some(vec!["chat".to_string()]),
            ..RetainOptions::default()
        };
        let value = serde_json::to_value(&options).expect("serialize");
        assert_eq!(value, json!({ "async": true, "tags": ["chat"] }));
    }

    #[test]
    fn recall_response_tolerates_missing_entities() {
        let response: RecallResponse = serde_json::from_value(json!({
            "results": [{ "id": "m1", "text": "one", "type": "world" }]
        }))
        .expect("response");
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.entities, None);
        assert_eq!(Budget::default().as_str(), "mid");
    }
}
