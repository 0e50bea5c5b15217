//! System-prompt block built from recalled memories and entity observations.

use mnemon_rs_protocol::{EntityState, MemoryRecord, MemoryType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Preamble used when none is configured.
pub const DEFAULT_PREAMBLE: &str =
    "The following are relevant memories about this user from previous conversations.";

/// Controls how memories are rendered into a system prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptOptions {
    /// Overrides [`DEFAULT_PREAMBLE`].
    #[serde(default)]
    pub preamble: Option<String>,
    /// Keep at most this many memories, in input order.
    #[serde(default)]
    pub max_memories: Option<usize>,
    /// Only render these memory types; untyped memories are dropped when set.
    #[serde(default)]
    pub include_types: Option<Vec<MemoryType>>,
    #[serde(default = "default_include_entities")]
    pub include_entities: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            preamble: None,
            max_memories: None,
            include_types: None,
            include_entities: default_include_entities(),
        }
    }
}

fn default_include_entities() -> bool {
    true
}

/// Render memories and entity observations as a system-prompt section.
///
/// Returns an empty string when there is nothing to show after filtering.
pub fn format_memories_as_system_prompt(
    memories: &[MemoryRecord],
    entities: Option<&BTreeMap<String, EntityState>>,
    options: &PromptOptions,
) -> String {
    let mut selected: Vec<&MemoryRecord> = memories
        .iter()
        .filter(|memory| match &options.include_types {
            Some(allowed) => memory
                .memory_type
                .as_ref()
                .is_some_and(|kind| allowed.contains(kind)),
            None => true,
        })
        .collect();
    if let Some(limit) = options.max_memories {
        selected.truncate(limit);
    }

    let entities: Vec<&EntityState> = if options.include_entities {
        entities
            .map(|map| {
                map.values()
                    .filter(|entity| !entity.observations.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    if selected.is_empty() && entities.is_empty() {
        return String::new();
    }

    let mut sections = vec![
        options
            .preamble
            .clone()
            .unwrap_or_else(|| DEFAULT_PREAMBLE.to_string()),
    ];

    if !selected.is_empty() {
        let mut block = String::from("<memories>\n");
        for memory in selected {
            block.push_str("- ");
            block.push_str(&memory.text);
            if let Some(kind) = &memory.memory_type {
                block.push_str(&format!(" [{kind}]"));
            }
            block.push('\n');
        }
        block.push_str("</memories>");
        sections.push(block);
    }

    if !entities.is_empty() {
        let mut block = String::from("<entity_observations>\n");
        for entity in entities {
            block.push_str(&format!("## {}\n", entity.canonical_name));
            for observation in &entity.observations {
                block.push_str(&format!("- {}\n", observation.text));
            }
        }
        block.push_str("</entity_observations>");
        sections.push(block);
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_PREAMBLE, PromptOptions, format_memories_as_system_prompt};
    use mnemon_rs_protocol::{EntityObservation, EntityState, MemoryRecord, MemoryType};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn entity_map() -> BTreeMap<String, EntityState> {
        let mut map = BTreeMap::new();
        map.insert(
            "e1".to_string(),
            EntityState {
                entity_id: "e1".to_string(),
                canonical_name: "Igor".to_string(),
                observations: vec![
                    EntityObservation {
                        text: "Igor is CTO".to_string(),
                        mentioned_at: None,
                    },
                    EntityObservation {
                        text: "Igor lives in Lisbon".to_string(),
                        mentioned_at: None,
                    },
                ],
            },
        );
        map
    }

    #[test]
    fn empty_inputs_render_nothing() {
        let options = PromptOptions::default();
        assert_eq!(format_memories_as_system_prompt(&[], None, &options), "");
        let empty = BTreeMap::new();
        assert_eq!(
            format_memories_as_system_prompt(&[], Some(&empty), &options),
            ""
        );
    }

    #[test]
    fn renders_memories_and_entities() {
        let memories = vec![
            MemoryRecord::new("m1", "Igor is CTO").with_type(MemoryType::World),
            MemoryRecord::new("m2", "No type here"),
        ];
        let entities = entity_map();
        let rendered =
            format_memories_as_system_prompt(&memories, Some(&entities), &PromptOptions::default());
        let expected = format!(
            "{DEFAULT_PREAMBLE}\n\n\
             <memories>\n- Igor is CTO [world]\n- No type here\n</memories>\n\n\
             <entity_observations>\n## Igor\n- Igor is CTO\n- Igor lives in Lisbon\n</entity_observations>"
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn type_filter_drops_untyped_and_unlisted() {
        let memories = vec![
            MemoryRecord::new("m1", "fact").with_type(MemoryType::World),
            MemoryRecord::new("m2", "insight").with_type(MemoryType::Observation),
            MemoryRecord::new("m3", "untyped"),
        ];
        let options = PromptOptions {
            preamble: Some("Known:".to_string()),
            include_types: Some(vec![MemoryType::World]),
            ..PromptOptions::default()
        };
        assert_eq!(
            format_memories_as_system_prompt(&memories, None, &options),
            "Known:\n\n<memories>\n- fact [world]\n</memories>"
        );
    }

    #[test]
    fn filtered_to_nothing_renders_nothing() {
        let memories = vec![MemoryRecord::new("m1", "untyped")];
        let options = PromptOptions {
            include_types: Some(vec![MemoryType::World]),
            include_entities: false,
            ..PromptOptions::default()
        };
        let entities = entity_map();
        assert_eq!(
            format_memories_as_system_prompt(&memories, Some(&entities), &options),
            ""
        );
    }

    #[test]
    fn truncates_to_max_memories() {
        let memories = vec![
            MemoryRecord::new("m1", "one"),
            MemoryRecord::new("m2", "two"),
            MemoryRecord::new("m3", "three"),
        ];
        let options = PromptOptions {
            preamble: Some("P".to_string()),
            max_memories: Some(2),
            ..PromptOptions::default()
        };
        assert_eq!(
            format_memories_as_system_prompt(&memories, None, &options),
            "P\n\n<memories>\n- one\n- two\n</memories>"
        );
    }
}
