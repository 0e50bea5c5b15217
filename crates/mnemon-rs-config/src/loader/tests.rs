//! Tests for layered configuration loading.

use super::*;
use crate::{ClientProvider, RecallConfig};
use mnemon_rs_protocol::{Budget, MemoryType};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Layer options rooted in a temp project with no user layer.
fn project_options(root: &Path) -> (PathBuf, LayeredConfigOptions) {
    let project_root = root.join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    let mut options = LayeredConfigOptions::new(&cwd);
    options.user_config_path = None;
    (project_root, options)
}

#[test]
fn parse_minimal_config() {
    let config = MnemonConfig::load_from_str("{}").expect("config");
    assert_eq!(config, MnemonConfig::default());
    assert_eq!(config.memory.recall.enabled, true);
    assert_eq!(config.memory.recall.dedup_threshold, Some(0.65));
    assert_eq!(config.memory.retain.enabled, false);
    assert_eq!(config.memory.retain.is_async, true);
    assert_eq!(config.client.provider, ClientProvider::Http);
    assert_eq!(config.client.cli.inline_limit, 65536);
}

#[test]
fn parse_full_config() {
    let json5 = r#"{
        // comments and trailing commas are fine
        memory: {
            bank_id: "user-bank",
            recall: { budget: "high", max_tokens: 2048, types: ["world", "observation"],
                      include_entities: false, dedup_threshold: null },
            retain: { enabled: true, async: false, context: "chat", tags: ["slack"],
                      metadata: { team: "core" } },
        },
        prompt: { preamble: "Known facts:", max_memories: 5, include_types: ["world"] },
        client: { provider: "cli", cli: { program: "hindsight --profile dev", inline_limit: 1024 } },
    }"#;
    let config = MnemonConfig::load_from_str(json5).expect("config");
    assert_eq!(config.memory.bank_id.as_deref(), Some("user-bank"));
    assert_eq!(
        config.memory.recall,
        RecallConfig {
            enabled: true,
            budget: Budget::High,
            max_tokens: Some(2048),
            types: Some(vec![MemoryType::World, MemoryType::Observation]),
            include_entities: false,
            max_entity_tokens: None,
            dedup_threshold: None,
        }
    );
    assert_eq!(config.memory.retain.is_async, false);
    assert_eq!(config.memory.retain.metadata.get("team").map(String::as_str), Some("core"));
    assert_eq!(config.prompt.max_memories, Some(5));
    assert_eq!(config.client.provider, ClientProvider::Cli);
    assert_eq!(config.client.cli.program, "hindsight --profile dev");
}

#[test]
fn rejects_unknown_keys_with_path() {
    let err = MnemonConfig::load_from_str(r#"{ unexpected: true }"#).unwrap_err();
    assert!(format!("{err}").contains("unknown key"));

    let err = MnemonConfig::load_from_str(r#"{ memory: { recall: { top_k: 3 } } }"#).unwrap_err();
    assert!(format!("{err}").contains("memory.recall.top_k"));
}

#[test]
fn rejects_invalid_field_values() {
    let err = MnemonConfig::load_from_str(r#"{ memory: { recall: { budget: "max" } } }"#)
        .unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("memory.recall.budget"));
    assert!(msg.contains("invalid budget"));

    let err = MnemonConfig::load_from_str(r#"{ client: { provider: "grpc" } }"#).unwrap_err();
    assert!(format!("{err}").contains("client.provider"));

    let err = MnemonConfig::load_from_str(r#"{ memory: { recall: { dedup_threshold: 1.5 } } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("memory.recall.dedup_threshold"));

    let err = MnemonConfig::load_from_str(r#"{ memory: { retain: { metadata: { n: 1 } } } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("memory.retain.metadata.n"));
}

#[test]
fn rejects_blank_bank_and_zero_limits() {
    let err = MnemonConfig::load_from_str(r#"{ memory: { bank_id: "  " } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = MnemonConfig::load_from_str(r#"{ client: { timeout_secs: 0 } }"#).unwrap_err();
    assert!(format!("{err}").contains("timeout_secs"));
}

#[test]
fn reports_json5_syntax_errors() {
    let err = MnemonConfig::load_from_str("{ memory: ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseFailed(_)));
}

#[test]
fn load_from_path_reads_file() {
    let temp = TempDir::new().expect("tmp");
    let path = temp.path().join(DEFAULT_CONFIG_FILE);
    write_json5(&path, r#"{ memory: { bank_id: "from-file" } }"#);
    let config = MnemonConfig::load_from_path(&path).expect("config");
    assert_eq!(config.memory.bank_id.as_deref(), Some("from-file"));

    let err = MnemonConfig::load_from_path(temp.path().join("missing.json5")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

#[test]
fn layered_config_prefers_cwd_over_project_over_user() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (project_root, mut options) = project_options(root);

    let user_config = root.join("user.json5");
    write_json5(
        &user_config,
        r#"{ memory: { bank_id: "user", recall: { budget: "low" } }, prompt: { max_memories: 3 } }"#,
    );
    options.user_config_path = Some(user_config);

    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ memory: { bank_id: "project", recall: { budget: "high" } } }"#,
    );
    write_json5(
        &options.cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ memory: { bank_id: "cwd" } }"#,
    );

    let layered = MnemonConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.memory.bank_id.as_deref(), Some("cwd"));
    assert_eq!(layered.config.memory.recall.budget, Budget::High);
    assert_eq!(layered.config.prompt.max_memories, Some(3));
    let sources: Vec<ConfigLayerSource> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd
        ]
    );
}

#[test]
fn runtime_layers_apply_last_and_null_disables_dedup() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (project_root, options) = project_options(root);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ memory: { recall: { dedup_threshold: 0.8 } } }"#,
    );

    let runtime = root.join("runtime.json5");
    write_json5(&runtime, r#"{ memory: { recall: { dedup_threshold: null } } }"#);

    let layered = MnemonConfig::load_layered_with_options(options.with_runtime_path(&runtime))
        .expect("layered");
    assert_eq!(layered.config.memory.recall.dedup_threshold, None);
    assert_eq!(
        layered.layers.last().map(|layer| layer.source),
        Some(ConfigLayerSource::Runtime)
    );
}

#[test]
fn project_and_cwd_layer_load_once_when_same_dir() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    fs::create_dir_all(root.join(".git")).expect("git");
    write_json5(
        &root.join(DEFAULT_CONFIG_FILE),
        r#"{ memory: { bank_id: "root" } }"#,
    );
    let mut options = LayeredConfigOptions::new(root);
    options.user_config_path = None;

    let layered = MnemonConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::Project);
}

#[test]
fn invalid_layer_names_its_source() {
    let temp = TempDir::new().expect("tmp");
    let (_, options) = project_options(temp.path());
    write_json5(
        &options.cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ client: { timeout_secs: "soon" } }"#,
    );
    let err = MnemonConfig::load_layered_with_options(options).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("));
    assert!(msg.contains("client.timeout_secs"));
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let (_, options) = project_options(temp.path());
    let options = options.with_runtime_path(temp.path().join("absent.json5"));
    let err = MnemonConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}
