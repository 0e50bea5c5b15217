//! Schema validation helpers for mnemon JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(map, &["$schema", "memory", "prompt", "client"], layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("memory") {
        validate_memory(value, layer, "memory")?;
    }
    if let Some(value) = map.get("prompt") {
        validate_prompt(value, layer, "prompt")?;
    }
    if let Some(value) = map.get("client") {
        validate_client(value, layer, "client")?;
    }
    Ok(())
}

/// Validate the "memory" block.
fn validate_memory(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["bank_id", "recall", "retain"], layer, path)?;

    if let Some(value) = map.get("bank_id") {
        nullable(value, |v| expect_string(v, layer, &join_path(path, "bank_id")))?;
    }
    if let Some(value) = map.get("recall") {
        validate_recall(value, layer, &join_path(path, "recall"))?;
    }
    if let Some(value) = map.get("retain") {
        validate_retain(value, layer, &join_path(path, "retain"))?;
    }
    Ok(())
}

/// Validate the "memory.recall" block.
fn validate_recall(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    let allowed = [
        "enabled",
        "budget",
        "max_tokens",
        "types",
        "include_entities",
        "max_entity_tokens",
        "dedup_threshold",
    ];
    ensure_allowed_keys(map, &allowed, layer, path)?;

    for key in ["enabled", "include_entities"] {
        if let Some(value) = map.get(key) {
            expect_bool(value, layer, &join_path(path, key))?;
        }
    }
    for key in ["max_tokens", "max_entity_tokens"] {
        if let Some(value) = map.get(key) {
            nullable(value, |v| expect_u64(v, layer, &join_path(path, key)))?;
        }
    }
    if let Some(value) = map.get("budget") {
        validate_budget(value, layer, &join_path(path, "budget"))?;
    }
    if let Some(value) = map.get("types") {
        nullable(value, |v| {
            validate_string_array(v, layer, &join_path(path, "types"))
        })?;
    }
    if let Some(value) = map.get("dedup_threshold") {
        nullable(value, |v| {
            validate_unit_interval(v, layer, &join_path(path, "dedup_threshold"))
        })?;
    }
    Ok(())
}

/// Validate the "memory.retain" block.
fn validate_retain(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["enabled", "async", "context", "tags", "metadata"],
        layer,
        path,
    )?;

    for key in ["enabled", "async"] {
        if let Some(value) = map.get(key) {
            expect_bool(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("context") {
        nullable(value, |v| expect_string(v, layer, &join_path(path, "context")))?;
    }
    if let Some(value) = map.get("tags") {
        validate_string_array(value, layer, &join_path(path, "tags"))?;
    }
    if let Some(value) = map.get("metadata") {
        validate_string_map(value, layer, &join_path(path, "metadata"))?;
    }
    Ok(())
}

/// Validate the "prompt" block.
fn validate_prompt(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["preamble", "max_memories", "include_types", "include_entities"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("preamble") {
        nullable(value, |v| expect_string(v, layer, &join_path(path, "preamble")))?;
    }
    if let Some(value) = map.get("max_memories") {
        nullable(value, |v| expect_u64(v, layer, &join_path(path, "max_memories")))?;
    }
    if let Some(value) = map.get("include_types") {
        nullable(value, |v| {
            validate_string_array(v, layer, &join_path(path, "include_types"))
        })?;
    }
    if let Some(value) = map.get("include_entities") {
        expect_bool(value, layer, &join_path(path, "include_entities"))?;
    }
    Ok(())
}

/// Validate the "client" block.
fn validate_client(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["provider", "base_url", "api_key_env", "timeout_secs", "cli"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("provider") {
        validate_provider(value, layer, &join_path(path, "provider"))?;
    }
    if let Some(value) = map.get("base_url") {
        expect_string(value, layer, &join_path(path, "base_url"))?;
    }
    if let Some(value) = map.get("api_key_env") {
        nullable(value, |v| {
            expect_string(v, layer, &join_path(path, "api_key_env"))
        })?;
    }
    if let Some(value) = map.get("timeout_secs") {
        expect_u64(value, layer, &join_path(path, "timeout_secs"))?;
    }
    if let Some(value) = map.get("cli") {
        let cli_path = join_path(path, "cli");
        let cli = expect_object(value, layer, &cli_path)?;
        ensure_allowed_keys(cli, &["program", "inline_limit"], layer, &cli_path)?;
        if let Some(value) = cli.get("program") {
            expect_string(value, layer, &join_path(&cli_path, "program"))?;
        }
        if let Some(value) = cli.get("inline_limit") {
            expect_u64(value, layer, &join_path(&cli_path, "inline_limit"))?;
        }
    }
    Ok(())
}

fn validate_budget(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Some(budget) = value.as_str() else {
        return Err(invalid_field(layer, path, "expected string"));
    };
    if matches!(budget, "low" | "mid" | "high") {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "invalid budget"))
    }
}

fn validate_provider(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Some(provider) = value.as_str() else {
        return Err(invalid_field(layer, path, "expected string"));
    };
    if matches!(provider, "http" | "cli") {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "invalid client provider"))
    }
}

fn validate_unit_interval(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value.as_f64() {
        Some(number) if (0.0..=1.0).contains(&number) => Ok(()),
        Some(_) => Err(invalid_field(layer, path, "expected number within [0, 1]")),
        None => Err(invalid_field(layer, path, "expected number")),
    }
}

/// Run `check` unless the value is an explicit `null`.
fn nullable(
    value: &Value,
    check: impl FnOnce(&Value) -> Result<(), ConfigError>,
) -> Result<(), ConfigError> {
    if value.is_null() { Ok(()) } else { check(value) }
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Validate that a value is an array of strings.
fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Value::Array(entries) = value else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    for (idx, entry) in entries.iter().enumerate() {
        expect_string(entry, layer, &format!("{path}[{idx}]"))?;
    }
    Ok(())
}

/// Validate that a value is an object whose values are strings.
fn validate_string_map(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    for (key, entry) in map {
        expect_string(entry, layer, &join_path(path, key))?;
    }
    Ok(())
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

/// Join nested paths for error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
