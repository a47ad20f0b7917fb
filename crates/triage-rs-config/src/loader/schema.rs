//! Schema validation helpers for triage JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
///
/// Every layer is checked on its own, so fields are optional here; required
/// values come from serde defaults on the merged config.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &["$schema", "agent", "ai", "data", "memory", "audit"],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("agent") {
        validate_agent(value, layer, "agent")?;
    }
    if let Some(value) = map.get("ai") {
        validate_ai(value, layer, "ai")?;
    }
    if let Some(value) = map.get("data") {
        validate_data(value, layer, "data")?;
    }
    if let Some(value) = map.get("memory") {
        validate_memory(value, layer, "memory")?;
    }
    if let Some(value) = map.get("audit") {
        validate_audit(value, layer, "audit")?;
    }
    Ok(())
}

/// Validate the "agent" block.
fn validate_agent(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["node_id", "version", "bind_addr"], layer, path)?;

    for key in ["node_id", "version", "bind_addr"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("bind_addr").and_then(Value::as_str)
        && value.parse::<std::net::SocketAddr>().is_err()
    {
        return Err(invalid_field(
            layer,
            &join_path(path, "bind_addr"),
            "expected socket address (host:port)",
        ));
    }
    Ok(())
}

/// Validate the "ai" block.
fn validate_ai(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["provider", "model", "api_key_env", "temperature", "max_tokens"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("provider") {
        let provider_path = join_path(path, "provider");
        let provider = value
            .as_str()
            .ok_or_else(|| invalid_field(layer, &provider_path, "expected string"))?;
        if !matches!(provider, "openai" | "groq") {
            return Err(invalid_field(
                layer,
                &provider_path,
                "expected one of: openai, groq",
            ));
        }
    }
    for key in ["model", "api_key_env"] {
        if let Some(value) = map.get(key) {
            expect_non_empty_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("temperature") {
        let temperature = value.as_f64().ok_or_else(|| {
            invalid_field(layer, &join_path(path, "temperature"), "expected number")
        })?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(invalid_field(
                layer,
                &join_path(path, "temperature"),
                "expected number between 0.0 and 2.0",
            ));
        }
    }
    if let Some(value) = map.get("max_tokens") {
        match value.as_u64() {
            Some(tokens) if tokens > 0 && tokens <= u64::from(u32::MAX) => {}
            _ => {
                return Err(invalid_field(
                    layer,
                    &join_path(path, "max_tokens"),
                    "expected positive integer",
                ));
            }
        }
    }
    Ok(())
}

/// Validate the "data" block.
fn validate_data(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["patients_path"], layer, path)?;

    if let Some(value) = map.get("patients_path") {
        expect_string(value, layer, &join_path(path, "patients_path"))?;
    }
    Ok(())
}

/// Validate the "memory" block.
fn validate_memory(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["provider", "path"], layer, path)?;

    if let Some(value) = map.get("provider") {
        let provider_path = join_path(path, "provider");
        let provider = value
            .as_str()
            .ok_or_else(|| invalid_field(layer, &provider_path, "expected string"))?;
        if !matches!(provider, "in_memory" | "file") {
            return Err(invalid_field(
                layer,
                &provider_path,
                "expected one of: in_memory, file",
            ));
        }
    }
    if let Some(value) = map.get("path") {
        expect_string(value, layer, &join_path(path, "path"))?;
    }
    Ok(())
}

/// Validate the "audit" block.
fn validate_audit(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["logged_by"], layer, path)?;

    if let Some(value) = map.get("logged_by") {
        expect_non_empty_string(value, layer, &join_path(path, "logged_by"))?;
    }
    Ok(())
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

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

fn expect_non_empty_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value.as_str() {
        Some(text) if !text.trim().is_empty() => Ok(()),
        Some(_) => Err(invalid_field(layer, path, "must not be empty")),
        None => Err(invalid_field(layer, path, "expected string")),
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
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
