use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        for key in [
            "low_cost_model",
            "high_cost_model",
            "vision_model",
            "embedding_model",
            "evolution_model",
        ] {
            validate_non_empty_string_field(llm, &format!("llm.{}", key), key)?;
        }
        validate_u64_field(
            llm,
            "llm.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(knowledge) = expect_optional_object(root, "knowledge")? {
        validate_u64_field(knowledge, "knowledge.top_k", "top_k", 1, 100)?;
        validate_u64_field(
            knowledge,
            "knowledge.embed_batch_size",
            "embed_batch_size",
            1,
            2_048,
        )?;
    }

    if let Some(agent) = expect_optional_object(root, "agent")? {
        validate_optional_string_field(agent, "agent.persona", "persona")?;
        validate_u64_field(
            agent,
            "agent.failure_history_limit",
            "failure_history_limit",
            0,
            20,
        )?;
    }

    if let Some(evolution) = expect_optional_object(root, "evolution")? {
        validate_f64_field(evolution, "evolution.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(evolution, "evolution.max_tokens", "max_tokens", 1, 32_000)?;
        validate_u64_field(
            evolution,
            "evolution.stale_claim_minutes",
            "stale_claim_minutes",
            1,
            10_080,
        )?;
    }

    if let Some(admin) = expect_optional_object(root, "admin")? {
        validate_u64_field(
            admin,
            "admin.low_stock_threshold",
            "low_stock_threshold",
            0,
            1_000_000,
        )?;
        validate_u64_field(
            admin,
            "admin.claim_surge_threshold",
            "claim_surge_threshold",
            1,
            10_000,
        )?;
        validate_u64_field(
            admin,
            "admin.claim_surge_window_hours",
            "claim_surge_window_hours",
            1,
            8_760,
        )?;
        validate_u64_field(
            admin,
            "admin.negative_rating_threshold",
            "negative_rating_threshold",
            1,
            5,
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
