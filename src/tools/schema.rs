use schemars::JsonSchema;
use serde_json::Value;

/// Parameter schema for a tool definition. Drops the meta keys the function
/// calling API does not expect.
pub fn parameters_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null);
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    value
}

/// Every violation of `schema` by `instance`, as readable messages.
pub fn validate(schema: &Value, instance: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| vec![format!("invalid tool schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(instance).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::args::{CustomerInfoArgs, TopMarginArgs};
    use serde_json::json;

    #[test]
    fn generated_schema_is_an_object_without_meta_keys() {
        let schema = parameters_schema::<CustomerInfoArgs>();
        assert_eq!(schema["type"], "object");
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("title").is_none());
        assert_eq!(schema["required"], json!(["customer_id"]));
    }

    #[test]
    fn validation_reports_missing_required_field() {
        let schema = parameters_schema::<CustomerInfoArgs>();
        let errors = validate(&schema, &json!({})).unwrap_err();
        assert!(errors[0].contains("customer_id"));
    }

    #[test]
    fn validation_enforces_ranges_and_types() {
        let schema = parameters_schema::<TopMarginArgs>();
        assert!(validate(&schema, &json!({ "limit": 5, "period_days": 30 })).is_ok());
        assert!(validate(&schema, &json!({})).is_ok());
        assert!(validate(&schema, &json!({ "limit": 0 })).is_err());
        assert!(validate(&schema, &json!({ "limit": "three" })).is_err());
    }
}
