use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::errors::ContentError;

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fence pattern is valid")
    })
}

/// Extracts the JSON object a model was asked to produce. Tolerates a surrounding
/// markdown fence or leading prose, nothing more.
pub fn extract_json_object(raw: &str) -> Result<Value, ContentError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ContentError::Empty);
    }

    let candidate = fence_pattern()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(ContentError::InvalidJson("expected a JSON object".to_string())),
        Err(first_err) => {
            let (Some(start), Some(end)) = (candidate.find('{'), candidate.rfind('}')) else {
                return Err(ContentError::InvalidJson(first_err.to_string()));
            };
            if end <= start {
                return Err(ContentError::InvalidJson(first_err.to_string()));
            }
            serde_json::from_str::<Value>(&candidate[start..=end])
                .map_err(|_| ContentError::InvalidJson(first_err.to_string()))
        }
    }
}

pub fn parse_json_object<T: DeserializeOwned>(raw: &str) -> Result<T, ContentError> {
    let value = extract_json_object(raw)?;
    serde_json::from_value(value).map_err(|e| ContentError::InvalidJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Reply {
        draft_reply: String,
    }

    #[test]
    fn parses_plain_object() {
        let reply: Reply = parse_json_object(r#"{"draft_reply": "감사합니다"}"#).unwrap();
        assert_eq!(reply.draft_reply, "감사합니다");
    }

    #[test]
    fn parses_fenced_object() {
        let raw = "```json\n{\"draft_reply\": \"ok\"}\n```";
        let reply: Reply = parse_json_object(raw).unwrap();
        assert_eq!(reply.draft_reply, "ok");
    }

    #[test]
    fn parses_object_after_prose() {
        let raw = "Here you go: {\"draft_reply\": \"ok\"} hope it helps";
        let reply: Reply = parse_json_object(raw).unwrap();
        assert_eq!(reply.draft_reply, "ok");
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_json_object::<Reply>("sorry, I cannot do that").unwrap_err();
        assert!(matches!(err, ContentError::InvalidJson(_)));
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            parse_json_object::<Reply>("   ").unwrap_err(),
            ContentError::Empty
        ));
    }
}
