//! Response extraction and normalisation
//!
//! Models wrap JSON in prose or markdown fences and drift from the exact
//! intent shape in a few predictable ways. `extract_json` recovers the
//! object; `normalize` rewrites the known drifts before the schema check.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::IntentContext;

/// Pull a JSON value out of raw model output
///
/// Tried in order: the whole text, a ```json fence, any ``` fence, the
/// outermost `{...}` span.
pub fn extract_json(raw: &str) -> Result<Value, String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err("model returned an empty response".to_string());
    }

    let mut candidates: Vec<&str> = vec![text];
    if let Some(block) = fenced(text, "```json") {
        candidates.push(block);
    }
    if let Some(block) = fenced(text, "```") {
        candidates.push(block);
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            candidates.push(&text[start..=end]);
        }
    }

    let mut last_error = None;
    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }
    Err(match last_error {
        Some(e) => format!("could not extract JSON from model output: {}", e),
        None => "could not extract JSON from model output".to_string(),
    })
}

fn fenced<'a>(text: &'a str, opening: &str) -> Option<&'a str> {
    let start = text.find(opening)? + opening.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Rewrite known drifts and stamp engine-owned fields
///
/// - string items in `entities_involved` become `{type: ENTITY, name}`
/// - `payload: {explicit, implicit}` splits into `payload` and `inferred`
/// - `intent_summary` fills a missing `rationale`
/// - a single string `target_path` becomes a one-item list
/// - `intent_id` gets a fresh UUID unless the model supplied one
/// - `domain_pack_id` always comes from the context
pub fn normalize(value: Value, context: &IntentContext) -> Value {
    let Value::Object(mut obj) = value else {
        return value;
    };

    if let Some(Value::Array(items)) = obj.get_mut("entities_involved") {
        for item in items.iter_mut() {
            match item {
                Value::String(name) => {
                    let mut entity = Map::new();
                    entity.insert("type".to_string(), Value::from("ENTITY"));
                    entity.insert("name".to_string(), Value::String(std::mem::take(name)));
                    *item = Value::Object(entity);
                }
                Value::Object(entity) if entity.contains_key("name") => {
                    entity
                        .entry("type")
                        .or_insert_with(|| Value::from("ENTITY"));
                }
                _ => {}
            }
        }
    }

    if let Some(Value::Object(payload)) = obj.get("payload") {
        let split = !payload.is_empty()
            && payload.keys().all(|k| k == "explicit" || k == "implicit");
        if split {
            let mut payload = payload.clone();
            let explicit = payload
                .remove("explicit")
                .filter(|v| !v.is_null())
                .unwrap_or_else(|| Value::Object(Map::new()));
            let implicit = payload.remove("implicit").filter(|v| !v.is_null());
            obj.insert("payload".to_string(), explicit);
            if let Some(implicit) = implicit {
                if !obj.get("inferred").is_some_and(|v| !v.is_null()) {
                    obj.insert("inferred".to_string(), implicit);
                }
            }
        }
    }

    if let Some(summary) = obj.remove("intent_summary") {
        let has_rationale = obj
            .get("rationale")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !has_rationale && !summary.is_null() {
            obj.insert("rationale".to_string(), summary);
        }
    }

    if let Some(Value::String(path)) = obj.get("target_path") {
        let path = path.clone();
        obj.insert("target_path".to_string(), Value::Array(vec![Value::String(path)]));
    }

    let has_id = obj
        .get("intent_id")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    if !has_id {
        obj.insert(
            "intent_id".to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
    }
    obj.insert(
        "domain_pack_id".to_string(),
        Value::String(context.domain_pack_id.clone()),
    );

    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> IntentContext {
        IntentContext::new("pack-9", "Legal", "Legal domain", "add Judge").unwrap()
    }

    #[test]
    fn test_extract_plain_json() {
        let value = extract_json(r#" {"operation": "ADD"} "#).unwrap();
        assert_eq!(value["operation"], "ADD");
    }

    #[test]
    fn test_extract_fenced_json() {
        let raw = "Here is the intent:\n```json\n{\"operation\": \"REMOVE\"}\n```\nLet me know.";
        assert_eq!(extract_json(raw).unwrap()["operation"], "REMOVE");

        let raw = "```\n{\"operation\": \"MERGE\"}\n```";
        assert_eq!(extract_json(raw).unwrap()["operation"], "MERGE");
    }

    #[test]
    fn test_extract_braced_span_from_prose() {
        let raw = "Sure! {\"operation\": \"SPLIT\", \"payload\": {\"a\": 1}} Hope that helps.";
        assert_eq!(extract_json(raw).unwrap()["payload"]["a"], 1);
    }

    #[test]
    fn test_extract_failure() {
        assert!(extract_json("").is_err());
        assert!(extract_json("I cannot help with that.").is_err());
        assert!(extract_json("{\"operation\": ").is_err());
    }

    #[test]
    fn test_normalize_entities_and_payload() {
        let value = normalize(
            json!({
                "entities_involved": ["Judge", {"name": "Court"}],
                "payload": {"explicit": {"name": "Judge"}, "implicit": {"type": "PERSON"}},
                "intent_summary": "Add Judge",
                "target_path": "Judge"
            }),
            &context(),
        );
        assert_eq!(
            value["entities_involved"],
            json!([{"type": "ENTITY", "name": "Judge"}, {"type": "ENTITY", "name": "Court"}])
        );
        assert_eq!(value["payload"], json!({"name": "Judge"}));
        assert_eq!(value["inferred"], json!({"type": "PERSON"}));
        assert_eq!(value["rationale"], "Add Judge");
        assert!(value.get("intent_summary").is_none());
        assert_eq!(value["target_path"], json!(["Judge"]));
        assert_eq!(value["domain_pack_id"], "pack-9");
        assert!(Uuid::parse_str(value["intent_id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_normalize_keeps_model_fields() {
        let value = normalize(
            json!({
                "intent_id": "model-id",
                "domain_pack_id": "other-pack",
                "rationale": "kept",
                "intent_summary": "dropped",
                "payload": {"name": "Judge", "explicit": true}
            }),
            &context(),
        );
        assert_eq!(value["intent_id"], "model-id");
        assert_eq!(value["domain_pack_id"], "pack-9");
        assert_eq!(value["rationale"], "kept");
        assert_eq!(value["payload"], json!({"name": "Judge", "explicit": true}));
    }

    #[test]
    fn test_normalize_leaves_non_objects() {
        assert_eq!(normalize(json!([1, 2]), &context()), json!([1, 2]));
    }
}
