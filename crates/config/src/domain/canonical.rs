//! Canonical JSON form of parsed YAML
//!
//! Stored documents use JSON, which only allows string keys, so numeric and
//! boolean mapping keys (for example reasoning steps `1:`, `2:`) become
//! strings.

use serde_json::{Map, Number, Value as Json};
use serde_yaml::Value as Yaml;

pub fn yaml_to_json(value: &Yaml) -> Json {
    match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Json::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Json::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Json::Number)
                    .unwrap_or(Json::Null)
            }
        }
        Yaml::String(s) => Json::String(s.clone()),
        Yaml::Sequence(seq) => Json::Array(seq.iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(key_to_string(k), yaml_to_json(v));
            }
            Json::Object(out)
        }
        Yaml::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

fn key_to_string(key: &Yaml) -> String {
    match key {
        Yaml::String(s) => s.clone(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_keys_become_strings() {
        let yaml: Yaml = serde_yaml::from_str("steps:\n  1: first\n  2: second\n").unwrap();
        let json = yaml_to_json(&yaml);
        assert_eq!(json["steps"]["1"], "first");
        assert_eq!(json["steps"]["2"], "second");
    }

    #[test]
    fn test_scalars_keep_their_types() {
        let yaml: Yaml =
            serde_yaml::from_str("confidence: 0.9\ncount: 3\nflag: true\nnone: ~\n").unwrap();
        let json = yaml_to_json(&yaml);
        assert_eq!(json["confidence"], 0.9);
        assert_eq!(json["count"], 3);
        assert_eq!(json["flag"], true);
        assert!(json["none"].is_null());
    }
}
