//! Bundle pruning.
//!
//! A recursive walk over a JSON value that bounds its size: long strings
//! are cut to `max_string_len` characters including a trailing ellipsis,
//! arrays keep their first `max_array_len` items, and containers nested at
//! or beyond `max_depth` collapse to [`TRUNCATED`]. `serde_json::Value` is
//! a tree, so the depth cap is the only recursion guard needed.
//!
//! Pruning is idempotent: `prune(prune(v)) == prune(v)`.

use serde_json::{Map, Value};
use steward_config::PruneConfig;

/// Replacement for containers nested too deeply.
pub const TRUNCATED: &str = "[truncated]";

const ELLIPSIS: char = '…';

/// Bounded copy of `value`.
pub fn prune(value: &Value, config: &PruneConfig) -> Value {
    walk(value, config, 0)
}

/// Prune an object and keep at most `max_keys` of its entries.
pub fn prune_map(map: &Map<String, Value>, config: &PruneConfig, max_keys: usize) -> Map<String, Value> {
    map.iter()
        .take(max_keys)
        .map(|(k, v)| (k.clone(), walk(v, config, 1)))
        .collect()
}

fn walk(value: &Value, config: &PruneConfig, depth: usize) -> Value {
    match value {
        Value::String(s) => Value::String(truncate_str(s, config.max_string_len)),
        Value::Array(_) | Value::Object(_) if depth >= config.max_depth => {
            Value::String(truncate_str(TRUNCATED, config.max_string_len))
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(config.max_array_len)
                .map(|v| walk(v, config, depth + 1))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), walk(v, config, depth + 1)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Cut to at most `max` characters, the last being an ellipsis.
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(max_string_len: usize, max_array_len: usize, max_depth: usize) -> PruneConfig {
        PruneConfig {
            max_string_len,
            max_array_len,
            max_depth,
        }
    }

    #[test]
    fn long_strings_end_with_ellipsis() {
        let out = prune(&json!("abcdefghij"), &config(5, 10, 8));
        assert_eq!(out, json!("abcd…"));
        assert_eq!(out.as_str().unwrap().chars().count(), 5);
        assert_eq!(prune(&json!("abc"), &config(5, 10, 8)), json!("abc"));
    }

    #[test]
    fn multibyte_strings_cut_on_char_boundaries() {
        let out = prune(&json!("ééééééé"), &config(4, 10, 8));
        assert_eq!(out, json!("ééé…"));
    }

    #[test]
    fn arrays_are_capped() {
        let out = prune(&json!([1, 2, 3, 4, 5]), &config(100, 3, 8));
        assert_eq!(out, json!([1, 2, 3]));
    }

    #[test]
    fn deep_nesting_collapses() {
        let value = json!({"a": {"b": {"c": [1]}}});
        let out = prune(&value, &config(100, 10, 2));
        assert_eq!(out, json!({"a": {"b": TRUNCATED}}));
    }

    #[test]
    fn pruning_is_idempotent() {
        let value = json!({
            "note": "x".repeat(50),
            "rows": (0..30).map(|i| json!({"i": i, "name": "y".repeat(i)})).collect::<Vec<_>>(),
            "deep": {"a": {"b": {"c": {"d": "e"}}}},
            "n": 1.5,
            "flag": true,
            "none": null,
        });
        for cfg in [config(10, 5, 3), config(1, 1, 1), config(12, 40, 8), config(0, 0, 0)] {
            let once = prune(&value, &cfg);
            assert_eq!(prune(&once, &cfg), once);
        }
    }

    #[test]
    fn marker_respects_string_cap() {
        let out = prune(&json!({"a": [1]}), &config(4, 10, 1));
        assert_eq!(out, json!({"a": "[tr…"}));
    }

    #[test]
    fn map_key_cap() {
        let mut map = Map::new();
        for i in 0..5 {
            map.insert(format!("k{i}"), json!("v"));
        }
        assert_eq!(prune_map(&map, &config(10, 10, 8), 3).len(), 3);
    }
}
