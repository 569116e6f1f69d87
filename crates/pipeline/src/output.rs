//! Canonical model result.
//!
//! The model may answer with plain text or with a JSON object carrying
//! named slots. Both parse into [`ModelOutput`]; unrecognized top-level
//! fields are kept in `extras` rather than growing the canonical shape.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Chip {
    pub label: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigateTarget {
    pub label: String,
    pub route: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallToAction {
    pub label: String,
    pub action: String,
    pub payload: Value,
}

/// Model answer with named optional slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOutput {
    pub text: String,
    pub chips: Vec<Chip>,
    pub navigate: Option<NavigateTarget>,
    pub call_to_action: Option<CallToAction>,
    pub follow_up: Option<String>,
    pub extras: Map<String, Value>,
}

const TEXT_KEYS: &[&str] = &["text", "response", "message"];
const CHIP_KEYS: &[&str] = &["chips", "suggestions"];
const NAVIGATE_KEYS: &[&str] = &["navigateTo", "navigation", "navigate"];
const CTA_KEYS: &[&str] = &["cta", "callToAction"];
const FOLLOW_UP_KEYS: &[&str] = &["followUp", "followUpPrompt"];

impl ModelOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Parse a raw completion. JSON objects (optionally fenced in a
    /// ```json block) are read slot by slot; anything else is plain text.
    /// An object with no text slot keeps the raw completion as its text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let candidate = strip_code_fence(trimmed);
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => {
                let mut output = Self::from_object(map);
                if output.text.trim().is_empty() {
                    output.text = trimmed.to_string();
                }
                output
            }
            _ => Self::text(trimmed),
        }
    }

    fn from_object(mut map: Map<String, Value>) -> Self {
        let text = take_first(&mut map, TEXT_KEYS)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        let chips = take_first(&mut map, CHIP_KEYS)
            .and_then(|v| match v {
                Value::Array(items) => Some(items.iter().filter_map(parse_chip).collect()),
                _ => None,
            })
            .unwrap_or_default();

        let navigate = take_first(&mut map, NAVIGATE_KEYS).and_then(|v| parse_navigate(&v));
        let call_to_action = take_first(&mut map, CTA_KEYS).and_then(|v| parse_cta(&v));
        let follow_up = take_first(&mut map, FOLLOW_UP_KEYS)
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.trim().is_empty());

        Self {
            text,
            chips,
            navigate,
            call_to_action,
            follow_up,
            extras: map,
        }
    }
}

/// Remove every alias of a slot, returning the first non-null one.
fn take_first(map: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    let mut found = None;
    for key in keys {
        if let Some(v) = map.remove(*key) {
            if found.is_none() && !v.is_null() {
                found = Some(v);
            }
        }
    }
    found
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_chip(item: &Value) -> Option<Chip> {
    match item {
        Value::String(s) if !s.trim().is_empty() => Some(Chip {
            label: s.clone(),
            prompt: s.clone(),
        }),
        Value::Object(obj) => {
            let label = obj.get("label").and_then(Value::as_str)?.to_string();
            let prompt = obj
                .get("prompt")
                .or_else(|| obj.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| label.clone());
            Some(Chip { label, prompt })
        }
        _ => None,
    }
}

fn parse_navigate(value: &Value) -> Option<NavigateTarget> {
    match value {
        Value::String(route) if !route.is_empty() => Some(NavigateTarget {
            label: "Open".into(),
            route: route.clone(),
        }),
        Value::Object(obj) => {
            let route = obj
                .get("route")
                .or_else(|| obj.get("path"))
                .and_then(Value::as_str)?
                .to_string();
            let label = obj
                .get("label")
                .and_then(Value::as_str)
                .unwrap_or("Open")
                .to_string();
            Some(NavigateTarget { label, route })
        }
        _ => None,
    }
}

fn parse_cta(value: &Value) -> Option<CallToAction> {
    match value {
        Value::String(label) if !label.is_empty() => Some(CallToAction {
            label: label.clone(),
            action: "custom".into(),
            payload: Value::Null,
        }),
        Value::Object(obj) => {
            let label = obj.get("label").and_then(Value::as_str)?.to_string();
            let action = obj
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or("custom")
                .to_string();
            let payload = obj.get("payload").cloned().unwrap_or(Value::Null);
            Some(CallToAction {
                label,
                action,
                payload,
            })
        }
        _ => None,
    }
}
