//! Token substitution over prop values.
//!
//! Templates carry `$name` tokens in string props (`"$primary"`,
//! `"$headline"`). Substitution walks every prop value recursively —
//! strings, arrays, nested objects, responsive variants — replacing each
//! recognized token and passing everything else through untouched. The
//! walk is pure: inputs are never mutated, and it is idempotent on
//! token-free input.

use std::collections::BTreeMap;

use serde_json::Value;

use pagecraft_document::{PropValue, ResponsiveValue};

/// Replace every recognized `$name` occurrence in a string. Longer names
/// first so `$primary-dark` never half-matches `$primary`.
fn substitute_str(input: &str, tokens: &BTreeMap<String, String>) -> String {
    if !input.contains('$') {
        return input.to_string();
    }

    let mut names: Vec<&String> = tokens.keys().collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));

    let mut out = input.to_string();
    for name in names {
        let token = format!("${}", name);
        if out.contains(&token) {
            out = out.replace(&token, &tokens[name]);
        }
    }
    out
}

fn substitute_json(value: &Value, tokens: &BTreeMap<String, String>) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_str(s, tokens)),
        Value::Array(items) => Value::Array(
            items.iter().map(|item| substitute_json(item, tokens)).collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_json(v, tokens)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Substitute tokens throughout a prop value, including every defined
/// breakpoint of a responsive value.
pub fn substitute_prop(value: &PropValue, tokens: &BTreeMap<String, String>) -> PropValue {
    match value {
        PropValue::Plain(v) => PropValue::Plain(substitute_json(v, tokens)),
        PropValue::Responsive(rv) => PropValue::Responsive(ResponsiveValue {
            mobile: substitute_json(&rv.mobile, tokens),
            tablet: rv.tablet.as_ref().map(|v| substitute_json(v, tokens)),
            desktop: rv.desktop.as_ref().map(|v| substitute_json(v, tokens)),
        }),
    }
}
