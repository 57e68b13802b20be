// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Redaction of sensitive fields in parsed bodies.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Names masked out of the box. Matching is case-insensitive.
pub const DEFAULT_MASK_KEYS: &[&str] = &[
    "password",
    "passwd",
    "token",
    "access_token",
    "refresh_token",
    "secret",
    "ssn",
];

pub const DEFAULT_MASK_TOKEN: &str = "******";

/// Set of object keys whose values are replaced wherever they appear.
#[derive(Debug, Clone)]
pub struct MaskRules {
    keys: HashSet<String>,
    token: String,
}

impl Default for MaskRules {
    fn default() -> Self {
        Self::new(DEFAULT_MASK_KEYS.iter().copied(), DEFAULT_MASK_TOKEN)
    }
}

impl MaskRules {
    pub fn new<I, S>(keys: I, token: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|k| k.as_ref().to_ascii_lowercase())
                .collect(),
            token: token.to_string(),
        }
    }

    /// Built-in names plus `extra`.
    pub fn with_extra_keys<I, S>(extra: I, token: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Self::new(DEFAULT_MASK_KEYS.iter().copied(), token);
        rules
            .keys
            .extend(extra.into_iter().map(|k| k.as_ref().to_ascii_lowercase()));
        rules
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_masked(&self, key: &str) -> bool {
        self.keys.contains(&key.to_ascii_lowercase())
    }

    /// Return a copy of `value` with every masked key's value replaced by the token.
    pub fn apply(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let masked: Map<String, Value> = map
                    .iter()
                    .map(|(k, v)| {
                        let v = if self.is_masked(k) {
                            Value::String(self.token.clone())
                        } else {
                            self.apply(v)
                        };
                        (k.clone(), v)
                    })
                    .collect();
                Value::Object(masked)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.apply(v)).collect()),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({"password": "p@ss"}), json!({"password": "******"}))]
    #[case(json!({"PassWord": "x", "user": "a"}), json!({"PassWord": "******", "user": "a"}))]
    #[case(
        json!({"auth": {"token": "t", "nested": [{"secret": 1}]}}),
        json!({"auth": {"token": "******", "nested": [{"secret": "******"}]}})
    )]
    #[case(json!([{"ssn": "123"}, 5, "password"]), json!([{"ssn": "******"}, 5, "password"]))]
    #[case(json!({"token": {"inner": "whole subtree"}}), json!({"token": "******"}))]
    #[case(json!("password"), json!("password"))]
    #[case(json!(null), json!(null))]
    fn masks_at_any_depth(#[case] input: Value, #[case] expected: Value) {
        let rules = MaskRules::default();
        assert_eq!(rules.apply(&input), expected);
    }

    #[test]
    fn partial_key_names_are_not_masked() {
        let rules = MaskRules::default();
        let v = json!({"password_hint": "dog", "tokens": 3});
        assert_eq!(rules.apply(&v), v);
    }

    #[test]
    fn masking_is_idempotent() {
        let rules = MaskRules::default();
        let v = json!({"a": [{"password": "x"}], "refresh_token": {"k": 1}});
        let once = rules.apply(&v);
        assert_eq!(rules.apply(&once), once);
    }

    #[test]
    fn input_is_left_untouched() {
        let rules = MaskRules::default();
        let v = json!({"password": "x"});
        let _ = rules.apply(&v);
        assert_eq!(v, json!({"password": "x"}));
    }

    #[test]
    fn extra_keys_extend_defaults() {
        let rules = MaskRules::with_extra_keys(["PIN"], "[redacted]");
        assert!(rules.is_masked("pin"));
        assert!(rules.is_masked("password"));
        assert_eq!(rules.token(), "[redacted]");
        assert_eq!(
            rules.apply(&json!({"pin": 1234})),
            json!({"pin": "[redacted]"})
        );
    }
}
