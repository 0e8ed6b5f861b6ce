//! Structural change detection between an existing and a requested projection
//!
//! Both sides are JSON projections built by the caller. Explicit `null`
//! values are treated as absent, so a field cleared by the server and a field
//! that was never requested compare equal. Arrays are compared positionally;
//! callers sort unordered ID sets with [`sorted_ids`] before building the
//! projection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A single changed leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Value on the existing side (`None` if absent)
    pub from: Option<Value>,
    /// Value on the requested side (`None` if absent)
    pub to: Option<Value>,
}

/// Result of comparing two projections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Whether both projections are structurally equal
    pub equal: bool,
    /// Flat path -> change map, empty when `equal`
    pub diff: BTreeMap<String, FieldChange>,
}

impl Comparison {
    /// Comparison result for identical projections
    pub fn unchanged() -> Self {
        Self {
            equal: true,
            diff: BTreeMap::new(),
        }
    }

    /// Paths that differ, in sorted order
    pub fn changed_paths(&self) -> Vec<&str> {
        self.diff.keys().map(String::as_str).collect()
    }

    /// One-line description suitable for log output
    pub fn summary(&self) -> String {
        if self.equal {
            return "no changes".to_string();
        }
        format!(
            "{} field(s) changed: {}",
            self.diff.len(),
            self.changed_paths().join(", ")
        )
    }
}

/// Compare an existing projection against a requested one
pub fn compare(existing: &Value, requested: &Value) -> Comparison {
    let existing = strip_nulls(existing.clone());
    let requested = strip_nulls(requested.clone());

    if existing == requested {
        return Comparison::unchanged();
    }

    let mut diff = BTreeMap::new();
    walk("", Some(&existing), Some(&requested), &mut diff);
    Comparison { equal: false, diff }
}

/// Remove explicit `null` members from objects, recursively
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Sort an unordered set of identifiers for comparison
pub fn sorted_ids<S: AsRef<str>>(ids: &[S]) -> Vec<String> {
    let mut sorted: Vec<String> = ids.iter().map(|s| s.as_ref().to_string()).collect();
    sorted.sort();
    sorted
}

fn walk(
    path: &str,
    from: Option<&Value>,
    to: Option<&Value>,
    out: &mut BTreeMap<String, FieldChange>,
) {
    match (from, to) {
        (Some(Value::Object(a)), Some(Value::Object(b))) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            for key in keys {
                walk(&join(path, key), a.get(key), b.get(key), out);
            }
        }
        (Some(Value::Array(a)), Some(Value::Array(b))) => {
            for i in 0..a.len().max(b.len()) {
                walk(&format!("{path}[{i}]"), a.get(i), b.get(i), out);
            }
        }
        (a, b) if a == b => {}
        (a, b) => {
            let key = if path.is_empty() { "$" } else { path };
            out.insert(
                key.to_string(),
                FieldChange {
                    from: a.cloned(),
                    to: b.cloned(),
                },
            );
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
