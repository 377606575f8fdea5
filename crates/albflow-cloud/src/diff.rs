//! Field-level diff of desired and current resource state

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A pairing of desired state with the current state, if any.
///
/// An absent current state means the resource does not exist yet and the
/// diff always reports changes.
#[derive(Debug, Clone)]
pub struct ResourceDiff<T> {
    desired: T,
    current: Option<T>,
}

impl<T> ResourceDiff<T>
where
    T: Serialize + PartialEq,
{
    pub fn new(desired: T, current: Option<T>) -> Self {
        Self { desired, current }
    }

    pub fn desired(&self) -> &T {
        &self.desired
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn has_changes(&self) -> bool {
        match &self.current {
            None => true,
            Some(current) => current != &self.desired,
        }
    }

    /// JSON-pointer style paths of every differing field.
    ///
    /// Objects are compared key by key; arrays and scalars are compared as a
    /// whole. When there is no current state every top-level field of the
    /// desired state is reported.
    pub fn changes(&self) -> Vec<String> {
        let mut out = Vec::new();
        let Some(desired) = to_value(&self.desired) else {
            if self.has_changes() {
                out.push("/".to_string());
            }
            return out;
        };
        match &self.current {
            None => match desired {
                Value::Object(map) => out.extend(map.keys().map(|k| format!("/{}", k))),
                _ => out.push("/".to_string()),
            },
            Some(current) => {
                if current != &self.desired {
                    if let Some(current) = to_value(current) {
                        collect_changes("", &desired, &current, &mut out);
                    }
                    if out.is_empty() {
                        out.push("/".to_string());
                    }
                }
            }
        }
        out
    }
}

impl<T> ResourceDiff<BTreeMap<String, T>>
where
    T: Serialize + PartialEq + Clone,
{
    /// Whether there is no current state at all, or it has no entries.
    pub fn current_is_empty(&self) -> bool {
        self.current.as_ref().is_none_or(|c| c.is_empty())
    }

    /// Expands a keyed diff into one diff per desired key.
    ///
    /// Keys only present in the current state are not reported.
    pub fn by_key(&self) -> BTreeMap<String, ResourceDiff<T>> {
        self.desired
            .iter()
            .map(|(key, desired)| {
                let current = self.current.as_ref().and_then(|c| c.get(key)).cloned();
                (key.clone(), ResourceDiff::new(desired.clone(), current))
            })
            .collect()
    }
}

/// Unserializable state is reported as a whole-resource change.
fn to_value<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value)
        .inspect_err(|e| {
            tracing::warn!(error = %e, "Cannot compare state field by field");
        })
        .ok()
}

fn collect_changes(path: &str, desired: &Value, current: &Value, out: &mut Vec<String>) {
    match (desired, current) {
        (Value::Object(d), Value::Object(c)) => {
            for (key, d_value) in d {
                let child = format!("{}/{}", path, key);
                match c.get(key) {
                    Some(c_value) => collect_changes(&child, d_value, c_value, out),
                    None => out.push(child),
                }
            }
            for key in c.keys().filter(|k| !d.contains_key(*k)) {
                out.push(format!("{}/{}", path, key));
            }
        }
        _ if desired != current => {
            out.push(if path.is_empty() {
                "/".to_string()
            } else {
                path.to_string()
            });
        }
        _ => {}
    }
}
