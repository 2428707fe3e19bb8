// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable property bags.

use core::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// An immutable, cheaply clonable set of component properties.
///
/// Props are a JSON object as delivered by the command source. Cloning a
/// `Props` shares the underlying map; producing a changed value always
/// allocates a new map via [`merged`](Self::merged) or [`with`](Self::with).
#[derive(Clone, Default)]
pub struct Props(Arc<Map<String, Value>>);

impl Props {
    /// Returns an empty property bag.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `key` as an `f64` if it is a JSON number.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Returns `key` as a string slice if it is a JSON string.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a new bag where every key of `raw` overrides this bag's value.
    ///
    /// A JSON `null` in `raw` removes the key, matching how the command
    /// source resets a property.
    #[must_use]
    pub fn merged(&self, raw: &Self) -> Self {
        if raw.is_empty() {
            return self.clone();
        }
        let mut map = (*self.0).clone();
        for (key, value) in raw.0.iter() {
            if value.is_null() {
                map.remove(key);
            } else {
                map.insert(key.clone(), value.clone());
            }
        }
        Self(Arc::new(map))
    }

    /// Returns a new bag with `key` set to `value`.
    #[must_use]
    pub fn with(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut map = (*self.0).clone();
        map.insert(key.to_owned(), value.into());
        Self(Arc::new(map))
    }

    /// Returns `true` if both values share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the props as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object((*self.0).clone())
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl From<Map<String, Value>> for Props {
    fn from(map: Map<String, Value>) -> Self {
        Self(Arc::new(map))
    }
}

/// Converts a JSON value; anything other than an object yields empty props.
impl From<Value> for Props {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from(map),
            _ => Self::empty(),
        }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn merged_overrides_and_removes() {
        let base = Props::from(json!({ "width": 10, "color": "red" }));
        let raw = Props::from(json!({ "width": 20, "color": null, "opacity": 0.5 }));
        let merged = base.merged(&raw);

        assert_eq!(merged.number("width"), Some(20.0));
        assert!(merged.get("color").is_none());
        assert_eq!(merged.number("opacity"), Some(0.5));
        // Source untouched.
        assert_eq!(base.string("color"), Some("red"));
    }

    #[test]
    fn merging_empty_shares_allocation() {
        let base = Props::from(json!({ "a": 1 }));
        let merged = base.merged(&Props::empty());
        assert!(merged.ptr_eq(&base));
    }

    #[test]
    fn equality_is_by_value() {
        let a = Props::from(json!({ "a": 1 }));
        let b = Props::from(json!({ "a": 1 }));
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, b.with("a", 2));
    }

    #[test]
    fn non_object_json_is_empty() {
        assert!(Props::from(json!([1, 2])).is_empty());
    }
}
