//! # Named Values
//!
//! Ordered name → number mappings used at the kernel boundary.
//! [`Parameters`] carry inputs read from a spreadsheet or the command line,
//! [`Results`] carry kernel output in the order it is written to disk.
//!
//! Both serialize to a plain JSON object with keys in insertion order.
//!
//! ```rust
//! use gad_core::values::Results;
//!
//! let mut results = Results::new();
//! results.insert("span", 20.0);
//! results.insert("load", 15.0);
//! results.insert("span", 25.0); // replaces in place
//!
//! assert_eq!(results.keys().collect::<Vec<_>>(), vec!["span", "load"]);
//! assert_eq!(results.get("span"), Some(25.0));
//! ```

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Insertion-ordered mapping from name to `f64`.
///
/// Re-inserting an existing name overwrites its value but keeps its
/// original position, so "last occurrence wins" for duplicate rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedValues {
    entries: Vec<(String, f64)>,
}

/// Analysis inputs keyed by variable name (`SPAN`, `LOAD`, `E`, `I`, ...)
pub type Parameters = NamedValues;

/// Analysis outputs keyed by result name
pub type Results = NamedValues;

impl NamedValues {
    pub fn new() -> Self {
        NamedValues { entries: Vec::new() }
    }

    /// Insert or overwrite a value. Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            let previous = slot.1;
            slot.1 = value;
            return Some(previous);
        }
        self.entries.push((name, value));
        None
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for NamedValues {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut values = NamedValues::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

impl Serialize for NamedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NamedValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NamedValuesVisitor;

        impl<'de> Visitor<'de> for NamedValuesVisitor {
            type Value = NamedValues;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of names to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut values = NamedValues::new();
                while let Some((k, v)) = access.next_entry::<String, f64>()? {
                    values.insert(k, v);
                }
                Ok(values)
            }
        }

        deserializer.deserialize_map(NamedValuesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_position() {
        let mut params = Parameters::new();
        params.insert("SPAN", 10.0);
        params.insert("LOAD", 5.0);
        assert_eq!(params.insert("SPAN", 12.0), Some(10.0));

        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("SPAN", 12.0), ("LOAD", 5.0)]);
    }

    #[test]
    fn test_json_preserves_order() {
        let results: Results = [("span", 20.0), ("load", 15.0), ("E", 2.1e8)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&results).unwrap();
        assert_eq!(json, r#"{"span":20.0,"load":15.0,"E":210000000.0}"#);

        let back: Results = serde_json::from_str(&json).unwrap();
        assert_eq!(back, results);
    }

    #[test]
    fn test_missing_key() {
        let params = Parameters::new();
        assert!(params.is_empty());
        assert_eq!(params.get("SPAN"), None);
        assert!(!params.contains_key("SPAN"));
    }
}
