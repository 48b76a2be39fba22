// keys.rs — Key sets and ensure mappings.
//
// KeySet is a deduplicated set of session keys. It iterates in sorted order
// so that missing-key errors and traces are reproducible.
//
// EnsureMapping maps a required key to the DefaultProvider that can supply a
// value when the key is absent. Overlaying one mapping on another lets the
// later (call-level) entry win.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A set of session keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySet(BTreeSet<String>);

impl KeySet {
    /// Create an empty key set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Returns false if it was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.0.insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Set union; neither operand is modified.
    pub fn union(&self, other: &KeySet) -> KeySet {
        KeySet(self.0.union(&other.0).cloned().collect())
    }

    /// Keys as an owned, sorted list.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for KeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        KeySet(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for KeySet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Supplies a value for a required key that is missing from the session.
///
/// `Value` is a literal fallback (the only form configuration files can
/// express). `Factory` is a zero-argument callable evaluated on demand.
#[derive(Clone)]
pub enum DefaultProvider {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultProvider {
    /// A literal fallback value.
    pub fn value(value: impl Into<Value>) -> Self {
        DefaultProvider::Value(value.into())
    }

    /// A callable evaluated each time a value is needed.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        DefaultProvider::Factory(Arc::new(factory))
    }

    /// Produce the default value.
    pub fn resolve(&self) -> Value {
        match self {
            DefaultProvider::Value(value) => value.clone(),
            DefaultProvider::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultProvider::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultProvider::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

// Factories compare by identity: two handles are equal only if they share
// the same closure.
impl PartialEq for DefaultProvider {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DefaultProvider::Value(a), DefaultProvider::Value(b)) => a == b,
            (DefaultProvider::Factory(a), DefaultProvider::Factory(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for DefaultProvider {
    fn from(value: Value) -> Self {
        DefaultProvider::Value(value)
    }
}

impl Serialize for DefaultProvider {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DefaultProvider::Value(value) => value.serialize(serializer),
            DefaultProvider::Factory(_) => Err(serde::ser::Error::custom(
                "factory defaults have no serialized form",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultProvider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(DefaultProvider::Value)
    }
}

/// Required keys and their default providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnsureMapping(BTreeMap<String, DefaultProvider>);

impl EnsureMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the provider for `key`.
    pub fn insert(&mut self, key: impl Into<String>, provider: impl Into<DefaultProvider>) {
        self.0.insert(key.into(), provider.into());
    }

    pub fn get(&self, key: &str) -> Option<&DefaultProvider> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DefaultProvider)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of `self` with every entry of `extra` laid over it.
    pub fn overlay(&self, extra: &EnsureMapping) -> EnsureMapping {
        let mut merged = self.0.clone();
        merged.extend(extra.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        EnsureMapping(merged)
    }
}

impl<K: Into<String>, P: Into<DefaultProvider>> FromIterator<(K, P)> for EnsureMapping {
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        EnsureMapping(
            iter.into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_set_deduplicates_and_sorts() {
        let keys: KeySet = ["b", "a", "b", "c"].into_iter().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys.to_vec(), vec!["a", "b", "c"]);
    }

    #[test]
    fn key_set_union() {
        let left: KeySet = ["a", "b"].into_iter().collect();
        let right: KeySet = ["b", "c"].into_iter().collect();
        let merged = left.union(&right);
        assert_eq!(merged.to_vec(), vec!["a", "b", "c"]);
        assert_eq!(left.len(), 2);
    }

    #[test]
    fn overlay_later_entry_wins() {
        let base: EnsureMapping = [("a", json!(1)), ("b", json!(2))].into_iter().collect();
        let extra: EnsureMapping = [("b", json!(3)), ("c", json!(4))].into_iter().collect();

        let merged = base.overlay(&extra);
        let expected: EnsureMapping = [("a", json!(1)), ("b", json!(3)), ("c", json!(4))]
            .into_iter()
            .collect();
        assert_eq!(merged, expected);
    }

    #[test]
    fn factory_is_evaluated_on_resolve() {
        let provider = DefaultProvider::factory(|| json!({"items": []}));
        assert_eq!(provider.resolve(), json!({"items": []}));
        assert_eq!(format!("{:?}", provider), "Factory(..)");
    }

    #[test]
    fn factories_compare_by_identity() {
        let a = DefaultProvider::factory(|| json!(1));
        let b = DefaultProvider::factory(|| json!(1));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a, DefaultProvider::value(1));
    }

    #[test]
    fn literal_provider_deserializes_from_any_json() {
        let mapping: EnsureMapping =
            serde_json::from_value(json!({"locale": "en", "cart": []})).unwrap();
        assert_eq!(mapping.get("locale"), Some(&DefaultProvider::value("en")));
        assert_eq!(mapping.get("cart"), Some(&DefaultProvider::value(json!([]))));
    }

    #[test]
    fn factory_refuses_to_serialize() {
        let mut mapping = EnsureMapping::new();
        mapping.insert("token", DefaultProvider::factory(|| json!("t")));
        assert!(serde_json::to_string(&mapping).is_err());
    }
}
