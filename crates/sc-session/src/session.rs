// session.rs — The Session contract and the in-memory store.
//
// A Session is owned by the host (one per request). The policy engine borrows
// it mutably for the duration of a single protected call and only ever uses
// the five operations below.
//
// Keys starting with RESERVED_PREFIX are infrastructure keys (CSRF tokens,
// auth backends, framework bookkeeping). A reset never removes them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix marking infrastructure keys that survive a session reset.
pub const RESERVED_PREFIX: &str = "_";

/// A request-scoped mutable key/value store.
///
/// Values are opaque to the policy engine; `serde_json::Value` is used so
/// any serializable payload can live in a session.
pub trait Session {
    /// Look up the value stored under `key`.
    fn get(&self, key: &str) -> Option<&Value>;

    /// Store `value` under `key`, returning the previous value if any.
    fn insert(&mut self, key: String, value: Value) -> Option<Value>;

    /// Remove `key`, returning its value. Removing an absent key is a no-op.
    fn remove(&mut self, key: &str) -> Option<Value>;

    /// All keys currently present, in the store's iteration order.
    fn keys(&self) -> Vec<String>;

    /// Membership test.
    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

// Lets `&mut dyn Session` (and other borrowed stores) flow through generic code.
impl<T: Session + ?Sized> Session for &mut T {
    fn get(&self, key: &str) -> Option<&Value> {
        (**self).get(key)
    }

    fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        (**self).insert(key, value)
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        (**self).remove(key)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }

    fn contains_key(&self, key: &str) -> bool {
        (**self).contains_key(key)
    }
}

/// Whether `key` is an infrastructure key protected from resets.
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// Ordered in-memory session store.
///
/// `BTreeMap` keeps key enumeration sorted, which makes resets and traces
/// deterministic. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemorySession {
    entries: BTreeMap<String, Value>,
}

impl MemorySession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys in the session.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the session holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the underlying map.
    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    /// Consume the session, returning the underlying map.
    pub fn into_entries(self) -> BTreeMap<String, Value> {
        self.entries
    }
}

impl Session for MemorySession {
    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl From<BTreeMap<String, Value>> for MemorySession {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for MemorySession {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// Host frameworks frequently hand out a plain HashMap; let it be used directly.
impl Session for HashMap<String, Value> {
    fn get(&self, key: &str) -> Option<&Value> {
        HashMap::get(self, key)
    }

    fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        HashMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        HashMap::remove(self, key)
    }

    fn keys(&self) -> Vec<String> {
        HashMap::keys(self).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> MemorySession {
        [
            ("foo", json!(1)),
            ("bar", json!(2)),
            ("_csrf", json!("x")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn keys_are_sorted() {
        let session = sample();
        assert_eq!(session.keys(), vec!["_csrf", "bar", "foo"]);
    }

    #[test]
    fn remove_absent_key_is_noop() {
        let mut session = sample();
        assert_eq!(session.remove("missing"), None);
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn insert_returns_previous_value() {
        let mut session = sample();
        let previous = session.insert("foo".to_string(), json!(10));
        assert_eq!(previous, Some(json!(1)));
        assert_eq!(session.get("foo"), Some(&json!(10)));
    }

    #[test]
    fn reserved_prefix_detection() {
        assert!(is_reserved("_csrf"));
        assert!(is_reserved("_auth_user_id"));
        assert!(!is_reserved("csrf_"));
        assert!(!is_reserved(""));
    }

    #[test]
    fn serializes_as_plain_object() {
        let session = sample();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json, json!({"foo": 1, "bar": 2, "_csrf": "x"}));

        let restored: MemorySession = serde_json::from_value(json).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn hashmap_is_a_session() {
        let mut map: HashMap<String, Value> = HashMap::new();
        Session::insert(&mut map, "a".to_string(), json!(true));
        assert!(Session::contains_key(&map, "a"));
        assert_eq!(Session::keys(&map), vec!["a".to_string()]);
        assert_eq!(Session::remove(&mut map, "a"), Some(json!(true)));
        assert!(!Session::contains_key(&map, "a"));
    }
}
