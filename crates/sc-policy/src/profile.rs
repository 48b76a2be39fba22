// profile.rs — Policy profiles, per-call overrides, and the effective policy.
//
// A PolicyProfile holds instance-level defaults and is never mutated after
// construction. Each protected call supplies CallOverrides; merging the two
// yields an EffectivePolicy, which is what the executor actually applies.
//
// Merge rules:
// - save, destroy, skip: profile set ∪ call set
// - ensure: profile mapping overlaid by call mapping (call wins)
// - keep = save ∪ skip ∪ ensure keys

use serde::{Deserialize, Serialize};

use crate::keys::{DefaultProvider, EnsureMapping, KeySet};

/// Immutable default declarations shared by every call that uses them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyProfile {
    save: KeySet,
    destroy: KeySet,
    skip: KeySet,
    ensure: EnsureMapping,
}

impl PolicyProfile {
    pub fn new(save: KeySet, destroy: KeySet, skip: KeySet, ensure: EnsureMapping) -> Self {
        Self {
            save,
            destroy,
            skip,
            ensure,
        }
    }

    pub fn builder() -> ProfileBuilder {
        ProfileBuilder::default()
    }

    pub fn save(&self) -> &KeySet {
        &self.save
    }

    pub fn destroy(&self) -> &KeySet {
        &self.destroy
    }

    pub fn skip(&self) -> &KeySet {
        &self.skip
    }

    pub fn ensure(&self) -> &EnsureMapping {
        &self.ensure
    }

    /// Keys preserved by a reset: profile save ∪ `extra`.
    pub fn merge_save(&self, extra: &KeySet) -> KeySet {
        self.save.union(extra)
    }

    /// Keys removed in destroy mode: profile destroy ∪ `extra`.
    pub fn merge_destroy(&self, extra: &KeySet) -> KeySet {
        self.destroy.union(extra)
    }

    /// Keys hidden during the handler: profile skip ∪ `extra`.
    pub fn merge_skip(&self, extra: &KeySet) -> KeySet {
        self.skip.union(extra)
    }

    /// Required keys: profile ensure with `extra` laid over it.
    pub fn merge_ensure(&self, extra: &EnsureMapping) -> EnsureMapping {
        self.ensure.overlay(extra)
    }

    /// Merge call-level overrides into the policy applied for one call.
    pub fn effective(&self, overrides: &CallOverrides) -> EffectivePolicy {
        EffectivePolicy::new(
            self.merge_save(&overrides.save),
            self.merge_destroy(&overrides.destroy),
            self.merge_skip(&overrides.skip),
            self.merge_ensure(&overrides.ensure),
        )
    }
}

/// Fluent construction for [`PolicyProfile`].
#[derive(Debug, Default)]
pub struct ProfileBuilder {
    save: KeySet,
    destroy: KeySet,
    skip: KeySet,
    ensure: EnsureMapping,
}

impl ProfileBuilder {
    pub fn save<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.save.extend(keys);
        self
    }

    pub fn destroy<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.destroy.extend(keys);
        self
    }

    pub fn skip<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(keys);
        self
    }

    pub fn ensure(mut self, key: impl Into<String>, provider: impl Into<DefaultProvider>) -> Self {
        self.ensure.insert(key, provider);
        self
    }

    pub fn build(self) -> PolicyProfile {
        PolicyProfile::new(self.save, self.destroy, self.skip, self.ensure)
    }
}

/// Per-call declarations layered on top of a profile. All empty by default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CallOverrides {
    /// Extra keys to preserve during a reset.
    pub save: KeySet,
    /// Extra keys to remove; any entry here switches cleanup to destroy mode.
    pub destroy: KeySet,
    /// Extra keys hidden while the handler runs.
    pub skip: KeySet,
    /// Extra required keys (overriding profile providers with the same key).
    pub ensure: EnsureMapping,
}

impl CallOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.save.extend(keys);
        self
    }

    pub fn destroy<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.destroy.extend(keys);
        self
    }

    pub fn skip<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(keys);
        self
    }

    pub fn ensure(mut self, key: impl Into<String>, provider: impl Into<DefaultProvider>) -> Self {
        self.ensure.insert(key, provider);
        self
    }
}

/// The merged policy applied to a single call. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectivePolicy {
    pub save: KeySet,
    pub destroy: KeySet,
    pub skip: KeySet,
    pub ensure: EnsureMapping,
    /// save ∪ skip ∪ ensure keys.
    pub keep: KeySet,
}

impl EffectivePolicy {
    pub fn new(save: KeySet, destroy: KeySet, skip: KeySet, ensure: EnsureMapping) -> Self {
        let mut keep = save.union(&skip);
        keep.extend(ensure.keys());
        Self {
            save,
            destroy,
            skip,
            ensure,
            keep,
        }
    }

    /// Destroy mode replaces the reset entirely.
    pub fn is_destroy_mode(&self) -> bool {
        !self.destroy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(items: &[&str]) -> KeySet {
        items.iter().copied().collect()
    }

    #[test]
    fn set_merges_are_unions() {
        let profile = PolicyProfile::builder()
            .save(["cart"])
            .destroy(["token"])
            .skip(["flash"])
            .build();

        assert_eq!(profile.merge_save(&keys(&["cart", "foo"])), keys(&["cart", "foo"]));
        assert_eq!(profile.merge_destroy(&keys(&["user"])), keys(&["token", "user"]));
        assert_eq!(profile.merge_skip(&KeySet::new()), keys(&["flash"]));
    }

    #[test]
    fn merges_do_not_touch_the_profile() {
        let profile = PolicyProfile::builder().save(["cart"]).build();
        let _ = profile.merge_save(&keys(&["extra"]));
        assert_eq!(profile.save(), &keys(&["cart"]));
    }

    #[test]
    fn merge_ensure_overlays_call_entries() {
        let profile = PolicyProfile::builder()
            .ensure("a", json!(1))
            .ensure("b", json!(2))
            .build();
        let extra: EnsureMapping = [("b", json!(3)), ("c", json!(4))].into_iter().collect();

        let merged = profile.merge_ensure(&extra);
        let expected: EnsureMapping = [("a", json!(1)), ("b", json!(3)), ("c", json!(4))]
            .into_iter()
            .collect();
        assert_eq!(merged, expected);
    }

    #[test]
    fn keep_is_save_skip_and_ensure_keys() {
        let profile = PolicyProfile::builder()
            .save(["cart"])
            .skip(["flash"])
            .ensure("locale", json!("en"))
            .build();
        let policy = profile.effective(&CallOverrides::new().save(["foo"]));

        assert_eq!(policy.keep, keys(&["cart", "flash", "foo", "locale"]));
        assert!(!policy.is_destroy_mode());
    }

    #[test]
    fn call_destroy_switches_to_destroy_mode() {
        let profile = PolicyProfile::default();
        let policy = profile.effective(&CallOverrides::new().destroy(["user_id"]));
        assert!(policy.is_destroy_mode());
        assert_eq!(policy.destroy, keys(&["user_id"]));
    }

    #[test]
    fn profile_deserializes_with_missing_sections() {
        let profile: PolicyProfile =
            serde_json::from_value(json!({"skip": ["flash"], "ensure": {"locale": "en"}}))
                .unwrap();
        assert_eq!(profile.skip(), &keys(&["flash"]));
        assert!(profile.save().is_empty());
        assert!(profile.ensure().contains_key("locale"));
    }

    #[test]
    fn profile_rejects_unknown_sections() {
        let result: Result<PolicyProfile, _> = serde_json::from_value(json!({"keep": ["a"]}));
        assert!(result.is_err());
    }
}
