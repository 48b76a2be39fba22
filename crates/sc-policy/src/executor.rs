// executor.rs — Applies an EffectivePolicy around a single handler call.
//
// Every protected call runs the same sequence:
//
// 1. Merge profile + call overrides → EffectivePolicy
// 2. Ensure: every required key must be present, else the missing-key
//    strategy runs (default: fail before anything is touched)
// 3. Cleanup: destroy mode removes only the named keys; otherwise reset
//    removes every key that is neither reserved ("_" prefix) nor kept
// 4. Skip: present skip keys are snapshotted and removed
// 5. Hook: skipped_removed
// 6. Handler runs against the mutated session
// 7. Hook: skipped_pre_restore
// 8. Restore: snapshotted keys are written back, overwriting anything the
//    handler stored under them
//
// Steps 4–8 are tied to a guard: if the handler or a hook panics, the guard's
// Drop still writes the snapshot back before the unwind leaves this module.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sc_session::{is_reserved, Session};

use crate::error::ProtectError;
use crate::hooks::{ExecutionHooks, FailOnMissing, MissingKeyHandler, NoopHooks};
use crate::profile::{CallOverrides, EffectivePolicy, PolicyProfile};

/// Which cleanup branch a call takes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CleanupMode {
    /// Only the destroy keys are removed.
    Destroy,
    /// Everything not kept and not reserved is removed.
    Reset,
}

/// What a policy would do to a given session, computed without mutating it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanupPlan {
    pub mode: CleanupMode,
    /// Ensure keys absent from the session.
    pub missing: Vec<String>,
    /// Keys the cleanup phase removes.
    pub remove: Vec<String>,
    /// Non-reserved keys that survive cleanup.
    pub keep: Vec<String>,
    /// Reserved keys present in the session (never touched by a reset).
    pub reserved: Vec<String>,
    /// Skip keys that will be hidden from the handler and restored after.
    pub hide: Vec<String>,
}

/// Record of a completed protected call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionTrace {
    /// Ensure keys that the missing-key strategy supplied.
    pub defaults_inserted: Vec<String>,
    /// The plan that was carried out (computed after the ensure phase).
    pub plan: CleanupPlan,
    /// Skip keys written back after the handler returned.
    pub restored: Vec<String>,
}

/// Runs handlers under a [`PolicyProfile`].
///
/// Immutable after construction and `Send + Sync`, so one executor can be
/// shared by every request that uses the same profile.
#[derive(Clone)]
pub struct PolicyExecutor {
    profile: Arc<PolicyProfile>,
    hooks: Arc<dyn ExecutionHooks>,
    missing_key: Arc<dyn MissingKeyHandler>,
}

impl std::fmt::Debug for PolicyExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyExecutor")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl PolicyExecutor {
    /// Executor with no-op hooks that fails on missing required keys.
    pub fn new(profile: impl Into<Arc<PolicyProfile>>) -> Self {
        Self {
            profile: profile.into(),
            hooks: Arc::new(NoopHooks),
            missing_key: Arc::new(FailOnMissing),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ExecutionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_missing_key_handler(mut self, handler: Arc<dyn MissingKeyHandler>) -> Self {
        self.missing_key = handler;
        self
    }

    pub fn profile(&self) -> &PolicyProfile {
        &self.profile
    }

    /// Merge `overrides` into the profile.
    pub fn effective(&self, overrides: &CallOverrides) -> EffectivePolicy {
        self.profile.effective(overrides)
    }

    /// Run `handler` under the profile merged with `overrides`.
    pub fn protect<S, T, E, F>(
        &self,
        session: &mut S,
        overrides: &CallOverrides,
        handler: F,
    ) -> Result<T, ProtectError<E>>
    where
        S: Session,
        F: FnOnce(&mut S) -> Result<T, E>,
    {
        let policy = self.effective(overrides);
        self.protect_with_policy(session, &policy, handler)
    }

    /// Run `handler` under an already-merged policy.
    pub fn protect_with_policy<S, T, E, F>(
        &self,
        session: &mut S,
        policy: &EffectivePolicy,
        handler: F,
    ) -> Result<T, ProtectError<E>>
    where
        S: Session,
        F: FnOnce(&mut S) -> Result<T, E>,
    {
        self.run(session, policy, handler).map(|(value, _)| value)
    }

    /// Like [`PolicyExecutor::protect`], also returning what was done.
    pub fn protect_traced<S, T, E, F>(
        &self,
        session: &mut S,
        overrides: &CallOverrides,
        handler: F,
    ) -> Result<(T, ExecutionTrace), ProtectError<E>>
    where
        S: Session,
        F: FnOnce(&mut S) -> Result<T, E>,
    {
        let policy = self.effective(overrides);
        self.run(session, &policy, handler)
    }

    /// Compute the effect of `policy` on `session` without changing it.
    pub fn plan<S: Session + ?Sized>(session: &S, policy: &EffectivePolicy) -> CleanupPlan {
        let present = session.keys();

        let missing = policy
            .ensure
            .keys()
            .filter(|key| !session.contains_key(key))
            .map(str::to_string)
            .collect();

        let (mode, remove): (CleanupMode, Vec<String>) = if policy.is_destroy_mode() {
            let remove = policy
                .destroy
                .iter()
                .filter(|key| session.contains_key(key))
                .map(str::to_string)
                .collect();
            (CleanupMode::Destroy, remove)
        } else {
            let remove = present
                .iter()
                .filter(|key| !is_reserved(key) && !policy.keep.contains(key))
                .cloned()
                .collect();
            (CleanupMode::Reset, remove)
        };

        let reserved = present
            .iter()
            .filter(|key| is_reserved(key) && !remove.contains(*key))
            .cloned()
            .collect();
        let keep = present
            .iter()
            .filter(|key| !is_reserved(key) && !remove.contains(*key))
            .cloned()
            .collect();
        let hide = policy
            .skip
            .iter()
            .filter(|key| session.contains_key(key) && !remove.iter().any(|r| r == key))
            .map(str::to_string)
            .collect();

        CleanupPlan {
            mode,
            missing,
            remove,
            keep,
            reserved,
            hide,
        }
    }

    fn run<S, T, E, F>(
        &self,
        session: &mut S,
        policy: &EffectivePolicy,
        handler: F,
    ) -> Result<(T, ExecutionTrace), ProtectError<E>>
    where
        S: Session,
        F: FnOnce(&mut S) -> Result<T, E>,
    {
        // Ensure phase: nothing has been removed yet, so a failure here
        // leaves the session exactly as the caller handed it over.
        let mut defaults_inserted = Vec::new();
        for (key, provider) in policy.ensure.iter() {
            if !session.contains_key(key) {
                tracing::debug!("required session key '{}' is missing", key);
                self.missing_key
                    .handle_missing_key(&mut *session, key, provider)?;
                defaults_inserted.push(key.to_string());
            }
        }

        let plan = Self::plan(&*session, policy);
        tracing::debug!(
            mode = ?plan.mode,
            removed = plan.remove.len(),
            hidden = plan.hide.len(),
            "applying session policy"
        );

        for key in &plan.remove {
            session.remove(key);
        }

        let mut guard = SkipGuard::new(session);
        for key in &plan.hide {
            guard.hide(key);
        }

        self.hooks.skipped_removed(&mut *guard.session);
        let result = handler(&mut *guard.session);
        if result.is_err() {
            tracing::warn!(
                "protected handler failed; restoring {} skipped key(s)",
                guard.snapshot.len()
            );
        }
        self.hooks.skipped_pre_restore(&mut *guard.session);
        let restored = guard.restore();

        match result {
            Ok(value) => Ok((
                value,
                ExecutionTrace {
                    defaults_inserted,
                    plan,
                    restored,
                },
            )),
            Err(e) => Err(ProtectError::Handler(e)),
        }
    }
}

/// Holds skipped values while the handler runs and writes them back on
/// restore or, failing that, on drop.
struct SkipGuard<'a, S: Session> {
    session: &'a mut S,
    snapshot: Vec<(String, Value)>,
}

impl<'a, S: Session> SkipGuard<'a, S> {
    fn new(session: &'a mut S) -> Self {
        Self {
            session,
            snapshot: Vec::new(),
        }
    }

    // Snapshot and removal are one operation on the same store reference.
    fn hide(&mut self, key: &str) {
        if let Some(value) = self.session.remove(key) {
            self.snapshot.push((key.to_string(), value));
        }
    }

    fn restore(mut self) -> Vec<String> {
        self.reinstate()
    }

    fn reinstate(&mut self) -> Vec<String> {
        let mut restored = Vec::with_capacity(self.snapshot.len());
        for (key, value) in self.snapshot.drain(..) {
            self.session.insert(key.clone(), value);
            restored.push(key);
        }
        restored
    }
}

impl<S: Session> Drop for SkipGuard<'_, S> {
    fn drop(&mut self) {
        if !self.snapshot.is_empty() {
            self.reinstate();
        }
    }
}
