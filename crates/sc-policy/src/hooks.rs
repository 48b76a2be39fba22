// hooks.rs — Injectable strategies around a protected call.
//
// ExecutionHooks observe the session at the two points where skipped keys
// are out of the store: right after they are removed, and right after the
// handler returns (before they are written back). Both default to no-ops.
//
// MissingKeyHandler decides what happens when an ensure key is absent.
// FailOnMissing (the default) aborts the call; InsertDefault writes the
// provider's value into the session and lets the call proceed.

use sc_session::Session;

use crate::error::PolicyError;
use crate::keys::DefaultProvider;

/// Extension points invoked by [`crate::PolicyExecutor`].
///
/// A panic inside a hook still restores skipped keys; the executor holds
/// them in a guard that writes them back on unwind.
pub trait ExecutionHooks: Send + Sync {
    /// Skipped keys have just been removed; the handler has not run yet.
    fn skipped_removed(&self, _session: &mut dyn Session) {}

    /// The handler has returned (successfully or not); skipped keys are
    /// about to be reinstated.
    fn skipped_pre_restore(&self, _session: &mut dyn Session) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl ExecutionHooks for NoopHooks {}

/// Strategy for an ensure key that is absent from the session.
pub trait MissingKeyHandler: Send + Sync {
    /// Return `Ok(())` to let the call proceed, or an error to abort it
    /// before the session is modified by the cleanup phase.
    fn handle_missing_key(
        &self,
        session: &mut dyn Session,
        key: &str,
        provider: &DefaultProvider,
    ) -> Result<(), PolicyError>;
}

/// Abort with [`PolicyError::MissingRequiredKey`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FailOnMissing;

impl MissingKeyHandler for FailOnMissing {
    fn handle_missing_key(
        &self,
        _session: &mut dyn Session,
        key: &str,
        _provider: &DefaultProvider,
    ) -> Result<(), PolicyError> {
        Err(PolicyError::MissingRequiredKey {
            key: key.to_string(),
        })
    }
}

/// Populate the missing key from its provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertDefault;

impl MissingKeyHandler for InsertDefault {
    fn handle_missing_key(
        &self,
        session: &mut dyn Session,
        key: &str,
        provider: &DefaultProvider,
    ) -> Result<(), PolicyError> {
        let value = provider.resolve();
        tracing::info!("inserting default for missing session key '{}'", key);
        session.insert(key.to_string(), value);
        Ok(())
    }
}
