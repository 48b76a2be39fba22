// error.rs — Error types for the session policy subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the policy engine itself.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A key named in `ensure` is absent and the missing-key strategy could
    /// not (or would not) supply it.
    #[error("session is missing required key '{key}'")]
    MissingRequiredKey { key: String },

    /// No profile with this name exists in the loaded configuration.
    #[error("no policy profile named '{name}'")]
    UnknownProfile { name: String },

    /// No handler entry with this name exists in the loaded configuration.
    #[error("no handler named '{name}' in conductor config")]
    UnknownHandler { name: String },

    /// The configuration file could not be read.
    #[error("failed to read conductor config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("invalid conductor config: {0}")]
    ConfigParse(String),
}

/// Outcome of a protected call that did not return a value.
///
/// `Policy` errors happen before the handler runs and before the session is
/// touched. `Handler` errors are the handler's own failure, surfaced after
/// skipped keys have been restored.
#[derive(Debug, Error)]
pub enum ProtectError<E> {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("handler failed")]
    Handler(#[source] E),
}

impl<E> ProtectError<E> {
    /// The missing key, if this is a `MissingRequiredKey` failure.
    pub fn missing_key(&self) -> Option<&str> {
        match self {
            ProtectError::Policy(PolicyError::MissingRequiredKey { key }) => Some(key),
            _ => None,
        }
    }

    pub fn is_missing_key(&self) -> bool {
        self.missing_key().is_some()
    }

    pub fn handler_error(&self) -> Option<&E> {
        match self {
            ProtectError::Handler(e) => Some(e),
            ProtectError::Policy(_) => None,
        }
    }

    pub fn into_handler_error(self) -> Option<E> {
        match self {
            ProtectError::Handler(e) => Some(e),
            ProtectError::Policy(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("payment declined")]
    struct Declined;

    #[test]
    fn handler_error_is_the_source_not_the_message() {
        let err: ProtectError<Declined> = ProtectError::Handler(Declined);
        assert_eq!(err.to_string(), "handler failed");
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("payment declined"));
    }

    #[test]
    fn policy_errors_are_transparent() {
        let err: ProtectError<Declined> = PolicyError::MissingRequiredKey {
            key: "user_id".into(),
        }
        .into();
        assert_eq!(err.to_string(), "session is missing required key 'user_id'");
        assert_eq!(err.missing_key(), Some("user_id"));
        assert!(err.handler_error().is_none());
    }
}
