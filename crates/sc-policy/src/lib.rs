//! # sc-policy
//!
//! Request-scoped key-lifecycle policies for sessions.
//!
//! A [`PolicyProfile`] declares, for every handler that uses it, which session
//! keys to **save** across a reset, **destroy** outright, **skip** (hide while
//! the handler runs, then restore), and **ensure** (must be present before the
//! handler runs). Each call may add its own [`CallOverrides`]; the
//! [`PolicyExecutor`] merges both into an [`EffectivePolicy`] and applies it
//! around the handler.
//!
//! ## Key invariants
//!
//! - **Ensure first**: a missing required key fails the call before the
//!   session is touched.
//! - **Destroy replaces reset**: if any destroy key is declared, only those
//!   keys are removed.
//! - **Reserved keys survive**: a reset never removes keys starting with `_`.
//! - **Skipped keys always come back**: they are restored after the handler
//!   returns, fails, or panics, overwriting whatever the handler stored.
//!
//! ## Quick Example
//!
//! ```rust
//! use sc_policy::{CallOverrides, PolicyExecutor, PolicyProfile};
//! use sc_session::{MemorySession, Session};
//! use serde_json::json;
//!
//! let executor = PolicyExecutor::new(PolicyProfile::builder().skip(["flash"]).build());
//! let mut session: MemorySession = [("flash", json!("saved!")), ("stale", json!(1))]
//!     .into_iter()
//!     .collect();
//!
//! let seen = executor
//!     .protect(&mut session, &CallOverrides::new(), |s: &mut MemorySession| {
//!         Ok::<_, std::convert::Infallible>(s.keys())
//!     })
//!     .unwrap();
//!
//! assert!(seen.is_empty());
//! assert_eq!(session.keys(), vec!["flash"]);
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod keys;
pub mod profile;

pub use config::{ConductorConfig, HandlerConfig, DEFAULT_PROFILE};
pub use error::{PolicyError, ProtectError};
pub use executor::{CleanupMode, CleanupPlan, ExecutionTrace, PolicyExecutor};
pub use hooks::{ExecutionHooks, FailOnMissing, InsertDefault, MissingKeyHandler, NoopHooks};
pub use keys::{DefaultProvider, EnsureMapping, KeySet};
pub use profile::{CallOverrides, EffectivePolicy, PolicyProfile, ProfileBuilder};
