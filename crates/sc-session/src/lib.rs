//! # sc-session
//!
//! The session store contract for Session Conductor.
//!
//! A session is a request-scoped mapping from string key to an opaque JSON
//! value. The policy engine in `sc-policy` only talks to sessions through the
//! [`Session`] trait, so any host store (framework session, cache-backed map,
//! test double) can be plugged in by implementing five methods.
//!
//! Two stores ship with the crate:
//!
//! - [`MemorySession`] — ordered in-memory map, the default store for tests
//!   and embedding.
//! - [`SessionFile`] — loads and saves a [`MemorySession`] as a JSON object on
//!   disk (used by the `sc` CLI).
//!
//! ## Quick Example
//!
//! ```rust
//! use sc_session::{MemorySession, Session};
//! use serde_json::json;
//!
//! let mut session = MemorySession::new();
//! session.insert("user_id".to_string(), json!(42));
//! assert!(session.contains_key("user_id"));
//! assert_eq!(session.remove("user_id"), Some(json!(42)));
//! ```

pub mod error;
pub mod file;
pub mod session;

pub use error::SessionError;
pub use file::SessionFile;
pub use session::{is_reserved, MemorySession, Session, RESERVED_PREFIX};
