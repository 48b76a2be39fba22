// file.rs — JSON file persistence for a MemorySession.
//
// A session file is a single JSON object: `{"key": <value>, ...}`.
// A missing file loads as an empty session so the first save creates it.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::SessionError;
use crate::session::MemorySession;

/// A session persisted as a JSON object on disk.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Point at a session file. Nothing is read until [`SessionFile::load`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session. A missing file yields an empty session.
    pub fn load(&self) -> Result<MemorySession, SessionError> {
        if !self.path.exists() {
            tracing::debug!("session file {} not found, starting empty", self.path.display());
            return Ok(MemorySession::new());
        }
        let json = fs::read_to_string(&self.path).map_err(|source| SessionError::IoError {
            path: self.path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&json)?;
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(SessionError::NotAnObject {
                path: self.path.clone(),
                found: json_type_name(&other).to_string(),
            }),
        }
    }

    /// Save the session, overwriting the file.
    pub fn save(&self, session: &MemorySession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SessionError::IoError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json).map_err(|source| SessionError::IoError {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
