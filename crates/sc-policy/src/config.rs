// config.rs — Conductor configuration: named profiles and handler bindings.
//
// Loaded from `conductor.toml` (or YAML with the same shape):
//
//   [profiles.default]
//   skip = ["flash"]
//
//   [profiles.default.ensure]
//   locale = "en"
//
//   [handlers.checkout]
//   profile = "default"
//   save = ["cart"]
//
// A handler entry names a profile plus the per-call overrides applied every
// time that handler runs. Ensure values in files are literal defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::keys::{EnsureMapping, KeySet};
use crate::profile::{CallOverrides, PolicyProfile};

/// Profile used when a handler entry does not name one.
pub const DEFAULT_PROFILE: &str = "default";

/// Top-level conductor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConductorConfig {
    /// Named policy profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, PolicyProfile>,

    /// Named handler bindings.
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerConfig>,
}

/// A profile reference plus the overrides one handler always applies.
///
/// The override sections are spelled out rather than flattened so that a
/// misspelled section is rejected instead of silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerConfig {
    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default)]
    pub save: KeySet,

    #[serde(default)]
    pub destroy: KeySet,

    #[serde(default)]
    pub skip: KeySet,

    #[serde(default)]
    pub ensure: EnsureMapping,
}

impl HandlerConfig {
    /// The per-call overrides this handler applies.
    pub fn overrides(&self) -> CallOverrides {
        CallOverrides {
            save: self.save.clone(),
            destroy: self.destroy.clone(),
            skip: self.skip.clone(),
            ensure: self.ensure.clone(),
        }
    }
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

impl ConductorConfig {
    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let content = Self::read(path)?;
        Self::from_toml_str(&content)
    }

    /// Load a config file, choosing YAML for `.yaml`/`.yml` and TOML otherwise.
    pub fn load_any(path: &Path) -> Result<Self, PolicyError> {
        let content = Self::read(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Load the config if the file exists; an absent file yields the empty config.
    pub fn load_or_default(path: &Path) -> Result<Self, PolicyError> {
        if path.exists() {
            Self::load_any(path)
        } else {
            tracing::debug!("no conductor config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, PolicyError> {
        toml::from_str(content).map_err(|e| PolicyError::ConfigParse(e.to_string()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, PolicyError> {
        serde_yaml::from_str(content).map_err(|e| PolicyError::ConfigParse(e.to_string()))
    }

    /// Look up a profile by name.
    ///
    /// `default` always resolves: to the configured profile if there is one,
    /// otherwise to the empty profile (plain reset, nothing kept).
    pub fn profile(&self, name: &str) -> Result<PolicyProfile, PolicyError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == DEFAULT_PROFILE => Ok(PolicyProfile::default()),
            None => Err(PolicyError::UnknownProfile {
                name: name.to_string(),
            }),
        }
    }

    /// Resolve a handler binding to its profile and overrides.
    pub fn handler(&self, name: &str) -> Result<(PolicyProfile, CallOverrides), PolicyError> {
        let binding = self
            .handlers
            .get(name)
            .ok_or_else(|| PolicyError::UnknownHandler {
                name: name.to_string(),
            })?;
        let profile = self.profile(&binding.profile)?;
        Ok((profile, binding.overrides()))
    }

    fn read(path: &Path) -> Result<String, PolicyError> {
        std::fs::read_to_string(path).map_err(|source| PolicyError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })
    }
}
