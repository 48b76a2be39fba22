// mod.rs — Subcommands and the policy arguments they share.

pub mod apply;
pub mod plan;
pub mod profile;

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use sc_policy::{CallOverrides, ConductorConfig, PolicyProfile, DEFAULT_PROFILE};

/// Which session file, which profile, and which per-call overrides.
#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Session file (a JSON object).
    #[arg(long)]
    pub session: PathBuf,

    /// Profile to apply.
    #[arg(long, conflicts_with = "handler")]
    pub profile: Option<String>,

    /// Handler binding from the config (profile plus its overrides).
    #[arg(long)]
    pub handler: Option<String>,

    /// Extra key to keep across the reset (repeatable).
    #[arg(long = "save", value_name = "KEY")]
    pub save: Vec<String>,

    /// Extra key to destroy; switches cleanup to destroy mode (repeatable).
    #[arg(long = "destroy", value_name = "KEY")]
    pub destroy: Vec<String>,

    /// Extra key to hide while the edit runs (repeatable).
    #[arg(long = "skip", value_name = "KEY")]
    pub skip: Vec<String>,

    /// Extra required key with a default, as KEY=JSON (repeatable).
    #[arg(long = "ensure", value_name = "KEY=JSON", value_parser = parse_assignment)]
    pub ensure: Vec<(String, serde_json::Value)>,
}

impl PolicyArgs {
    /// Resolve the profile and the overrides for this invocation.
    ///
    /// Command-line overrides are added on top of a handler binding's own.
    pub fn resolve(&self, config: &ConductorConfig) -> anyhow::Result<(PolicyProfile, CallOverrides)> {
        let (profile, base) = match (&self.handler, &self.profile) {
            (Some(handler), _) => config
                .handler(handler)
                .with_context(|| format!("resolving handler '{}'", handler))?,
            (None, profile) => {
                let name = profile.as_deref().unwrap_or(DEFAULT_PROFILE);
                let profile = config
                    .profile(name)
                    .with_context(|| format!("resolving profile '{}'", name))?;
                (profile, CallOverrides::new())
            }
        };

        let mut overrides = base
            .save(self.save.iter().cloned())
            .destroy(self.destroy.iter().cloned())
            .skip(self.skip.iter().cloned());
        for (key, value) in &self.ensure {
            overrides = overrides.ensure(key.clone(), value.clone());
        }
        Ok((profile, overrides))
    }
}

/// Parse `KEY=VALUE`. VALUE is read as JSON, falling back to a plain string.
pub fn parse_assignment(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
