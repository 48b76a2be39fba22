// apply.rs — Run a scripted session edit under a policy.
//
// The "handler" here is the list of --set/--unset edits. It runs against the
// session after the policy's cleanup, exactly as a request handler would, and
// the result is written back to the session file. A missing required key
// aborts before anything is written.

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use sc_policy::{ConductorConfig, ExecutionTrace, InsertDefault, PolicyExecutor};
use sc_session::{MemorySession, Session, SessionFile};

use super::{parse_assignment, PolicyArgs};

/// Edits performed by the protected handler.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Store KEY=JSON in the session (repeatable).
    #[arg(long = "set", value_name = "KEY=JSON", value_parser = parse_assignment)]
    pub set: Vec<(String, Value)>,

    /// Remove KEY from the session (repeatable).
    #[arg(long = "unset", value_name = "KEY")]
    pub unset: Vec<String>,

    /// Fill missing required keys from their defaults instead of failing.
    #[arg(long)]
    pub insert_defaults: bool,
}

#[derive(Serialize)]
struct ApplyReport<'a> {
    trace: &'a ExecutionTrace,
    session: &'a MemorySession,
}

pub fn execute(
    args: &PolicyArgs,
    edits: &EditArgs,
    config: &ConductorConfig,
) -> anyhow::Result<()> {
    let (profile, overrides) = args.resolve(config)?;
    let file = SessionFile::new(&args.session);
    let mut session = file.load()?;

    let mut executor = PolicyExecutor::new(profile);
    if edits.insert_defaults {
        executor = executor.with_missing_key_handler(Arc::new(InsertDefault));
    }

    let ((), trace) = executor
        .protect_traced(&mut session, &overrides, |s: &mut MemorySession| {
            apply_edits(s, edits);
            Ok::<_, Infallible>(())
        })
        .with_context(|| format!("applying policy to {}", file.path().display()))?;

    file.save(&session)?;
    tracing::info!(
        "applied {:?} policy to {}: {} removed, {} restored",
        trace.plan.mode,
        file.path().display(),
        trace.plan.remove.len(),
        trace.restored.len()
    );

    super::print_json(&ApplyReport {
        trace: &trace,
        session: &session,
    })
}

fn apply_edits(session: &mut dyn Session, edits: &EditArgs) {
    for (key, value) in &edits.set {
        session.insert(key.clone(), value.clone());
    }
    for key in &edits.unset {
        session.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edits_set_then_unset() {
        let mut session: MemorySession = [("a", json!(1)), ("b", json!(2))].into_iter().collect();
        let edits = EditArgs {
            set: vec![("c".to_string(), json!(3)), ("a".to_string(), json!(10))],
            unset: vec!["b".to_string()],
            insert_defaults: false,
        };

        apply_edits(&mut session, &edits);

        assert_eq!(session.keys(), vec!["a", "c"]);
        assert_eq!(session.get("a"), Some(&json!(10)));
    }
}
