// plan.rs — Dry-run a policy against a session file.
//
// Prints the CleanupPlan as JSON; the session file is only read.

use sc_policy::{ConductorConfig, PolicyExecutor};
use sc_session::SessionFile;

use super::PolicyArgs;

pub fn execute(args: &PolicyArgs, config: &ConductorConfig) -> anyhow::Result<()> {
    let (profile, overrides) = args.resolve(config)?;
    let session = SessionFile::new(&args.session).load()?;

    let policy = profile.effective(&overrides);
    let plan = PolicyExecutor::plan(&session, &policy);

    if !plan.missing.is_empty() {
        tracing::warn!(
            "session is missing required key(s): {}",
            plan.missing.join(", ")
        );
    }
    super::print_json(&plan)
}
