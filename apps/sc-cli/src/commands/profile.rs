// profile.rs — Profile subcommands: list, show.

use clap::Subcommand;
use sc_policy::ConductorConfig;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List configured profiles and handler bindings.
    List,
    /// Print one profile as JSON.
    Show {
        /// Profile name.
        name: String,
    },
}

pub fn execute(cmd: &ProfileCommands, config: &ConductorConfig) -> anyhow::Result<()> {
    match cmd {
        ProfileCommands::List => {
            if config.profiles.is_empty() && config.handlers.is_empty() {
                println!("No profiles configured (the empty 'default' profile applies).");
                return Ok(());
            }

            println!("{:<20} {:<6} {:<8} {:<6} {:<6}", "PROFILE", "SAVE", "DESTROY", "SKIP", "ENSURE");
            println!("{}", "-".repeat(50));
            for (name, profile) in &config.profiles {
                println!(
                    "{:<20} {:<6} {:<8} {:<6} {:<6}",
                    name,
                    profile.save().len(),
                    profile.destroy().len(),
                    profile.skip().len(),
                    profile.ensure().len(),
                );
            }

            if !config.handlers.is_empty() {
                println!();
                println!("{:<20} PROFILE", "HANDLER");
                println!("{}", "-".repeat(50));
                for (name, handler) in &config.handlers {
                    println!("{:<20} {}", name, handler.profile);
                }
            }
        }

        ProfileCommands::Show { name } => {
            let profile = config.profile(name)?;
            super::print_json(&profile)?;
        }
    }

    Ok(())
}
