use std::process::ExitCode;

use clap::Args;

#[derive(Args, Debug)]
pub struct UserArgs {
    /// Display name to commit as; omit to clear the local identity
    name: Option<String>,
}

/// Run the user subcommand.
///
/// # Errors
///
/// Returns an error if no repository is found or the config cannot be written.
pub fn run(args: &UserArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    gitgym::identity::run(&cwd, args.name.as_deref())?;
    Ok(ExitCode::SUCCESS)
}
