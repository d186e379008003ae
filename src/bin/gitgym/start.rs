use std::path::Path;
use std::process::ExitCode;

use clap::Args;

use gitgym::exercises::track::Track;

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Exercise slug to start
    exercise: String,

    /// Recreate the work branch if it already exists
    #[arg(long)]
    force: bool,
}

/// Run the start subcommand.
///
/// # Errors
///
/// Returns an error if the exercise is unknown or branch setup fails.
pub fn run(args: &StartArgs, track: &Track, cwd: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    gitgym::session::start(track, &args.exercise, cwd, args.force)?;
    Ok(ExitCode::SUCCESS)
}
