use std::path::Path;
use std::process::ExitCode;

use gitgym::exercises::track::Track;

/// Run the list subcommand.
///
/// # Errors
///
/// Returns an error if the progress ledger cannot be read.
pub fn run(track: &Track, cwd: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    gitgym::session::list(track, cwd)?;
    Ok(ExitCode::SUCCESS)
}
