use std::io::{IsTerminal, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::Args;

use gitgym::exercises::track::Track;
use gitgym::session::{self, CheckOptions};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Exercise slug (inferred from the current branch if omitted)
    exercise: Option<String>,

    /// Stop on first unmet goal
    #[arg(long)]
    fail_fast: bool,

    /// Print hints for unmet goals
    #[arg(long)]
    hints: bool,
}

/// Run the check subcommand.
///
/// # Errors
///
/// Returns an error if grading or IO fails.
pub fn run(args: &CheckArgs, track: &Track, cwd: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let opts = CheckOptions {
        fail_fast: args.fail_fast,
        show_hints: args.hints,
    };
    let report = session::check(track, args.exercise.as_deref(), cwd, &opts)?;
    if report.exit_code == 0 {
        return Ok(ExitCode::SUCCESS);
    }

    // On failure in an interactive terminal, offer the hints we held back
    if !args.hints
        && report.unmet.iter().any(|goal| goal.hint.is_some())
        && std::io::stdin().is_terminal()
        && std::io::stderr().is_terminal()
    {
        eprint!("Show hints? [y/N] ");
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if answer.trim().eq_ignore_ascii_case("y") {
            for goal in &report.unmet {
                if let Some(ref hint) = goal.hint {
                    eprintln!("{}: {hint}", goal.label);
                }
            }
        }
    }

    Ok(ExitCode::FAILURE)
}
