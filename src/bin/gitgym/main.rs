mod cheat;
mod check;
mod list;
mod start;
mod user;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gitgym::load_manifest;

#[derive(Parser, Debug)]
#[command(name = "gitgym", about = "Branch-based git exercises with automated checks")]
struct Cli {
    /// Path to exercise manifest (auto-detected if not specified)
    #[arg(short, long)]
    manifest: Option<String>,

    /// Log file path (enables file logging in addition to stderr)
    #[arg(long)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List exercises in prerequisite order with progress markers
    List,
    /// Start an exercise on its work branch
    Start(start::StartArgs),
    /// Grade the repository against an exercise's goals
    Check(check::CheckArgs),
    /// Set or clear the repository-local committer identity
    User(user::UserArgs),
    /// Print a command cheatsheet
    Cheat(cheat::CheatArgs),
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = match cli.log_file {
        Some(ref path) => Some(std::fs::File::create(path)?),
        None => None,
    };
    gitgym::logger::init(log_file);

    // `user` and `cheat` work without a manifest; the rest load it first
    match cli.command {
        Commands::User(ref args) => user::run(args),
        Commands::Cheat(ref args) => cheat::run(args),
        Commands::List => {
            let (track, cwd, _) = load_manifest(cli.manifest.as_deref())?;
            list::run(&track, &cwd)
        }
        Commands::Start(ref args) => {
            let (track, cwd, _) = load_manifest(cli.manifest.as_deref())?;
            start::run(args, &track, &cwd)
        }
        Commands::Check(ref args) => {
            let (track, cwd, _) = load_manifest(cli.manifest.as_deref())?;
            check::run(args, &track, &cwd)
        }
    }
}
