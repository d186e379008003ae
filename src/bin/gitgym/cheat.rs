use std::process::ExitCode;

use clap::Args;

use gitgym::cheatsheet;

#[derive(Args, Debug)]
pub struct CheatArgs {
    /// Topic to print; omit to list available topics
    topic: Option<String>,
}

/// Run the cheat subcommand.
///
/// # Errors
///
/// Returns an error naming the known topics when the requested one does
/// not exist.
pub fn run(args: &CheatArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match args.topic.as_deref() {
        Some(slug) => match cheatsheet::find(slug) {
            Some(topic) => {
                println!("{}", topic.body.trim_end());
                Ok(ExitCode::SUCCESS)
            }
            None => {
                let known: Vec<&str> = cheatsheet::TOPICS.iter().map(|t| t.slug).collect();
                Err(format!("unknown topic `{slug}` (available: {})", known.join(", ")).into())
            }
        },
        None => {
            for topic in cheatsheet::TOPICS {
                println!("{:<12} {}", topic.slug, topic.title);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
