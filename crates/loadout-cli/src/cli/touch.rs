use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use loadout::services::{ConfigService, TouchOutcome, TouchService};
use std::path::Path;

#[derive(Args)]
pub struct TouchArgs {
    /// Changed files, relative to the project root. Read from the
    /// newline-separated MODIFIED variable when none are given.
    files: Vec<String>,

    /// Date to stamp instead of today (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
}

pub async fn execute(args: TouchArgs, root: &Path) -> Result<()> {
    let config = ConfigService::new(root).load()?;

    let files = if args.files.is_empty() {
        modified_from_env()
    } else {
        args.files
    };
    if files.is_empty() {
        println!("No modified files");
        return Ok(());
    }

    let today = args.date.unwrap_or_else(|| chrono::Utc::now().date_naive());
    let service = TouchService::new(root, &config.content.root);
    let outcomes = service.touch(&files, today).await;

    let mut updated = 0;
    for outcome in &outcomes {
        match outcome {
            TouchOutcome::Updated(path) => {
                updated += 1;
                println!("Touched {}", path.display());
            },
            TouchOutcome::Skipped { path, reason } => {
                println!("Skipped {}: {}", path.display(), reason);
            },
            TouchOutcome::Ignored(_) => {},
        }
    }
    println!("Updated {} file(s)", updated);

    Ok(())
}

fn modified_from_env() -> Vec<String> {
    std::env::var("MODIFIED")
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
