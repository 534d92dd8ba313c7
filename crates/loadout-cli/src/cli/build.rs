use anyhow::Result;
use clap::Args;
use loadout::services::{Collection, CollectionReport, ConfigService, IndexBuilder};
use std::path::Path;

#[derive(Args, Default)]
pub struct BuildArgs {
    /// Rebuild a single collection (games, builds, guides, tools)
    #[arg(long)]
    only: Option<Collection>,
}

pub async fn execute(args: BuildArgs, root: &Path) -> Result<()> {
    let config_service = ConfigService::new(root);
    let content_root = config_service.resolve_content_root()?;
    let builder = IndexBuilder::new(content_root);

    let reports = match args.only {
        Some(collection) => vec![builder.build_collection(collection).await?],
        None => builder.build_all().await?.collections,
    };

    for report in &reports {
        print_report(report);
    }

    let defaulted: usize = reports.iter().map(|r| r.defaulted).sum();
    if defaulted > 0 {
        println!(
            "{} content file(s) could not be read and were indexed with defaults",
            defaulted
        );
    }

    Ok(())
}

fn print_report(report: &CollectionReport) {
    println!(
        "Wrote {} ({} {})",
        report.path.display(),
        report.items,
        if report.items == 1 { "item" } else { "items" }
    );
}
