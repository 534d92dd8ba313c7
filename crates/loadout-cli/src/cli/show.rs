use super::open_source;
use anyhow::Result;
use clap::Args;
use loadout::catalog::{fetch_detail, FetchError, ViewCounter};
use loadout::services::{Collection, ConfigService};
use std::path::Path;

#[derive(Args)]
pub struct ShowArgs {
    /// Collection of the entry (games, builds, guides, tools)
    collection: Collection,

    /// Entry slug
    slug: String,

    /// Read records from this site URL instead of the content directory
    #[arg(long)]
    base_url: Option<String>,
}

pub async fn execute(args: ShowArgs, root: &Path) -> Result<()> {
    let config = ConfigService::new(root).load()?;
    let source = open_source(root, args.base_url.as_deref())?;

    let detail = match fetch_detail(source.as_ref(), args.collection, &args.slug).await {
        Ok(detail) => detail,
        Err(FetchError::NotFound(_)) => {
            println!("Not found: {}/{}", args.collection, args.slug);
            return Ok(());
        },
        Err(e) => return Err(e.into()),
    };

    println!("{}", serde_json::to_string_pretty(&detail)?);

    if let Some(endpoint) = config.views.endpoint.as_deref() {
        let counted = ViewCounter::new(endpoint)
            .increment(args.collection, &args.slug)
            .await;
        tracing::debug!(counted, "View increment");
    }

    Ok(())
}
