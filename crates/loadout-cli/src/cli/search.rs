use super::open_source;
use anyhow::Result;
use clap::Args;
use loadout::catalog::{
    CollectionState, Entry, LoaderContext, RenderMode, SearchFilters, ViewCounter,
};
use loadout::services::{Collection, ConfigService, GameStatus};
use serde::Serialize;
use std::path::Path;

#[derive(Args)]
pub struct SearchArgs {
    /// Collection to search (games, builds, guides, tools)
    collection: Collection,

    /// Free-text query; every word must match
    query: Option<String>,

    /// Filter by parent game slug
    #[arg(long)]
    game: Option<String>,

    /// Filter builds by tier
    #[arg(long)]
    tier: Option<String>,

    /// Filter builds by version (substring)
    #[arg(long)]
    version: Option<String>,

    /// Filter tools by kind
    #[arg(long)]
    kind: Option<String>,

    /// Filter by game status (active, archived)
    #[arg(long)]
    status: Option<GameStatus>,

    /// Keep entries of archived games
    #[arg(long)]
    include_archived: bool,

    /// Page to show, starting at 1
    #[arg(long, default_value = "1", conflicts_with = "all")]
    page: usize,

    /// Show every match instead of one page
    #[arg(long)]
    all: bool,

    /// Show the first incremental batch (client.batch_size entries)
    #[arg(long, conflicts_with_all = ["all", "page"])]
    batch: bool,

    /// Entries per page (defaults to client.page_size)
    #[arg(long)]
    page_size: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Read indexes from this site URL instead of the content directory
    #[arg(long)]
    base_url: Option<String>,

    /// Fetch view counts from views.endpoint
    #[arg(long)]
    views: bool,
}

pub async fn execute(args: SearchArgs, root: &Path) -> Result<()> {
    let config = ConfigService::new(root).load()?;
    let source = open_source(root, args.base_url.as_deref())?;

    let mut context = LoaderContext::new(config.client.batch_size);
    context.load(source.as_ref(), &[args.collection]).await;
    if let Some(e) = context.error(args.collection) {
        if !e.is_not_found() {
            eprintln!("Warning: {} index unavailable: {}", args.collection, e);
        }
    }

    let filters = SearchFilters {
        game: args.game.clone(),
        tier: args.tier.clone(),
        version: args.version.clone(),
        kind: args.kind.clone(),
        status: args.status,
        include_archived: args.include_archived,
    };
    context.apply(args.query.as_deref().unwrap_or_default(), filters);

    if args.views {
        match config.views.endpoint.as_deref() {
            Some(endpoint) => {
                let counter = ViewCounter::new(endpoint);
                let counts = counter.counts(&context.view_keys(args.collection)).await;
                context.record_views(counts);
            },
            None => eprintln!("Warning: views.endpoint is not configured"),
        }
    }

    let mode = if args.all {
        RenderMode::All
    } else if args.batch {
        RenderMode::Incremental {
            batch_size: config.client.batch_size,
        }
    } else {
        RenderMode::Paged {
            page_size: args.page_size.unwrap_or(config.client.page_size),
        }
    };
    match args.collection {
        Collection::Games => show_results(&context, context.games(), &args, mode),
        Collection::Builds => show_results(&context, context.builds(), &args, mode),
        Collection::Guides => show_results(&context, context.guides(), &args, mode),
        Collection::Tools => show_results(&context, context.tools(), &args, mode),
    }
}

fn show_results<T: Entry + Serialize>(
    context: &LoaderContext,
    state: &CollectionState<T>,
    args: &SearchArgs,
    mode: RenderMode,
) -> Result<()> {
    let total = state.visible_len();
    let (entries, page_label): (Vec<&T>, Option<String>) = match mode {
        RenderMode::Paged { page_size } => {
            let mut pager = state.pager(page_size);
            pager.go_to(args.page);
            (state.page(&pager), Some(pager.info()))
        },
        RenderMode::Incremental { batch_size } => {
            (state.visible().take(batch_size).collect(), None)
        },
        RenderMode::All => (state.visible().collect(), None),
    };

    if args.json {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|entry| -> Result<serde_json::Value> {
                let mut value = serde_json::to_value(entry)?;
                if let Some(views) = context.views_for(args.collection, entry.slug()) {
                    value["views"] = views.into();
                }
                Ok(value)
            })
            .collect::<Result<_>>()?;
        let output = serde_json::json!({
            "collection": args.collection,
            "total": total,
            "page": page_label,
            "items": items,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No {} found", args.collection);
        return Ok(());
    }

    for entry in &entries {
        println!("{}", describe(context, args.collection, *entry));
    }
    match page_label {
        Some(label) => println!("\nPage {} ({} results)", label, total),
        None if entries.len() < total => {
            println!("\nShowing {} of {} results", entries.len(), total)
        },
        None => println!("\n{} results", total),
    }

    Ok(())
}

fn describe<T: Entry>(context: &LoaderContext, collection: Collection, entry: &T) -> String {
    let mut line = format!("{}  {}", entry.slug(), entry.label());

    let mut tags: Vec<String> = Vec::new();
    if collection.has_parent() && !entry.parent_game().is_empty() {
        tags.push(format!("game: {}", entry.parent_game()));
    }
    for (name, value) in [
        ("tier", entry.tier()),
        ("version", entry.version()),
        ("kind", entry.kind()),
    ] {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            tags.push(format!("{}: {}", name, value));
        }
    }
    if entry.status().is_archived() {
        tags.push("archived".to_string());
    }
    if let Some(views) = context.views_for(collection, entry.slug()) {
        tags.push(format!("{} views", views));
    }

    if !tags.is_empty() {
        line.push_str(&format!("  [{}]", tags.join(", ")));
    }
    line
}
