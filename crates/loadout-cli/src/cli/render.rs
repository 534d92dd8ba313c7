use anyhow::Result;
use clap::Args;
use loadout::catalog::{FsSource, LoaderContext, SearchFilters};
use loadout::render::{render_cards, RenderService};
use loadout::services::{Collection, ConfigService};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct RenderArgs {
    /// Output directory, relative to the project root
    #[arg(long, default_value = "cards")]
    output: PathBuf,

    /// Keep cards of archived games
    #[arg(long)]
    include_archived: bool,
}

pub async fn execute(args: RenderArgs, root: &Path) -> Result<()> {
    let config_service = ConfigService::new(root);
    let config = config_service.load()?;
    let source = FsSource::new(config_service.resolve_content_root()?);

    let mut context = LoaderContext::new(config.client.batch_size);
    context.load(&source, &Collection::ALL).await;
    context.apply(
        "",
        SearchFilters {
            include_archived: args.include_archived,
            ..Default::default()
        },
    );

    let output = root.join(&args.output);
    let render_service = RenderService::new(output.clone());

    for collection in Collection::ALL {
        let markup = match collection {
            Collection::Games => render_cards(context.games().visible()),
            Collection::Builds => render_cards(context.builds().visible()),
            Collection::Guides => render_cards(context.guides().visible()),
            Collection::Tools => render_cards(context.tools().visible()),
        };
        let path = render_service.write_fragment(collection, &markup).await?;
        println!(
            "Rendered {} {} to {}",
            context.total(collection),
            collection,
            path.display()
        );
    }

    Ok(())
}
