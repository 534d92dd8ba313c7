pub mod config;
pub mod index;
pub mod touch;
pub mod types;

pub use config::ConfigService;
pub use index::{game_slug_from_ref, BuildReport, CollectionReport, GamesMap, IndexBuilder};
pub use touch::{TouchOutcome, TouchService};
pub use types::{
    fold, pick_extras, Build, ClientConfig, Collection, ContentConfig, Extras, Game, GameMeta,
    GameStatus, Guide, Index, SiteConfig, Tool, ViewsConfig, EXTRA_KEYS,
};

