//! Client-side catalog loading: fetch the generated indexes, filter them,
//! and hand them out page by page or batch by batch.

pub mod context;
pub mod filter;
pub mod paginate;
pub mod source;
pub mod views;

pub use context::{CollectionState, LoaderContext};
pub use filter::{filter_entries, select, Entry, Query, SearchFilters};
pub use paginate::{BatchCursor, Pager, RenderMode};
pub use source::{fetch_detail, fetch_index, FetchError, FsSource, HttpSource, IndexSource};
pub use views::{view_key, ViewCounter};

/// Cards per page for fixed-page navigation
pub const DEFAULT_PAGE_SIZE: usize = 3;

/// Cards per batch for incremental (scroll-driven) rendering
pub const DEFAULT_BATCH_SIZE: usize = 12;
