use super::filter::{select, Entry, Query, SearchFilters};
use super::paginate::{BatchCursor, Pager};
use super::source::{fetch_index, FetchError, IndexSource};
use super::views::view_key;
use crate::services::{Build, Collection, Game, Guide, Tool};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// One collection as the catalog sees it: everything fetched, what the current
/// filters leave visible, and how far incremental rendering has got.
#[derive(Debug, Clone)]
pub struct CollectionState<T> {
    items: Vec<T>,
    visible: Vec<usize>,
    error: Option<FetchError>,
    cursor: BatchCursor,
}

impl<T: Entry> CollectionState<T> {
    fn new(batch_size: usize) -> Self {
        Self {
            items: Vec::new(),
            visible: Vec::new(),
            error: None,
            cursor: BatchCursor::new(batch_size),
        }
    }

    fn settle(&mut self, outcome: Result<Vec<T>, FetchError>) {
        match outcome {
            Ok(items) => {
                self.visible = (0..items.len()).collect();
                self.items = items;
                self.error = None;
            },
            Err(e) => {
                self.items.clear();
                self.visible.clear();
                self.error = Some(e);
            },
        }
        self.cursor.reset();
    }

    fn clear(&mut self) {
        self.items.clear();
        self.visible.clear();
        self.error = None;
        self.cursor.reset();
    }

    fn refilter(&mut self, query: &Query, filters: &SearchFilters) {
        self.visible = select(&self.items, query, filters);
        self.cursor.reset();
    }

    /// Everything fetched, in index order
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Entries passing the current query and filters, in index order
    pub fn visible(&self) -> impl Iterator<Item = &T> + '_ {
        self.visible.iter().map(|&position| &self.items[position])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Why the last load left this collection empty, if it failed
    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more(self.visible.len())
    }

    /// Next incremental batch of visible entries; empty once exhausted
    pub fn next_batch(&mut self) -> Vec<&T> {
        match self.cursor.next_range(self.visible.len()) {
            Some(range) => self.visible[range]
                .iter()
                .map(|&position| &self.items[position])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Visible entries on the pager's current page
    pub fn page(&self, pager: &Pager) -> Vec<&T> {
        pager
            .slice(&self.visible)
            .iter()
            .map(|&position| &self.items[position])
            .collect()
    }

    /// A pager sized to the visible entries
    pub fn pager(&self, page_size: usize) -> Pager {
        Pager::new(self.visible.len(), page_size)
    }
}

/// Loaded state of every collection plus the active query, filters and view
/// counts. Mutated only through its own methods.
pub struct LoaderContext {
    games: CollectionState<Game>,
    builds: CollectionState<Build>,
    guides: CollectionState<Guide>,
    tools: CollectionState<Tool>,
    query: Query,
    filters: SearchFilters,
    views: HashMap<String, u64>,
}

impl LoaderContext {
    pub fn new(batch_size: usize) -> Self {
        Self {
            games: CollectionState::new(batch_size),
            builds: CollectionState::new(batch_size),
            guides: CollectionState::new(batch_size),
            tools: CollectionState::new(batch_size),
            query: Query::default(),
            filters: SearchFilters::default(),
            views: HashMap::new(),
        }
    }

    /// Fetch the given collections concurrently. Each one settles on its
    /// own: a failed fetch leaves that collection empty with its error
    /// recorded and never affects the others.
    pub async fn load(&mut self, source: &dyn IndexSource, collections: &[Collection]) {
        let wanted = |c: Collection| collections.contains(&c);
        let (games, builds, guides, tools) = futures::join!(
            fetch_if::<Game>(source, Collection::Games, wanted(Collection::Games)),
            fetch_if::<Build>(source, Collection::Builds, wanted(Collection::Builds)),
            fetch_if::<Guide>(source, Collection::Guides, wanted(Collection::Guides)),
            fetch_if::<Tool>(source, Collection::Tools, wanted(Collection::Tools)),
        );

        if let Some(outcome) = games {
            self.games.settle(outcome);
        }
        if let Some(outcome) = builds {
            self.builds.settle(outcome);
        }
        if let Some(outcome) = guides {
            self.guides.settle(outcome);
        }
        if let Some(outcome) = tools {
            self.tools.settle(outcome);
        }

        self.refilter();
    }

    /// Replace the active query and filters and recompute what is visible
    pub fn apply(&mut self, query: &str, filters: SearchFilters) {
        self.query = Query::parse(query);
        self.filters = filters;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.games.refilter(&self.query, &self.filters);
        self.builds.refilter(&self.query, &self.filters);
        self.guides.refilter(&self.query, &self.filters);
        self.tools.refilter(&self.query, &self.filters);
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn games(&self) -> &CollectionState<Game> {
        &self.games
    }

    pub fn games_mut(&mut self) -> &mut CollectionState<Game> {
        &mut self.games
    }

    pub fn builds(&self) -> &CollectionState<Build> {
        &self.builds
    }

    pub fn builds_mut(&mut self) -> &mut CollectionState<Build> {
        &mut self.builds
    }

    pub fn guides(&self) -> &CollectionState<Guide> {
        &self.guides
    }

    pub fn guides_mut(&mut self) -> &mut CollectionState<Guide> {
        &mut self.guides
    }

    pub fn tools(&self) -> &CollectionState<Tool> {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut CollectionState<Tool> {
        &mut self.tools
    }

    pub fn error(&self, collection: Collection) -> Option<&FetchError> {
        match collection {
            Collection::Games => self.games.error(),
            Collection::Builds => self.builds.error(),
            Collection::Guides => self.guides.error(),
            Collection::Tools => self.tools.error(),
        }
    }

    /// Number of visible entries in a collection
    pub fn total(&self, collection: Collection) -> usize {
        match collection {
            Collection::Games => self.games.visible_len(),
            Collection::Builds => self.builds.visible_len(),
            Collection::Guides => self.guides.visible_len(),
            Collection::Tools => self.tools.visible_len(),
        }
    }

    /// View-counter keys for the visible entries of a collection
    pub fn view_keys(&self, collection: Collection) -> Vec<String> {
        let slugs: Vec<&str> = match collection {
            Collection::Games => self.games.visible().map(Entry::slug).collect(),
            Collection::Builds => self.builds.visible().map(Entry::slug).collect(),
            Collection::Guides => self.guides.visible().map(Entry::slug).collect(),
            Collection::Tools => self.tools.visible().map(Entry::slug).collect(),
        };
        slugs
            .into_iter()
            .map(|slug| view_key(collection, slug))
            .collect()
    }

    pub fn record_views(&mut self, counts: HashMap<String, u64>) {
        self.views.extend(counts);
    }

    /// Known view count of an entry, if the counter reported one
    pub fn views_for(&self, collection: Collection, slug: &str) -> Option<u64> {
        self.views.get(&view_key(collection, slug)).copied()
    }

    /// Forget everything: fetched indexes, errors, query, filters and view counts
    pub fn reset(&mut self) {
        self.games.clear();
        self.builds.clear();
        self.guides.clear();
        self.tools.clear();
        self.query = Query::default();
        self.filters = SearchFilters::default();
        self.views.clear();
    }
}

async fn fetch_if<T: DeserializeOwned>(
    source: &dyn IndexSource,
    collection: Collection,
    wanted: bool,
) -> Option<Result<Vec<T>, FetchError>> {
    if !wanted {
        return None;
    }
    let outcome = fetch_index::<T>(source, collection).await;
    match &outcome {
        Ok(items) => tracing::debug!(%collection, count = items.len(), "Index loaded"),
        Err(e) => tracing::warn!(%collection, error = %e, "Index unavailable, showing empty"),
    }
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::GameStatus;
    use crate::testing::MemorySource;
    use serde_json::json;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_json(
                "games/index.json",
                json!({"items": [
                    {"slug": "poe", "name": "Path of Exile", "status": "active"},
                    {"slug": "d3", "name": "Diablo III", "status": "archived"}
                ]}),
            )
            .with_json(
                "builds/index.json",
                json!({"items": [
                    {"slug": "necro", "title": "Bone Necro", "tier": "S", "gameName": "poe", "gameStatus": "active"},
                    {"slug": "witch", "title": "Frost Witch", "tier": "A", "gameName": "poe", "gameStatus": "active"},
                    {"slug": "barb", "title": "Whirlwind Barb", "tier": "S", "gameName": "d3", "gameStatus": "archived"}
                ]}),
            )
            .with_failure("guides/index.json", FetchError::Transient("offline".to_string()))
    }

    #[tokio::test]
    async fn load_settles_each_collection_independently() {
        let mut context = LoaderContext::new(12);
        context.load(&source(), &Collection::ALL).await;

        assert_eq!(context.games().items().len(), 2);
        assert_eq!(context.builds().items().len(), 3);
        assert!(context.guides().items().is_empty());
        assert_eq!(
            context.error(Collection::Guides),
            Some(&FetchError::Transient("offline".to_string()))
        );
        assert!(context.error(Collection::Tools).unwrap().is_not_found());
        assert!(context.error(Collection::Builds).is_none());
    }

    #[tokio::test]
    async fn archived_entries_hidden_by_default() {
        let mut context = LoaderContext::new(12);
        context.load(&source(), &[Collection::Games, Collection::Builds]).await;

        let slugs: Vec<&str> = context.builds().visible().map(|b| b.slug.as_str()).collect();
        assert_eq!(slugs, vec!["necro", "witch"]);
        assert_eq!(context.total(Collection::Games), 1);
    }

    #[tokio::test]
    async fn apply_filters_and_query() {
        let mut context = LoaderContext::new(12);
        context.load(&source(), &[Collection::Builds]).await;

        context.apply(
            "bone",
            SearchFilters {
                tier: Some("s".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(context.total(Collection::Builds), 1);

        context.apply(
            "",
            SearchFilters {
                status: Some(GameStatus::Archived),
                ..Default::default()
            },
        );
        let slugs: Vec<&str> = context.builds().visible().map(|b| b.slug.as_str()).collect();
        assert_eq!(slugs, vec!["barb"]);

        context.apply("", SearchFilters::default());
        assert_eq!(context.total(Collection::Builds), 2);
    }

    #[tokio::test]
    async fn reset_forgets_loaded_state() {
        let mut context = LoaderContext::new(12);
        context.load(&source(), &Collection::ALL).await;
        context.record_views(HashMap::from([("games:poe".to_string(), 3)]));
        context.apply("exile", SearchFilters::default());

        context.reset();

        assert!(context.games().items().is_empty());
        assert!(context.error(Collection::Guides).is_none());
        assert!(context.query().is_empty());
        assert_eq!(context.views_for(Collection::Games, "poe"), None);
    }

    #[tokio::test]
    async fn next_batch_restarts_after_filter_change() {
        let mut context = LoaderContext::new(1);
        context.load(&source(), &[Collection::Builds]).await;

        assert_eq!(context.builds_mut().next_batch()[0].slug, "necro");
        assert_eq!(context.builds_mut().next_batch()[0].slug, "witch");
        assert!(context.builds_mut().next_batch().is_empty());

        context.apply("", SearchFilters::default());
        assert!(context.builds().has_more());
        assert_eq!(context.builds_mut().next_batch()[0].slug, "necro");
    }

    #[tokio::test]
    async fn page_follows_pager() {
        let mut context = LoaderContext::new(12);
        context.load(&source(), &[Collection::Builds]).await;
        context.apply(
            "",
            SearchFilters {
                include_archived: true,
                ..Default::default()
            },
        );

        let mut pager = context.builds().pager(2);
        assert_eq!(pager.info(), "1/2");
        pager.next();
        let page = context.builds().page(&pager);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].slug, "barb");
    }

    #[tokio::test]
    async fn view_counts_are_keyed_by_collection_and_slug() {
        let mut context = LoaderContext::new(12);
        context.load(&source(), &[Collection::Builds]).await;

        assert_eq!(
            context.view_keys(Collection::Builds),
            vec!["builds:necro".to_string(), "builds:witch".to_string()]
        );

        context.record_views(HashMap::from([("builds:necro".to_string(), 42)]));
        assert_eq!(context.views_for(Collection::Builds, "necro"), Some(42));
        assert_eq!(context.views_for(Collection::Builds, "witch"), None);
    }

    #[tokio::test]
    async fn unloaded_collections_are_left_alone() {
        let mut source = crate::catalog::source::MockIndexSource::new();
        source
            .expect_fetch()
            .withf(|path| path == "tools/index.json")
            .times(1)
            .returning(|_| Ok(br#"{"items":[{"slug":"planner","title":"Planner"}]}"#.to_vec()));

        let mut context = LoaderContext::new(12);
        context.load(&source, &[Collection::Tools]).await;

        assert_eq!(context.total(Collection::Tools), 1);
        assert!(context.error(Collection::Games).is_none());
        assert!(context.games().items().is_empty());
    }
}
