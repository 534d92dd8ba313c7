use crate::services::{fold, Build, Extras, Game, GameStatus, Guide, Tool};
use serde_json::Value;

/// An index record the catalog can search and filter
pub trait Entry {
    fn slug(&self) -> &str;

    /// Display title (a game's name)
    fn label(&self) -> &str;

    /// Slug of the game this entry belongs to; a game is its own parent
    fn parent_game(&self) -> &str;

    /// Effective status: a game's own, otherwise the parent's
    fn status(&self) -> GameStatus;

    fn tier(&self) -> Option<&str> {
        None
    }

    fn version(&self) -> Option<&str> {
        None
    }

    fn kind(&self) -> Option<&str> {
        None
    }

    /// Text fields that feed free-text search
    fn search_fields(&self) -> Vec<&str>;

    fn extras(&self) -> &Extras;

    /// Folded blob of every searchable field plus string tags
    fn search_blob(&self) -> String {
        let mut parts: Vec<&str> = self.search_fields();
        match self.extras().get("tags") {
            Some(Value::Array(tags)) => parts.extend(tags.iter().filter_map(Value::as_str)),
            Some(Value::String(tag)) => parts.push(tag.as_str()),
            _ => {},
        }
        fold(&parts.join(" "))
    }
}

impl Entry for Game {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn parent_game(&self) -> &str {
        &self.slug
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.short.as_str(),
            self.publisher.as_str(),
            self.slug.as_str(),
        ]
    }

    fn extras(&self) -> &Extras {
        &self.extras
    }
}

impl Entry for Build {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn label(&self) -> &str {
        &self.title
    }

    fn parent_game(&self) -> &str {
        &self.game_name
    }

    fn status(&self) -> GameStatus {
        self.game_status
    }

    fn tier(&self) -> Option<&str> {
        Some(self.tier.as_str())
    }

    fn version(&self) -> Option<&str> {
        Some(self.version.as_str())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.summary.as_str(),
            self.tier.as_str(),
            self.version.as_str(),
            self.difficulty.as_str(),
            self.game_name.as_str(),
            self.game_display_name.as_str(),
            self.slug.as_str(),
        ]
    }

    fn extras(&self) -> &Extras {
        &self.extras
    }
}

impl Entry for Guide {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn label(&self) -> &str {
        &self.title
    }

    fn parent_game(&self) -> &str {
        &self.game_name
    }

    fn status(&self) -> GameStatus {
        self.game_status
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.resource.as_str(),
            self.route.as_str(),
            self.game_name.as_str(),
            self.game_display_name.as_str(),
            self.slug.as_str(),
        ]
    }

    fn extras(&self) -> &Extras {
        &self.extras
    }
}

impl Entry for Tool {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn label(&self) -> &str {
        &self.title
    }

    fn parent_game(&self) -> &str {
        &self.game_name
    }

    fn status(&self) -> GameStatus {
        self.game_status
    }

    fn kind(&self) -> Option<&str> {
        Some(self.kind.as_str())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.kind.as_str(),
            self.notes.as_str(),
            self.url.as_str(),
            self.game_name.as_str(),
            self.game_display_name.as_str(),
            self.slug.as_str(),
        ]
    }

    fn extras(&self) -> &Extras {
        &self.extras
    }
}

/// Free-text query: folded, whitespace-separated tokens that must all match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    tokens: Vec<String>,
}

impl Query {
    pub fn parse(text: &str) -> Self {
        Self {
            tokens: fold(text).split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Every token must occur somewhere in the folded blob
    pub fn matches(&self, blob: &str) -> bool {
        self.tokens.iter().all(|token| blob.contains(token.as_str()))
    }
}

/// Structured filters, applied before free-text search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Parent game slug, exact
    pub game: Option<String>,
    /// Build tier, case-insensitive exact
    pub tier: Option<String>,
    /// Build version, case-insensitive substring
    pub version: Option<String>,
    /// Tool kind, case-insensitive exact
    pub kind: Option<String>,
    pub status: Option<GameStatus>,
    /// Keep entries whose game is archived
    pub include_archived: bool,
}

fn wanted(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl SearchFilters {
    /// Whether an entry passes every structured predicate and the archive policy
    pub fn admits<E: Entry>(&self, entry: &E) -> bool {
        let status = entry.status();
        let archived_allowed =
            self.include_archived || self.status == Some(GameStatus::Archived);
        if status.is_archived() && !archived_allowed {
            return false;
        }
        if self.status.is_some_and(|want| want != status) {
            return false;
        }
        if let Some(game) = wanted(&self.game) {
            if entry.parent_game() != game {
                return false;
            }
        }
        if let Some(tier) = wanted(&self.tier) {
            if !entry.tier().is_some_and(|t| fold(t) == fold(tier)) {
                return false;
            }
        }
        if let Some(version) = wanted(&self.version) {
            if !entry
                .version()
                .is_some_and(|v| fold(v).contains(&fold(version)))
            {
                return false;
            }
        }
        if let Some(kind) = wanted(&self.kind) {
            if !entry.kind().is_some_and(|k| fold(k) == fold(kind)) {
                return false;
            }
        }
        true
    }
}

/// Positions of the entries that pass `filters` and `query`, in index order
pub fn select<E: Entry>(items: &[E], query: &Query, filters: &SearchFilters) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, entry)| filters.admits(*entry))
        .filter(|(_, entry)| query.is_empty() || query.matches(&entry.search_blob()))
        .map(|(position, _)| position)
        .collect()
}

/// Entries that pass `filters` and `query`, in index order
pub fn filter_entries<'a, E: Entry>(
    items: &'a [E],
    query: &Query,
    filters: &SearchFilters,
) -> Vec<&'a E> {
    select(items, query, filters)
        .into_iter()
        .map(|position| &items[position])
        .collect()
}
