use super::types::{
    fold, lenient, pick_extras, Build, Collection, Game, GameMeta, GameStatus, Guide, Index, Tool,
};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.json";
const INDEX_TMP_FILE: &str = ".index.json.tmp";
const GAME_PATH_MARKER: &str = "content/games/";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GameSource {
    #[serde(deserialize_with = "lenient::string")]
    name: String,
    status: GameStatus,
    #[serde(deserialize_with = "lenient::string")]
    cover: String,
    #[serde(deserialize_with = "lenient::string")]
    short: String,
    #[serde(deserialize_with = "lenient::string")]
    publisher: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BuildSource {
    #[serde(deserialize_with = "lenient::string")]
    title: String,
    #[serde(deserialize_with = "lenient::string")]
    tier: String,
    #[serde(deserialize_with = "lenient::string")]
    version: String,
    #[serde(deserialize_with = "lenient::string")]
    summary: String,
    #[serde(deserialize_with = "lenient::string")]
    cover: String,
    #[serde(deserialize_with = "lenient::string")]
    updated_at: String,
    #[serde(deserialize_with = "lenient::string")]
    difficulty: String,
    difficulty_stars: Option<Value>,
    cost: Option<Value>,
    #[serde(deserialize_with = "lenient::string")]
    game_name: String,
    #[serde(deserialize_with = "lenient::string")]
    game: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GuideSource {
    #[serde(deserialize_with = "lenient::string")]
    title: String,
    #[serde(deserialize_with = "lenient::string")]
    resource: String,
    #[serde(deserialize_with = "lenient::string")]
    route: String,
    #[serde(deserialize_with = "lenient::string")]
    cover: String,
    #[serde(deserialize_with = "lenient::string")]
    date: String,
    #[serde(deserialize_with = "lenient::string")]
    game_name: String,
    #[serde(deserialize_with = "lenient::string")]
    game: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ToolSource {
    #[serde(deserialize_with = "lenient::string")]
    title: String,
    #[serde(deserialize_with = "lenient::string")]
    kind: String,
    #[serde(deserialize_with = "lenient::string")]
    url: String,
    #[serde(deserialize_with = "lenient::string")]
    notes: String,
    #[serde(deserialize_with = "lenient::string")]
    cover: String,
    #[serde(deserialize_with = "lenient::string")]
    game_name: String,
    #[serde(deserialize_with = "lenient::string")]
    game: String,
}

/// `gameName` wins over the older `game` key
fn parent_ref<'a>(game_name: &'a str, game: &'a str) -> &'a str {
    if game_name.is_empty() {
        game
    } else {
        game_name
    }
}

/// Normalize a parent game reference to a slug.
///
/// Accepts a bare slug (`"last-epoch"`) or a content path
/// (`"content/games/last-epoch.json"`, any prefix, case-insensitive marker).
pub fn game_slug_from_ref(reference: &str) -> String {
    let reference = reference.trim();
    let lower = reference.to_ascii_lowercase();
    if let Some(pos) = lower.rfind(GAME_PATH_MARKER) {
        let rest = &reference[pos + GAME_PATH_MARKER.len()..];
        let rest_lower = &lower[pos + GAME_PATH_MARKER.len()..];
        if rest_lower.len() > ".json".len() && rest_lower.ends_with(".json") {
            let stem = &rest[..rest.len() - ".json".len()];
            if !stem.contains('/') {
                return stem.to_string();
            }
        }
    }
    reference.to_string()
}

/// Lookup table of game metadata, keyed by slug
#[derive(Debug, Clone, Default)]
pub struct GamesMap {
    games: HashMap<String, GameMeta>,
}

impl GamesMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, meta: GameMeta) {
        self.games.insert(meta.slug.clone(), meta);
    }

    pub fn get(&self, slug: &str) -> Option<&GameMeta> {
        self.games.get(slug)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

/// Outcome of building one collection index
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub collection: Collection,
    /// Entries written to the index
    pub items: usize,
    /// Content files that could not be read or parsed and were defaulted
    pub defaulted: usize,
    pub path: PathBuf,
}

/// Outcome of a full rebuild
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub collections: Vec<CollectionReport>,
}

impl BuildReport {
    pub fn total_items(&self) -> usize {
        self.collections.iter().map(|c| c.items).sum()
    }

    pub fn total_defaulted(&self) -> usize {
        self.collections.iter().map(|c| c.defaulted).sum()
    }
}

/// A content file as read from disk. Unreadable or malformed files carry an
/// empty object and are flagged as defaulted.
struct ContentFile {
    slug: String,
    path: PathBuf,
    value: Value,
    defaulted: bool,
}

impl ContentFile {
    /// Decode into a source schema, falling back to all-default fields
    fn decode<T: DeserializeOwned + Default>(&mut self) -> T {
        match T::deserialize(&self.value) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Content file does not match schema; using defaults"
                );
                self.defaulted = true;
                T::default()
            },
        }
    }
}

/// Regenerates the per-collection `index.json` files from content files.
///
/// Every run rewrites each index from scratch. Per-file problems never abort a
/// run; only failing to write an index does.
pub struct IndexBuilder {
    content_root: PathBuf,
}

impl IndexBuilder {
    /// Create a builder over a content root holding one directory per collection
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.content_root.join(collection.as_str())
    }

    pub fn index_file(&self, collection: Collection) -> PathBuf {
        self.collection_dir(collection).join(INDEX_FILE)
    }

    /// Rebuild every collection, loading the games map once
    pub async fn build_all(&self) -> Result<BuildReport> {
        let games = self.load_games_map().await;
        tracing::debug!(games = games.len(), "Loaded games map");

        let mut report = BuildReport::default();
        for collection in Collection::ALL {
            report
                .collections
                .push(self.build_with(collection, &games).await?);
        }
        Ok(report)
    }

    /// Rebuild a single collection
    pub async fn build_collection(&self, collection: Collection) -> Result<CollectionReport> {
        let games = if collection.has_parent() {
            self.load_games_map().await
        } else {
            GamesMap::new()
        };
        self.build_with(collection, &games).await
    }

    /// Read every game file into a slug -> metadata map
    pub async fn load_games_map(&self) -> GamesMap {
        let mut map = GamesMap::new();
        for mut file in self.read_collection(Collection::Games).await {
            let source: GameSource = file.decode();
            map.insert(GameMeta {
                slug: file.slug,
                name: source.name,
                status: source.status,
                cover: source.cover,
            });
        }
        map
    }

    async fn build_with(
        &self,
        collection: Collection,
        games: &GamesMap,
    ) -> Result<CollectionReport> {
        let files = self.read_collection(collection).await;
        let (items, defaulted) = match collection {
            Collection::Games => {
                let (mut items, defaulted) = self.collect_games(files);
                sort_games(&mut items);
                (self.write_index(collection, items).await?, defaulted)
            },
            Collection::Builds => {
                let (mut items, defaulted) = self.collect_builds(files, games).await;
                sort_builds(&mut items);
                (self.write_index(collection, items).await?, defaulted)
            },
            Collection::Guides => {
                let (mut items, defaulted) = self.collect_guides(files, games).await;
                sort_guides(&mut items);
                (self.write_index(collection, items).await?, defaulted)
            },
            Collection::Tools => {
                let (mut items, defaulted) = self.collect_tools(files, games).await;
                sort_tools(&mut items);
                (self.write_index(collection, items).await?, defaulted)
            },
        };

        let path = self.index_file(collection);
        tracing::info!(
            collection = %collection,
            items,
            defaulted,
            path = %path.display(),
            "Index written"
        );

        Ok(CollectionReport {
            collection,
            items,
            defaulted,
            path,
        })
    }

    fn collect_games(&self, files: Vec<ContentFile>) -> (Vec<Game>, usize) {
        let mut defaulted = 0;
        let mut items = Vec::with_capacity(files.len());
        for mut file in files {
            let source: GameSource = file.decode();
            defaulted += usize::from(file.defaulted);
            items.push(Game {
                slug: file.slug,
                name: source.name,
                status: source.status,
                cover: source.cover,
                short: source.short,
                publisher: source.publisher,
                extras: pick_extras(&file.value),
            });
        }
        (items, defaulted)
    }

    async fn collect_builds(
        &self,
        files: Vec<ContentFile>,
        games: &GamesMap,
    ) -> (Vec<Build>, usize) {
        let mut defaulted = 0;
        let mut items = Vec::with_capacity(files.len());
        for mut file in files {
            let source: BuildSource = file.decode();
            defaulted += usize::from(file.defaulted);
            let game = self
                .resolve_parent(games, parent_ref(&source.game_name, &source.game))
                .await;
            items.push(Build {
                slug: file.slug,
                title: source.title,
                tier: source.tier,
                version: source.version,
                summary: source.summary,
                cover: source.cover,
                updated_at: source.updated_at,
                difficulty: source.difficulty,
                difficulty_stars: source.difficulty_stars,
                cost: source.cost,
                game_name: game.slug,
                game_display_name: game.name,
                game_status: game.status,
                extras: pick_extras(&file.value),
            });
        }
        (items, defaulted)
    }

    async fn collect_guides(
        &self,
        files: Vec<ContentFile>,
        games: &GamesMap,
    ) -> (Vec<Guide>, usize) {
        let mut defaulted = 0;
        let mut items = Vec::with_capacity(files.len());
        for mut file in files {
            let source: GuideSource = file.decode();
            defaulted += usize::from(file.defaulted);
            let game = self
                .resolve_parent(games, parent_ref(&source.game_name, &source.game))
                .await;
            items.push(Guide {
                slug: file.slug,
                title: source.title,
                resource: source.resource,
                route: source.route,
                cover: source.cover,
                date: source.date,
                game_name: game.slug,
                game_display_name: game.name,
                game_status: game.status,
                extras: pick_extras(&file.value),
            });
        }
        (items, defaulted)
    }

    async fn collect_tools(
        &self,
        files: Vec<ContentFile>,
        games: &GamesMap,
    ) -> (Vec<Tool>, usize) {
        let mut defaulted = 0;
        let mut items = Vec::with_capacity(files.len());
        for mut file in files {
            let source: ToolSource = file.decode();
            defaulted += usize::from(file.defaulted);
            let game = self
                .resolve_parent(games, parent_ref(&source.game_name, &source.game))
                .await;
            items.push(Tool {
                slug: file.slug,
                title: source.title,
                kind: source.kind,
                url: source.url,
                notes: source.notes,
                cover: source.cover,
                game_name: game.slug,
                game_display_name: game.name,
                game_status: game.status,
                extras: pick_extras(&file.value),
            });
        }
        (items, defaulted)
    }

    /// Resolve a parent reference against the preloaded map, falling back to
    /// reading the game file directly
    async fn resolve_parent(&self, games: &GamesMap, reference: &str) -> GameMeta {
        let slug = game_slug_from_ref(reference);
        if let Some(meta) = games.get(&slug) {
            return meta.clone();
        }
        self.read_game_meta(&slug).await
    }

    async fn read_game_meta(&self, slug: &str) -> GameMeta {
        if slug.is_empty() || slug.contains(['/', '\\']) || slug == ".." {
            return GameMeta::missing(slug);
        }

        let path = self
            .collection_dir(Collection::Games)
            .join(format!("{}.json", slug));
        let Ok(raw) = tokio::fs::read_to_string(&path).await else {
            tracing::debug!(slug, "Referenced game not found; using defaults");
            return GameMeta::missing(slug);
        };

        match serde_json::from_str::<GameSource>(&raw) {
            Ok(source) => GameMeta {
                slug: slug.to_string(),
                name: source.name,
                status: source.status,
                cover: source.cover,
            },
            Err(_) => GameMeta::missing(slug),
        }
    }

    /// Read every content file of a collection. A missing directory is empty.
    async fn read_collection(&self, collection: Collection) -> Vec<ContentFile> {
        let dir = self.collection_dir(collection);
        let mut files = Vec::new();
        for (slug, path) in list_content_files(&dir).await {
            let (value, defaulted) = read_content(&path).await;
            files.push(ContentFile {
                slug,
                path,
                value,
                defaulted,
            });
        }
        files
    }

    /// Write `{ "items": [...] }` through a temp file and rename
    async fn write_index<T: Serialize>(
        &self,
        collection: Collection,
        items: Vec<T>,
    ) -> Result<usize> {
        let dir = self.collection_dir(collection);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let count = items.len();
        let mut body = serde_json::to_string_pretty(&Index { items })
            .with_context(|| format!("Failed to serialize {} index", collection))?;
        body.push('\n');

        let tmp = dir.join(INDEX_TMP_FILE);
        let path = dir.join(INDEX_FILE);
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(count)
    }
}

/// List `(slug, path)` for every `*.json` content file except the index,
/// sorted by file name
async fn list_content_files(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Collection directory not readable");
            return Vec::new();
        },
    };

    let mut files = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to list directory entry");
                break;
            },
        };
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if matches!(name, std::borrow::Cow::Owned(_)) {
            tracing::warn!(path = %entry.path().display(), "Content file name is not valid UTF-8; slug is lossy");
        }
        if name == INDEX_FILE {
            continue;
        }
        if let Some(slug) = name.strip_suffix(".json") {
            files.push((slug.to_string(), entry.path()));
        }
    }

    files.sort();
    files
}

async fn read_content(path: &Path) -> (Value, bool) {
    let empty = || Value::Object(Map::new());

    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read content file; using defaults");
            return (empty(), true);
        },
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(value @ Value::Object(_)) => (value, false),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Content file is not a JSON object; using defaults");
            (empty(), true)
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed JSON in content file; using defaults");
            (empty(), true)
        },
    }
}

fn sort_games(items: &mut [Game]) {
    items.sort_by_cached_key(|g| (fold(&g.name), g.slug.clone()));
}

fn sort_builds(items: &mut [Build]) {
    items.sort_by_cached_key(|b| (Reverse(b.updated_at.clone()), fold(&b.title), b.slug.clone()));
}

fn sort_guides(items: &mut [Guide]) {
    items.sort_by_cached_key(|g| (Reverse(g.date.clone()), fold(&g.title), g.slug.clone()));
}

fn sort_tools(items: &mut [Tool]) {
    items.sort_by_cached_key(|t| (fold(&t.title), t.slug.clone()));
}
