use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Free-form fields copied verbatim from content files into index records.
pub const EXTRA_KEYS: &[&str] = &[
    "items", "itemList", "tags", "urls", "links", "body", "bodyHtml", "bodyText",
];

/// Passthrough fields carried by an index record, in allow-list order.
pub type Extras = Map<String, Value>;

/// Content collection enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Games,
    Builds,
    Guides,
    Tools,
}

impl Collection {
    /// Every collection, in build order. Games come first so the others can
    /// be enriched from them.
    pub const ALL: [Collection; 4] = [
        Collection::Games,
        Collection::Builds,
        Collection::Guides,
        Collection::Tools,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Games => "games",
            Collection::Builds => "builds",
            Collection::Guides => "guides",
            Collection::Tools => "tools",
        }
    }

    /// Path of the generated index, relative to the content root
    pub fn index_path(&self) -> String {
        format!("{}/index.json", self.as_str())
    }

    /// Path of a single entity's content file, relative to the content root
    pub fn detail_path(&self, slug: &str) -> String {
        format!("{}/{}.json", self.as_str(), slug)
    }

    /// Whether entries of this collection reference a parent game
    pub fn has_parent(&self) -> bool {
        !matches!(self, Collection::Games)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "games" => Ok(Collection::Games),
            "builds" => Ok(Collection::Builds),
            "guides" => Ok(Collection::Guides),
            "tools" => Ok(Collection::Tools),
            _ => Err(anyhow::anyhow!(
                "Invalid collection: {} (expected games, builds, guides or tools)",
                s
            )),
        }
    }
}

/// Publication status of a game. Entries inherit it from their parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Active,
    Archived,
}

impl GameStatus {
    /// Lenient parse used for content files: unknown or empty labels are active.
    pub fn from_label(label: &str) -> Self {
        match fold(label).trim() {
            "archived" | "archive" | "archivee" => GameStatus::Archived,
            _ => GameStatus::Active,
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(self, GameStatus::Archived)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameStatus::Active => "active",
            GameStatus::Archived => "archived",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for GameStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).trim() {
            "active" | "actif" => Ok(GameStatus::Active),
            "archived" | "archive" | "archivee" => Ok(GameStatus::Archived),
            _ => Err(anyhow::anyhow!("Invalid game status: {}", s)),
        }
    }
}

impl<'de> Deserialize<'de> for GameStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(label)) => GameStatus::from_label(&label),
            _ => GameStatus::Active,
        })
    }
}

/// Fold text for comparison and search: lowercase, decompose, drop combining
/// marks. Characters without a decomposition are kept as they are.
///
/// `"Élan Vital"` and `"elan vital"` fold to the same string.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Copy the allow-listed passthrough fields out of a raw content record.
/// Absent and null values are skipped.
pub fn pick_extras(source: &Value) -> Extras {
    let mut extras = Extras::new();
    if let Value::Object(map) = source {
        for key in EXTRA_KEYS {
            match map.get(*key) {
                Some(Value::Null) | None => {},
                Some(value) => {
                    extras.insert((*key).to_string(), value.clone());
                },
            }
        }
    }
    extras
}

/// Wrapper every index file is stored in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Game index record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Game {
    pub slug: String,
    pub name: String,
    pub status: GameStatus,
    pub cover: String,
    pub short: String,
    pub publisher: String,
    #[serde(flatten)]
    pub extras: Extras,
}

/// Build index record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Build {
    pub slug: String,
    pub title: String,
    pub tier: String,
    pub version: String,
    pub summary: String,
    pub cover: String,
    pub updated_at: String,
    pub difficulty: String,
    pub difficulty_stars: Option<Value>,
    pub cost: Option<Value>,
    pub game_name: String,
    pub game_display_name: String,
    pub game_status: GameStatus,
    #[serde(flatten)]
    pub extras: Extras,
}

/// Guide index record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Guide {
    pub slug: String,
    pub title: String,
    pub resource: String,
    pub route: String,
    pub cover: String,
    pub date: String,
    pub game_name: String,
    pub game_display_name: String,
    pub game_status: GameStatus,
    #[serde(flatten)]
    pub extras: Extras,
}

/// Tool index record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tool {
    pub slug: String,
    pub title: String,
    pub kind: String,
    pub url: String,
    pub notes: String,
    pub cover: String,
    pub game_name: String,
    pub game_display_name: String,
    pub game_status: GameStatus,
    #[serde(flatten)]
    pub extras: Extras,
}

/// Parent game metadata copied into builds, guides and tools
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameMeta {
    pub slug: String,
    pub name: String,
    pub status: GameStatus,
    pub cover: String,
}

impl GameMeta {
    /// Metadata for a reference whose game file does not exist
    pub fn missing(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            ..Default::default()
        }
    }
}

/// Content location settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Content root, relative to the project root unless absolute
    pub root: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: "content".to_string(),
        }
    }
}

/// Catalog client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Site URL the indexes are served from. Unset means read from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Cards per page for fixed-page navigation
    pub page_size: usize,
    /// Cards per batch for incremental rendering
    pub batch_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            page_size: crate::catalog::DEFAULT_PAGE_SIZE,
            batch_size: crate::catalog::DEFAULT_BATCH_SIZE,
        }
    }
}

/// View-count service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Site configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub views: ViewsConfig,
}

/// Lenient field decoders for hand-authored content files.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings pass through, scalars are stringified, anything else is empty.
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(true)) => "true".to_string(),
            _ => String::new(),
        })
    }
}
