//! Test utilities for the loadout crate
//!
//! In-memory catalog source and content-tree helpers shared by unit and
//! integration tests.

use crate::catalog::{FetchError, IndexSource};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Index source serving canned payloads. Unknown paths are `NotFound`.
///
/// Thread-safe via Mutex, records every fetched path.
#[derive(Default)]
pub struct MemorySource {
    payloads: HashMap<String, Result<Vec<u8>, FetchError>>,
    fetched: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, path: &str, value: Value) -> Self {
        self.payloads
            .insert(path.to_string(), Ok(value.to_string().into_bytes()));
        self
    }

    pub fn with_failure(mut self, path: &str, error: FetchError) -> Self {
        self.payloads.insert(path.to_string(), Err(error));
        self
    }

    /// Paths requested so far, in request order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IndexSource for MemorySource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        self.fetched.lock().unwrap().push(path.to_string());
        self.payloads
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NotFound(path.to_string())))
    }
}

/// Write a content file below `content_root`, creating its directory
pub fn write_content(content_root: &Path, collection: &str, slug: &str, value: &Value) {
    let dir = content_root.join(collection);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(format!("{}.json", slug)),
        serde_json::to_string_pretty(value).unwrap(),
    )
    .unwrap();
}

/// Read a generated `<collection>/index.json` back as JSON
pub fn read_index(content_root: &Path, collection: &str) -> Value {
    let raw = std::fs::read_to_string(content_root.join(collection).join("index.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

/// Slugs of a generated index, in order
pub fn index_slugs(content_root: &Path, collection: &str) -> Vec<String> {
    read_index(content_root, collection)["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["slug"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn memory_source_serves_and_records() {
        let source = MemorySource::new()
            .with_json("games/index.json", json!({"items": []}))
            .with_failure("tools/index.json", FetchError::Transient("down".to_string()));

        assert_eq!(
            source.fetch("games/index.json").await.unwrap(),
            br#"{"items":[]}"#.to_vec()
        );
        assert!(matches!(
            source.fetch("tools/index.json").await,
            Err(FetchError::Transient(_))
        ));
        assert!(source.fetch("guides/index.json").await.unwrap_err().is_not_found());
        assert_eq!(
            source.fetched(),
            vec!["games/index.json", "tools/index.json", "guides/index.json"]
        );
    }

    #[test]
    fn content_helpers_round_trip_through_disk() {
        let temp_dir = TempDir::new().unwrap();
        write_content(temp_dir.path(), "builds", "necro", &json!({"title": "Necro"}));
        std::fs::write(
            temp_dir.path().join("builds/index.json"),
            r#"{"items":[{"slug":"necro"}]}"#,
        )
        .unwrap();

        assert_eq!(index_slugs(temp_dir.path(), "builds"), vec!["necro"]);
    }
}
