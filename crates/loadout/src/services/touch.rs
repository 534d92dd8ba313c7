use super::types::Collection;
use chrono::NaiveDate;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Result of touching one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TouchOutcome {
    /// `updatedAt` was set on this file
    Updated(PathBuf),
    /// Path is not a build, guide or tool content file
    Ignored(String),
    /// Path matched but the file could not be rewritten
    Skipped { path: PathBuf, reason: String },
}

/// Stamps `updatedAt` on modified build/guide/tool content files
pub struct TouchService {
    project_root: PathBuf,
    content_dir: String,
}

impl TouchService {
    /// `content_dir` is the content root as written in changed-file lists,
    /// relative to the project root (usually `content`)
    pub fn new(project_root: &Path, content_dir: &str) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            content_dir: content_dir.trim_end_matches('/').to_string(),
        }
    }

    /// Whether a project-relative path names a touchable content file
    pub fn is_touchable(&self, path: &str) -> bool {
        let Some(rest) = path
            .strip_prefix(self.content_dir.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return false;
        };
        let Some((dir, file)) = rest.split_once('/') else {
            return false;
        };
        let dated = [Collection::Builds, Collection::Guides, Collection::Tools]
            .iter()
            .any(|c| c.as_str() == dir);
        dated
            && file.len() > ".json".len()
            && file.ends_with(".json")
            && !file.ends_with("/index.json")
            && file != "index.json"
    }

    /// Set `updatedAt` to `today` on every touchable path. Never fails as a whole.
    pub async fn touch(&self, paths: &[String], today: NaiveDate) -> Vec<TouchOutcome> {
        let stamp = today.format("%Y-%m-%d").to_string();
        let mut outcomes = Vec::with_capacity(paths.len());

        for raw in paths {
            let path = raw.trim();
            if path.is_empty() {
                continue;
            }
            if !self.is_touchable(path) {
                outcomes.push(TouchOutcome::Ignored(path.to_string()));
                continue;
            }

            let full = self.project_root.join(path);
            match stamp_file(&full, &stamp).await {
                Ok(()) => {
                    tracing::info!(path, updated_at = %stamp, "updatedAt stamped");
                    outcomes.push(TouchOutcome::Updated(full));
                },
                Err(reason) => {
                    tracing::warn!(path, reason = %reason, "Skipping content file");
                    outcomes.push(TouchOutcome::Skipped { path: full, reason });
                },
            }
        }

        outcomes
    }
}

async fn stamp_file(path: &Path, stamp: &str) -> Result<(), String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| e.to_string())?;
    let mut value: Value = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    let Value::Object(map) = &mut value else {
        return Err("content file is not a JSON object".to_string());
    };
    map.insert("updatedAt".to_string(), Value::String(stamp.to_string()));

    let body = serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?;
    tokio::fs::write(path, body)
        .await
        .map_err(|e| e.to_string())
}
