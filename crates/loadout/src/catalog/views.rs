use crate::services::Collection;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counter key of one entry: `<collection>:<slug>`
pub fn view_key(collection: Collection, slug: &str) -> String {
    format!("{}:{}", collection, slug)
}

#[derive(Serialize)]
struct IncrementRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    slug: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountValue {
    Number(u64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl CountValue {
    fn as_count(&self) -> Option<u64> {
        match self {
            CountValue::Number(n) => Some(*n),
            CountValue::Text(s) => s.trim().parse().ok(),
            CountValue::Other(_) => None,
        }
    }
}

/// Client of the external view-count service.
///
/// Counts are decoration: every failure is logged and swallowed so a dead
/// counter never blocks the catalog.
pub struct ViewCounter {
    endpoint: String,
    client: reqwest::Client,
}

impl ViewCounter {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `GET <endpoint>?keys=k1,k2`
    pub fn counts_request(&self, keys: &[String]) -> Result<reqwest::Request> {
        self.client
            .get(&self.endpoint)
            .query(&[("keys", keys.join(","))])
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .build()
            .context("Failed to build view count request")
    }

    /// `POST <endpoint>` with `{"type": <collection>, "slug": <slug>}`
    pub fn increment_request(&self, collection: Collection, slug: &str) -> Result<reqwest::Request> {
        self.client
            .post(&self.endpoint)
            .json(&IncrementRequest {
                kind: collection.as_str(),
                slug,
            })
            .build()
            .context("Failed to build view increment request")
    }

    /// Counts for the given keys. Keys the service does not report are absent.
    pub async fn counts(&self, keys: &[String]) -> HashMap<String, u64> {
        if keys.is_empty() {
            return HashMap::new();
        }
        match self.fetch_counts(keys).await {
            Ok(counts) => counts,
            Err(e) => {
                tracing::debug!(error = %e, "View counts unavailable");
                HashMap::new()
            },
        }
    }

    async fn fetch_counts(&self, keys: &[String]) -> Result<HashMap<String, u64>> {
        let request = self.counts_request(keys)?;
        let response = self
            .client
            .execute(request)
            .await
            .context("Failed to send view count request")?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("View counter error {}", response.status()));
        }

        let raw: HashMap<String, CountValue> = response
            .json()
            .await
            .context("Failed to parse view counts")?;
        Ok(parse_counts(raw))
    }

    /// Record one view. Returns whether the service accepted it.
    pub async fn increment(&self, collection: Collection, slug: &str) -> bool {
        let result = async {
            let request = self.increment_request(collection, slug)?;
            let response = self
                .client
                .execute(request)
                .await
                .context("Failed to send view increment")?;
            Ok::<bool, anyhow::Error>(response.status().is_success())
        }
        .await;

        match result {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::debug!(%collection, slug, error = %e, "View increment failed");
                false
            },
        }
    }
}

fn parse_counts(raw: HashMap<String, CountValue>) -> HashMap<String, u64> {
    raw.into_iter()
        .filter_map(|(key, value)| value.as_count().map(|count| (key, count)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_join_collection_and_slug() {
        assert_eq!(view_key(Collection::Guides, "act-1"), "guides:act-1");
    }

    #[test]
    fn counts_request_carries_comma_separated_keys() {
        let counter = ViewCounter::new("https://views.example.com/api");
        let request = counter
            .counts_request(&["builds:necro".to_string(), "builds:witch".to_string()])
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        let keys: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            keys,
            vec![("keys".to_string(), "builds:necro,builds:witch".to_string())]
        );
    }

    #[test]
    fn increment_request_posts_type_and_slug() {
        let counter = ViewCounter::new("https://views.example.com/api");
        let request = counter.increment_request(Collection::Tools, "planner").unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "https://views.example.com/api");
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(value, serde_json::json!({"type": "tools", "slug": "planner"}));
    }

    #[test]
    fn parse_counts_drops_unusable_values() {
        let raw: HashMap<String, CountValue> = serde_json::from_str(
            r#"{"builds:a": 3, "builds:b": "7", "builds:c": null, "builds:d": "many", "builds:e": {"n": 1}, "builds:f": -2}"#,
        )
        .unwrap();
        let counts = parse_counts(raw);

        assert_eq!(counts.len(), 2);
        assert_eq!(counts["builds:a"], 3);
        assert_eq!(counts["builds:b"], 7);
    }

    #[tokio::test]
    async fn no_keys_means_no_request() {
        let counter = ViewCounter::new("http://127.0.0.1:9/unreachable");
        assert!(counter.counts(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_service_is_swallowed() {
        let counter = ViewCounter::new("http://127.0.0.1:9/unreachable");
        assert!(counter.counts(&["games:poe".to_string()]).await.is_empty());
        assert!(!counter.increment(Collection::Games, "poe").await);
    }
}
