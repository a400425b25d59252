//! Research provider client
//!
//! Talks to the SERP/keyword research API: organic results + "people also
//! ask" + related searches for a keyword, keyword suggestions ranked by
//! composite value, and keyword difficulty. Payload parsing is split into
//! pure functions so the provider's envelope format is testable offline.
//!
//! Empty results are not an error: a keyword with no SERP coverage feeds
//! empty strategy fields downstream.

use crate::config::ResearchConfig;
use crate::db::models::DifficultyLevel;
use crate::documents::{PeopleAlsoAsk, SerpResult, SerpSnapshot};
use crate::errors::{AppError, Result};
use backoff::{future::retry, ExponentialBackoff};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// US / English defaults the provider expects on every request
const LOCATION_CODE: u32 = 2840;
const LANGUAGE_CODE: &str = "en";

/// How many top suggestions to keep after KCV ranking
const SUGGESTION_LIMIT: usize = 10;

/// A keyword suggestion ranked by composite value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSuggestion {
    pub keyword: String,
    pub difficulty: i32,
    pub difficulty_level: DifficultyLevel,
    pub search_volume: i32,
    pub cpc: f64,
    pub metadata: Value,
    pub kcv: f64,
}

/// Composite keyword value: volume-weighted CPC discounted by competition
pub fn compute_kcv(search_volume: i32, cpc: f64, competition_index: i32) -> f64 {
    (search_volume as f64 * cpc) / (competition_index as f64 + 1.0)
}

/// Research provider client
pub struct ResearchClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl ResearchClient {
    /// Create a new research client from configuration
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone().unwrap_or_default(),
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Fetch SERP data for a keyword: organic results, PAA, related searches
    pub async fn search_results(&self, keyword: &str) -> Result<SerpSnapshot> {
        let body = serde_json::json!([{
            "language_code": LANGUAGE_CODE,
            "location_code": LOCATION_CODE,
            "keyword": keyword,
        }]);

        let payload = self
            .post_with_retry("/serp/google/organic/live/regular", &body)
            .await?;

        let snapshot = parse_serp_payload(&payload);
        if snapshot.organic.is_empty() {
            warn!(keyword = %keyword, "No SERP results found");
        } else {
            info!(
                keyword = %keyword,
                organic = snapshot.organic.len(),
                paa = snapshot.people_also_ask.len(),
                related = snapshot.related_searches.len(),
                "Fetched SERP data"
            );
        }

        Ok(snapshot)
    }

    /// Get keyword suggestions for a seed keyword, ranked by KCV
    pub async fn keyword_suggestions(&self, seed_keyword: &str) -> Result<Vec<KeywordSuggestion>> {
        let body = serde_json::json!([{
            "location_code": LOCATION_CODE,
            "language_code": LANGUAGE_CODE,
            "keywords": [seed_keyword],
            "limit": 50,
        }]);

        let payload = self
            .post_with_retry("/keywords_data/google_ads/keywords_for_keywords/live", &body)
            .await?;

        let suggestions = parse_suggestions_payload(&payload);
        info!(
            seed = %seed_keyword,
            count = suggestions.len(),
            "Fetched keyword suggestions"
        );

        Ok(suggestions)
    }

    /// POST to a provider live endpoint with exponential retry
    async fn post_with_retry(&self, path: &str, body: &Value) -> Result<Value> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(
                self.timeout_secs * self.max_retries as u64,
            )),
            ..Default::default()
        };

        retry(backoff, || async {
            self.post_once(path, body).await.map_err(|e| {
                warn!(path = %path, error = %e, "Research request failed, retrying");
                backoff::Error::transient(e)
            })
        })
        .await
    }

    async fn post_once(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Basic {}", self.auth_token))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::ResearchError {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ResearchError {
                message: format!("API error {}: {}", status, text),
            });
        }

        response.json().await.map_err(|e| AppError::ResearchError {
            message: format!("Failed to parse response: {}", e),
        })
    }
}

/// Parse the provider's SERP envelope into a snapshot.
///
/// The envelope nests results under tasks[0].result[0].items; items are
/// discriminated by a "type" tag. Missing pieces parse to empty collections.
pub fn parse_serp_payload(payload: &Value) -> SerpSnapshot {
    let items = payload["tasks"][0]["result"][0]["items"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    let organic = items
        .iter()
        .filter(|item| item["type"] == "organic")
        .map(|item| SerpResult {
            title: str_field(item, "title"),
            url: str_field(item, "url"),
            snippet: str_field(item, "description"),
            rank: item["rank_absolute"]
                .as_i64()
                .or_else(|| item["rank_group"].as_i64())
                .unwrap_or(0) as i32,
        })
        .collect();

    let people_also_ask = items
        .iter()
        .filter(|item| item["type"] == "people_also_ask")
        .flat_map(|item| item["items"].as_array().cloned().unwrap_or_default())
        .map(|item| PeopleAlsoAsk {
            question: first_str(&item, &["question", "title"]),
            snippet: first_str(&item, &["description", "snippet"]),
            title: str_field(&item, "title"),
            url: first_str(&item, &["url", "link"]),
        })
        .collect();

    let related_searches = items
        .iter()
        .filter(|item| item["type"] == "related_searches")
        .flat_map(|item| item["items"].as_array().cloned().unwrap_or_default())
        .filter_map(|item| match &item {
            Value::String(s) => Some(s.clone()),
            _ => {
                let text = first_str(&item, &["text", "query"]);
                (!text.is_empty()).then_some(text)
            }
        })
        .collect();

    SerpSnapshot {
        organic,
        people_also_ask,
        related_searches,
    }
}

/// Parse the provider's keyword-suggestion envelope, compute KCV per item,
/// and keep the top suggestions by KCV descending.
pub fn parse_suggestions_payload(payload: &Value) -> Vec<KeywordSuggestion> {
    let items = payload["tasks"][0]["result"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    let mut suggestions: Vec<KeywordSuggestion> = items
        .iter()
        .filter(|item| {
            item["keyword"]
                .as_str()
                .is_some_and(|k| !k.trim().is_empty())
        })
        .map(|item| {
            let keyword = str_field(item, "keyword");
            let competition_index = item["competition_index"].as_i64().unwrap_or(0) as i32;
            let search_volume = item["search_volume"].as_i64().unwrap_or(0) as i32;
            let cpc = item["cpc"].as_f64().unwrap_or(0.0);
            let kcv = compute_kcv(search_volume, cpc, competition_index);

            // The provider reports competition as a tier string; reuse it as
            // the difficulty tier, deriving one from the index when absent.
            let difficulty_level = item["competition"]
                .as_str()
                .map(|s| DifficultyLevel::from(s.to_string()))
                .unwrap_or_else(|| DifficultyLevel::from_score(competition_index));

            KeywordSuggestion {
                keyword,
                difficulty: competition_index,
                difficulty_level,
                search_volume,
                cpc,
                metadata: item.clone(),
                kcv,
            }
        })
        .collect();

    suggestions.sort_by(|a, b| b.kcv.partial_cmp(&a.kcv).unwrap_or(std::cmp::Ordering::Equal));
    suggestions.truncate(SUGGESTION_LIMIT);
    suggestions
}

fn str_field(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or_default().to_string()
}

fn first_str(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| value[*k].as_str())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serp_payload() -> Value {
        serde_json::json!({
            "tasks": [{
                "result": [{
                    "items": [
                        {
                            "type": "organic",
                            "title": "Best Hiking Boots of 2026",
                            "url": "https://example.com/boots",
                            "description": "We tested 24 pairs",
                            "rank_absolute": 1
                        },
                        {
                            "type": "organic",
                            "title": "Hiking Boot Buying Guide",
                            "url": "https://example.org/guide",
                            "description": "How to choose",
                            "rank_group": 2
                        },
                        {
                            "type": "people_also_ask",
                            "items": [
                                { "question": "Are hiking boots worth it?", "description": "Yes" },
                                { "title": "How long do hiking boots last?" }
                            ]
                        },
                        {
                            "type": "related_searches",
                            "items": ["hiking boots for women", { "text": "lightweight hiking boots" }]
                        }
                    ]
                }]
            }]
        })
    }

    #[test]
    fn test_parse_serp_payload() {
        let snapshot = parse_serp_payload(&serp_payload());

        assert_eq!(snapshot.organic.len(), 2);
        assert_eq!(snapshot.organic[0].rank, 1);
        assert_eq!(snapshot.organic[1].rank, 2);
        assert_eq!(snapshot.organic[0].url, "https://example.com/boots");

        assert_eq!(snapshot.people_also_ask.len(), 2);
        assert_eq!(snapshot.people_also_ask[0].question, "Are hiking boots worth it?");
        // Question falls back to the title when absent
        assert_eq!(snapshot.people_also_ask[1].question, "How long do hiking boots last?");

        assert_eq!(
            snapshot.related_searches,
            vec!["hiking boots for women", "lightweight hiking boots"]
        );
    }

    #[test]
    fn test_parse_serp_payload_empty() {
        let snapshot = parse_serp_payload(&serde_json::json!({ "tasks": [] }));
        assert!(snapshot.organic.is_empty());
        assert!(snapshot.people_also_ask.is_empty());
        assert!(snapshot.related_searches.is_empty());
    }

    #[test]
    fn test_compute_kcv() {
        assert_eq!(compute_kcv(1000, 2.0, 0), 2000.0);
        assert_eq!(compute_kcv(1000, 2.0, 99), 20.0);
        assert_eq!(compute_kcv(0, 5.0, 10), 0.0);
    }

    #[test]
    fn test_parse_suggestions_ranked_by_kcv() {
        let payload = serde_json::json!({
            "tasks": [{
                "result": [
                    {
                        "keyword": "cheap hiking boots",
                        "competition_index": 9,
                        "competition": "LOW",
                        "search_volume": 100,
                        "cpc": 1.0
                    },
                    {
                        "keyword": "best hiking boots",
                        "competition_index": 1,
                        "competition": "HIGH",
                        "search_volume": 1000,
                        "cpc": 3.0
                    },
                    { "keyword": "   " },
                    { "search_volume": 50 }
                ]
            }]
        });

        let suggestions = parse_suggestions_payload(&payload);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].keyword, "best hiking boots");
        assert_eq!(suggestions[0].kcv, 1500.0);
        assert_eq!(suggestions[0].difficulty_level, DifficultyLevel::High);
        assert_eq!(suggestions[1].keyword, "cheap hiking boots");
        assert_eq!(suggestions[1].kcv, 10.0);
    }

    #[test]
    fn test_suggestion_tier_derived_from_index_when_absent() {
        let payload = serde_json::json!({
            "tasks": [{
                "result": [{
                    "keyword": "hiking boot care",
                    "competition_index": 70,
                    "search_volume": 10,
                    "cpc": 0.5
                }]
            }]
        });

        let suggestions = parse_suggestions_payload(&payload);
        assert_eq!(suggestions[0].difficulty_level, DifficultyLevel::High);
        assert_eq!(suggestions[0].difficulty, 70);
    }
}
