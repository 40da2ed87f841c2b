//! Bestseller rank lookup
//!
//! Ranks come from an external HTTP service. Any failure to obtain a rank,
//! whether transport, status or payload, degrades to [`NOT_A_BESTSELLER`] so
//! loan creation never fails because the ranking service is unavailable.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    config::BestsellersConfig,
    error::{AppError, AppResult},
};

/// Rank assumed when the lookup fails, above any bestseller threshold
pub const NOT_A_BESTSELLER: i32 = 99;

/// Resolves the bestseller rank of a book (1 = most popular)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RankProvider: Send + Sync {
    async fn rank_of(&self, isbn: &str) -> i32;
}

#[derive(Debug, Error)]
enum RankLookupError {
    #[error("invalid lookup url")]
    Url,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct BestsellerEntry {
    rank: i32,
}

/// Rank provider calling `GET {base_url}/bestsellers/{isbn}`
#[derive(Clone)]
pub struct HttpRankProvider {
    client: Client,
    base_url: Url,
}

impl HttpRankProvider {
    /// Build a provider whose requests are bounded by the configured timeout
    pub fn new(config: &BestsellersConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AppError::Internal(format!("Invalid bestsellers url {}: {}", config.base_url, e))
        })?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn rank_url(&self, isbn: &str) -> Option<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push("bestsellers")
            .push(isbn);
        Some(url)
    }

    async fn fetch_rank(&self, isbn: &str) -> Result<i32, RankLookupError> {
        let url = self.rank_url(isbn).ok_or(RankLookupError::Url)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RankLookupError::Status(status));
        }

        let body = response.bytes().await?;
        let entry: BestsellerEntry = serde_json::from_slice(&body)?;
        Ok(entry.rank)
    }
}

#[async_trait]
impl RankProvider for HttpRankProvider {
    async fn rank_of(&self, isbn: &str) -> i32 {
        match self.fetch_rank(isbn).await {
            Ok(rank) => {
                tracing::debug!(isbn, rank, "Bestseller rank resolved");
                rank
            }
            Err(RankLookupError::Status(status)) => {
                tracing::debug!(isbn, %status, "Book is not ranked");
                NOT_A_BESTSELLER
            }
            Err(e) => {
                tracing::warn!(isbn, error = %e, "Bestseller lookup failed, assuming unranked");
                NOT_A_BESTSELLER
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
    use serde_json::json;
    use std::time::Duration;

    async fn bestseller(Path(isbn): Path<String>) -> axum::response::Response {
        match isbn.as_str() {
            "9780441013593" => Json(json!({ "id": "1", "title": "Dune", "rank": 3 })).into_response(),
            "978 0 06" => Json(json!({ "id": "2", "title": "Spaced", "rank": 12 })).into_response(),
            "no-rank" => Json(json!({ "id": "3", "title": "Untitled" })).into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(json!({ "id": "4", "title": "Late", "rank": 1 })).into_response()
            }
            "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn stub_service() -> String {
        let app = Router::new().route("/bestsellers/:isbn", get(bestseller));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn provider(base_url: String, timeout_ms: u64) -> HttpRankProvider {
        HttpRankProvider::new(&BestsellersConfig {
            base_url,
            timeout_ms,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_rank_from_service() {
        let ranks = provider(stub_service().await, 1_000);
        assert_eq!(ranks.rank_of("9780441013593").await, 3);
        assert_eq!(ranks.rank_of("978 0 06").await, 12);
    }

    #[tokio::test]
    async fn test_unsuccessful_status_is_unranked() {
        let ranks = provider(stub_service().await, 1_000);
        assert_eq!(ranks.rank_of("0000000000000").await, NOT_A_BESTSELLER);
        assert_eq!(ranks.rank_of("broken").await, NOT_A_BESTSELLER);
    }

    #[tokio::test]
    async fn test_missing_rank_is_unranked() {
        let ranks = provider(stub_service().await, 1_000);
        assert_eq!(ranks.rank_of("no-rank").await, NOT_A_BESTSELLER);
    }

    #[tokio::test]
    async fn test_timeout_is_unranked() {
        let ranks = provider(stub_service().await, 100);
        assert_eq!(ranks.rank_of("slow").await, NOT_A_BESTSELLER);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unranked() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let ranks = provider(format!("http://{}", addr), 1_000);
        assert_eq!(ranks.rank_of("9780441013593").await, NOT_A_BESTSELLER);
    }

    #[test]
    fn test_rank_url_keeps_base_path() {
        let ranks = provider("http://ranks.local/api/".to_string(), 1_000);
        let url = ranks.rank_url("978/1").unwrap();
        assert_eq!(url.as_str(), "http://ranks.local/api/bestsellers/978%2F1");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpRankProvider::new(&BestsellersConfig {
            base_url: "not a url".to_string(),
            timeout_ms: 1_000,
        });
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
