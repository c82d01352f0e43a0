use crate::error::SourceError;
use crate::traits::{ChangedShows, FullShow, ShowMetadataSource};
use crate::tvmaze::wire;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use series_track_models::{PosterCandidate, SearchResult};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the TVMaze-style metadata API.
///
/// Carries no retry logic of its own; callers wrap the individual calls in
/// `retry::with_retry` so the policy lives in one place.
#[derive(Clone)]
pub struct TvMazeClient {
    http: reqwest::Client,
    base_url: String,
}

impl TvMazeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("nextep/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, SourceError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound);
        }
        if !status.is_success() {
            return Err(SourceError::Status { status: status.as_u16() });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ShowMetadataSource for TvMazeClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
        debug!(query, "searching shows");
        let response = self
            .http
            .get(self.url("/search/shows"))
            .query(&[("q", query)])
            .send()
            .await?;

        let hits: Vec<wire::SearchHit> = self.decode(response).await?;
        Ok(hits.into_iter().map(|h| h.show.into_search_result()).collect())
    }

    async fn fetch_full_show(&self, show_id: &str) -> Result<FullShow, SourceError> {
        debug!(show_id, "fetching full show");
        let response = self
            .http
            .get(self.url(&format!("/shows/{show_id}")))
            .query(&[("embed", "episodes")])
            .send()
            .await?;

        let show: wire::WireShow = self.decode(response).await?;
        Ok(show.into_full_show())
    }

    async fn fetch_changed_shows(&self, since: Option<i64>) -> Result<ChangedShows, SourceError> {
        debug!(?since, "polling changed shows");
        let response = self.http.get(self.url("/updates/shows")).send().await?;

        let updates: HashMap<String, i64> = self.decode(response).await?;
        Ok(wire::changed_shows_from_updates(updates, since))
    }

    async fn fetch_poster_candidates(
        &self,
        show_id: &str,
    ) -> Result<Vec<PosterCandidate>, SourceError> {
        debug!(show_id, "fetching poster candidates");
        let response = self
            .http
            .get(self.url(&format!("/shows/{show_id}/images")))
            .send()
            .await?;

        let images: Vec<wire::WireImage> = self.decode(response).await?;
        Ok(wire::posters_from_images(images))
    }

    async fn fetch_image(&self, image_ref: &str) -> Result<Vec<u8>, SourceError> {
        debug!(image_ref, "downloading image");
        let response = self.http.get(image_ref).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound);
        }
        if !status.is_success() {
            return Err(SourceError::Status { status: status.as_u16() });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> TvMazeClient {
        TvMazeClient::new(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_converts_a_full_show() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shows/42"))
            .and(query_param("embed", "episodes"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"id": 42, "name": "Severance", "status": "Running",
                    "premiered": "2022-02-18",
                    "network": {"name": "Apple TV+", "country": {"code": "US"}},
                    "_embedded": {"episodes": [
                        {"season": 1, "number": 1, "name": "Good News About Hell", "airdate": "2022-02-18"}
                    ]}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let full = client_for(&server).await.fetch_full_show("42").await.unwrap();
        assert_eq!(full.show.name, "Severance");
        assert_eq!(full.episodes.len(), 1);
        assert_eq!(full.episodes[0].id.to_string(), "00010001");
    }

    #[tokio::test]
    async fn missing_show_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shows/999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_full_show("999").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound));
    }

    #[tokio::test]
    async fn server_error_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shows/1"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_full_show("1").await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 503 }));
        assert!(crate::retry::IsRetryable::is_retryable(&err));
    }

    #[tokio::test]
    async fn garbage_body_is_malformed_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shows/2"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html>not json</html>", "text/html"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_full_show("2").await.unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
        assert!(!crate::retry::IsRetryable::is_retryable(&err));
    }

    #[tokio::test]
    async fn search_maps_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/shows"))
            .and(query_param("q", "office"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"score": 0.9, "show": {"id": 526, "name": "The Office", "premiered": "2005-03-24", "genres": ["Comedy"]}}]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let results = client_for(&server).await.search("office").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "526");
        assert_eq!(results[0].started, Some(2005));
    }

    #[tokio::test]
    async fn image_bytes_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/poster.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegdata".to_vec()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let bytes = client
            .fetch_image(&format!("{}/img/poster.jpg", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, b"jpegdata");
    }
}
