use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::core::search::{SearchProvider, SearchResult};

/// Web search over HTTP: `POST {base_url}/search` with `{query, num}`,
/// answered by a JSON array of results.
pub struct WebSearchProvider {
    base_url: String,
    api_key: Option<String>,
}

impl WebSearchProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        WebSearchProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[derive(Serialize, Debug)]
struct SearchRequest<'a> {
    query: &'a str,
    num: usize,
}

#[async_trait]
impl SearchProvider for WebSearchProvider {
    #[instrument(name = "WebSearch", skip(self), fields(query = %query))]
    async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search", self.base_url);
        debug!("Requesting search results from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("pesofolio/0.1")
            .build()?;
        let mut request = client.post(&url).json(&SearchRequest { query, num });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for search URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for search query", response.status()));
        }

        let text = response.text().await?;
        let results: Vec<SearchResult> = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse search response: {}", e))?;

        debug!(count = results.len(), "Received search results");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_successful_search() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"[
            {"name": "Dólar hoy", "snippet": "Dólar oficial: $365,50", "url": "https://example.com/a"},
            {"title": "Cotizaciones", "snippet": "Blue a $735"}
        ]"#;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("authorization", "Bearer key-123"))
            .and(body_json(serde_json::json!({"query": "dolar", "num": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let provider = WebSearchProvider::new(&mock_server.uri(), Some("key-123".to_string()));
        let results = provider.search("dolar", 5).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Dólar hoy");
        assert_eq!(results[0].url.as_deref(), Some("https://example.com/a"));
        assert_eq!(results[1].name, "Cotizaciones");
        assert!(results[1].url.is_none());
    }

    #[tokio::test]
    async fn test_search_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let provider = WebSearchProvider::new(&mock_server.uri(), None);
        let result = provider.search("dolar", 5).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 503 Service Unavailable for search query"
        );
    }

    #[tokio::test]
    async fn test_search_malformed_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"results": []}"#))
            .mount(&mock_server)
            .await;

        let provider = WebSearchProvider::new(&mock_server.uri(), None);
        let result = provider.search("dolar", 5).await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse search response")
        );
    }
}
