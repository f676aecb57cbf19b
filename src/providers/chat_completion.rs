use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::completion::{ChatMessage, CompletionProvider, CompletionRequest};

/// Client for OpenAI-compatible `POST {base_url}/chat/completions` endpoints.
pub struct ChatCompletionProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionProvider {
    pub fn new(base_url: &str, api_key: Option<String>, model: &str) -> Self {
        ChatCompletionProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }
}

#[derive(Serialize, Debug)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for ChatCompletionProvider {
    #[instrument(name = "ChatCompletion", skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting completion from {}", url);

        let body = ChatRequestBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let client = reqwest::Client::builder()
            .user_agent("pesofolio/0.1")
            .build()?;
        let mut http_request = client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for completion URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for model: {}",
                response.status(),
                self.model
            ));
        }

        let data = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| anyhow!("Failed to parse completion response: {}", e))?;

        data.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("No content received from model: {}", self.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                ChatMessage::system("Eres un asesor"),
                ChatMessage::user("Analiza"),
            ],
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "{\"alerts\": []}"}}
            ]
        }"#;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "max_tokens": 2000,
                "messages": [
                    {"role": "system", "content": "Eres un asesor"},
                    {"role": "user", "content": "Analiza"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let provider =
            ChatCompletionProvider::new(&mock_server.uri(), Some("sk-test".to_string()), "test-model");
        let content = provider.complete(&request()).await.unwrap();
        assert_eq!(content, r#"{"alerts": []}"#);
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"choices": []}"#))
            .mount(&mock_server)
            .await;

        let provider = ChatCompletionProvider::new(&mock_server.uri(), None, "test-model");
        let result = provider.complete(&request()).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No content received from model: test-model"
        );
    }

    #[tokio::test]
    async fn test_completion_api_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let provider = ChatCompletionProvider::new(&mock_server.uri(), None, "test-model");
        let result = provider.complete(&request()).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 401 Unauthorized for model: test-model"
        );
    }
}
