use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{QuizError, QuizResult};
use crate::models::{GenerationRequest, GenerationResponse};

/// Text generation backend used by the question generator.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Sends one non-streaming request and returns the raw model output.
    async fn generate(&self, request: &GenerationRequest) -> QuizResult<String>;
}

/// Client for an Ollama server (`POST {base_url}/api/generate`).
pub struct OllamaClient {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl OllamaClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout: None,
        }
    }

    /// Bounds each call. Without it a call waits as long as the server does.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn generate(&self, request: &GenerationRequest) -> QuizResult<String> {
        let mut builder = self.client.post(self.endpoint()).json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            QuizError::GenerationUnavailable(format!("failed to call generation endpoint: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(QuizError::GenerationUnavailable(format!(
                "generation endpoint returned error {}: {}",
                status, error_text
            )));
        }

        let body: GenerationResponse = response.json().await.map_err(|e| {
            QuizError::MalformedGenerationOutput(format!("unreadable response envelope: {}", e))
        })?;

        body.response
            .ok_or_else(|| QuizError::MalformedGenerationOutput("response field missing".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let client = OllamaClient::new(Client::new(), "http://localhost:11434/");
        assert_eq!(client.endpoint(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn request_omits_absent_schema() {
        let request = GenerationRequest {
            model: "mistral-nemo".to_string(),
            prompt: "hello".to_string(),
            stream: false,
            format: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], false);
        assert!(value.get("format").is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_generation_unavailable() {
        let client = OllamaClient::new(Client::new(), "http://127.0.0.1:9")
            .with_timeout(Duration::from_millis(200));
        let request = GenerationRequest {
            model: "m".to_string(),
            prompt: "p".to_string(),
            stream: false,
            format: None,
        };

        let err = client.generate(&request).await.unwrap_err();
        assert!(matches!(err, QuizError::GenerationUnavailable(_)));
    }
}
