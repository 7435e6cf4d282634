//! Ollama HTTP client for local model inference.
//!
//! Blocking client with a hard per-request deadline — a timed-out call is
//! actually cancelled, not abandoned, so a late response can never surface.

use serde::{Deserialize, Serialize};

use super::ClassifyError;

/// Generation options sent with every chat call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub num_ctx: u32,
    pub repeat_penalty: f32,
}

impl GenerationOptions {
    /// Fixed sampling parameters with the temperature clamped to [0, 1].
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: temperature.clamp(0.0, 1.0),
            top_p: 0.9,
            top_k: 40,
            num_ctx: 8192,
            repeat_penalty: 1.2,
        }
    }
}

/// LLM service abstraction (allows mocking).
pub trait LlmClient: Send + Sync {
    /// Single-turn chat call; returns the raw assistant text.
    fn chat(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ClassifyError>;

    /// Names of models the service has available.
    fn list_models(&self) -> Result<Vec<String>, ClassifyError>;
}

pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClassifyError {
        if e.is_connect() {
            ClassifyError::ServiceUnavailable(self.base_url.clone())
        } else if e.is_timeout() {
            ClassifyError::Timeout(self.timeout_secs)
        } else {
            ClassifyError::Http(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    options: &'a GenerationOptions,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

impl LlmClient for OllamaClient {
    fn chat(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ClassifyError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            options,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifyError::ServiceError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ClassifyError::Http(e.to_string()))?;
        Ok(parsed.message.content)
    }

    fn list_models(&self) -> Result<Vec<String>, ClassifyError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifyError::ServiceError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TagsResponse = response
            .json()
            .map_err(|e| ClassifyError::Http(e.to_string()))?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

/// Mock LLM client for testing — configurable response or failure.
pub struct MockLlmClient {
    response: Result<String, fn() -> ClassifyError>,
    available_models: Vec<String>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            available_models: vec!["records-classifier-phi2:latest".to_string()],
        }
    }

    /// A client whose every chat call fails with the given error.
    pub fn failing(make_error: fn() -> ClassifyError) -> Self {
        Self {
            response: Err(make_error),
            available_models: vec!["records-classifier-phi2:latest".to_string()],
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }
}

impl LlmClient for MockLlmClient {
    fn chat(
        &self,
        _model: &str,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ClassifyError> {
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(make_error) => Err(make_error()),
        }
    }

    fn list_models(&self) -> Result<Vec<String>, ClassifyError> {
        Ok(self.available_models.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("raw model text");
        let options = GenerationOptions::with_temperature(0.1);
        let result = client.chat("m", "p", &options).unwrap();
        assert_eq!(result, "raw model text");
    }

    #[test]
    fn mock_client_can_fail() {
        let client = MockLlmClient::failing(|| ClassifyError::Timeout(60));
        let options = GenerationOptions::with_temperature(0.1);
        let result = client.chat("m", "p", &options);
        assert!(matches!(result, Err(ClassifyError::Timeout(60))));
    }

    #[test]
    fn ollama_client_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", 60);
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn temperature_is_clamped() {
        assert!((GenerationOptions::with_temperature(7.0).temperature - 1.0).abs() < f32::EPSILON);
        assert!((GenerationOptions::with_temperature(-1.0).temperature - 0.0).abs() < f32::EPSILON);
        assert!((GenerationOptions::with_temperature(0.3).temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn options_serialize_with_fixed_sampling() {
        let options = GenerationOptions::with_temperature(0.1);
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"num_ctx\":8192"));
        assert!(json.contains("\"top_k\":40"));
    }

    #[test]
    fn connection_refused_maps_to_service_unavailable() {
        // Port 9 (discard) is not listening in any sane environment.
        let client = OllamaClient::new("http://127.0.0.1:9", 2);
        let result = client.list_models();
        assert!(matches!(
            result,
            Err(ClassifyError::ServiceUnavailable(_)) | Err(ClassifyError::Http(_))
        ));
    }
}
