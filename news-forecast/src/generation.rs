use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Failure of one generation call, classified so callers can tell a transient
/// capacity problem from everything else.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("model overloaded (HTTP {status} {reason}): {message}")]
    Overloaded { status: u16, reason: String, message: String },

    #[error("request rejected (HTTP {status} {reason}): {message}")]
    Rejected { status: u16, reason: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl GenerationError {
    /// The remote service is temporarily out of capacity: HTTP 503 with
    /// status `UNAVAILABLE`.
    pub fn is_overload(&self) -> bool {
        matches!(self, GenerationError::Overloaded { .. })
    }

    /// Builds the error for a non-success response from its status code and
    /// the provider's JSON error body, if it has one.
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or_default();
        let reason = detail.status.unwrap_or_default();
        let message = detail.message.unwrap_or_else(|| body.trim().to_string());

        if status == 503 && reason == "UNAVAILABLE" {
            GenerationError::Overloaded { status, reason, message }
        } else {
            GenerationError::Rejected { status, reason, message }
        }
    }
}

/// Text generation endpoint.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    /// Name used in logs
    fn model_name(&self) -> String;

    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError>;
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Extracts the concatenated text parts of the first candidate.
pub fn response_text(body: &str) -> std::result::Result<String, GenerationError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GenerationError::MalformedResponse("response contains no text".to_string()));
    }
    Ok(text)
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: impl Into<String>) -> std::result::Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.into(),
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl GenerationApi for GeminiClient {
    fn model_name(&self) -> String {
        self.model.clone()
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("Sending {} prompt characters to {}", prompt.chars().count(), self.model);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(GenerationError::from_response(status.as_u16(), &text));
        }
        response_text(&text)
    }
}
