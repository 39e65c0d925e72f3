//! Gemini adapter for content moderation.
//!
//! Sends the episode text to the `generateContent` REST endpoint in JSON
//! response mode and reads back a `{ "safe": bool, "reason"?: string }`
//! verdict.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::timeout;

use super::{ContentModerator, ModerationError, Verdict};
use crate::config::ModerationSettings;

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Characters of episode text included in the prompt
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 1000;

/// Response from generateContent
#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it produced any
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Error envelope returned on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Moderator backed by the Gemini API
pub struct GeminiModerator {
    /// API key; `None` makes every check fail with `MissingCredentials`
    api_key: Option<String>,
    model: String,
    endpoint: String,
    request_timeout: Duration,
    max_prompt_chars: usize,
    client: reqwest::Client,
}

impl GeminiModerator {
    /// Create a moderator with default model and endpoint
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(30),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            client: reqwest::Client::new(),
        }
    }

    /// Create from resolved settings
    pub fn from_settings(settings: &ModerationSettings) -> Self {
        Self::new(settings.api_key.clone())
            .with_model(settings.model.clone())
            .with_endpoint(settings.endpoint.clone())
            .with_timeout(Duration::from_secs(settings.timeout_seconds))
            .with_max_prompt_chars(settings.max_prompt_chars)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    /// Build API URL
    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate(
        &self,
        api_key: &str,
        prompt: String,
    ) -> Result<GenerateContentResponse, ModerationError> {
        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", api_key)
            .json(&serde_json::json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
                "generationConfig": { "responseMimeType": "application/json" },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|body| body.error.message)
                .unwrap_or(raw);
            return Err(ModerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ContentModerator for GeminiModerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn check(&self, text: &str) -> Result<Verdict, ModerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ModerationError::MissingCredentials)?;

        let prompt = build_prompt(text, self.max_prompt_chars);
        let response = timeout(self.request_timeout, self.generate(api_key, prompt))
            .await
            .map_err(|_| ModerationError::Timeout {
                seconds: self.request_timeout.as_secs(),
            })??;

        match response.text() {
            Some(reply) => parse_verdict(&reply),
            None => Ok(Verdict::flagged("Analysis failed")),
        }
    }
}

/// Wrap episode text in the moderation instructions, keeping at most
/// `max_chars` characters of it
pub fn build_prompt(text: &str, max_chars: usize) -> String {
    let excerpt: String = text.chars().take(max_chars).collect();

    format!(
        r#"
Analyze the following text for a public e-book platform.
Strictly check for:
1. 18+ / Sexual content (NSFW)
2. Offensive Slang / Hate Speech
3. Excessive Violence / Harmful content

Respond ONLY with a JSON object: {{ "safe": boolean, "reason": "string (optional explanation if unsafe)" }}

Text to analyze:
"{}..."
"#,
        excerpt
    )
}

/// Parse the model's JSON reply, tolerating a fenced code block
pub fn parse_verdict(reply: &str) -> Result<Verdict, ModerationError> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    Ok(serde_json::from_str(body.trim())?)
}
