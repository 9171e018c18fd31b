//! Gemini `generateContent` client.
//!
//! Thin HTTP wrapper for `POST {base}/models/{model}:generateContent`.
//! Pure parsing in `parse_response` for testability.

use std::time::Duration;

use super::config::LlmConfig;
use super::types::LlmError;

// =============================================================================
// CLIENT
// =============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if the HTTP client cannot be constructed.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), model: config.model.clone() })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send one single-turn prompt. `Ok(None)` means the model produced no text.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails, the status is not 200,
    /// or the body is malformed.
    pub async fn generate(&self, api_key: &str, prompt: &str) -> Result<Option<String>, LlmError> {
        let body = ApiRequest { contents: [ApiContent { role: "user", parts: [ApiPart { text: prompt }] }] };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        if status != 200 {
            return Err(LlmError::ApiResponse { status, body: text });
        }

        parse_response(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    contents: [ApiContent<'a>; 1],
}

#[derive(serde::Serialize)]
struct ApiContent<'a> {
    role: &'a str,
    parts: [ApiPart<'a>; 1],
}

#[derive(serde::Serialize)]
struct ApiPart<'a> {
    text: &'a str,
}

#[derive(serde::Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(serde::Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(serde::Deserialize)]
struct CandidatePart {
    text: Option<String>,
    /// Set on reasoning summaries; those are not part of the answer.
    #[serde(default)]
    thought: bool,
}

// =============================================================================
// PARSING
// =============================================================================

/// Join the text parts of the first candidate. Empty text yields `None`.
fn parse_response(json: &str) -> Result<Option<String>, LlmError> {
    let api: ApiResponse = serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))?;

    let text: String = api
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok((!text.trim().is_empty()).then_some(text))
}

#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;
