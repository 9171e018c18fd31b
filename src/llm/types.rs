//! LLM types — errors and the provider trait.

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by the Gemini client. They never leave the provider
/// boundary: `GeminiProvider` turns each one into a user-visible reply.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// No API key is configured.
    #[error("missing API key")]
    MissingApiKey,

    /// The HTTP request to the provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The provider returned a non-success HTTP status.
    #[error("API response error: status {status}: {body}")]
    ApiResponse { status: u16, body: String },

    /// The provider response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::MissingApiKey => "E_MISSING_API_KEY",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ApiRequest(_) | Self::ApiResponse { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// Maps a prompt to reply text. Enables mocking in tests.
///
/// Implementations never fail: every error is rendered as reply text so the
/// caller can show it as an ordinary chat message.
#[async_trait::async_trait]
pub trait ResponseProvider: Send + Sync {
    async fn respond(&self, prompt: &str) -> String;
}
