//! LLM — the Response Provider boundary.
//!
//! DESIGN
//! ======
//! `GeminiProvider` is the only native integration. It reads the credential
//! on every call (settings can change it at runtime) and converts every
//! failure into a fixed Portuguese reply, so callers never see an error.
//! Simulated tools never reach this module; see `simulated`.

pub mod config;
pub mod gemini;
pub mod simulated;
pub mod types;

use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::error::ErrorCode;

pub use types::ResponseProvider;
use types::LlmError;

pub const MISSING_KEY_REPLY: &str = "Erro: Chave de API não encontrada. Por favor, configure sua API KEY.";
pub const FAILURE_REPLY: &str =
    "Desculpe, encontrei um erro ao processar sua solicitação. Verifique sua chave de API ou conexão.";
pub const NO_TEXT_REPLY: &str = "Nenhum texto foi gerado.";

// =============================================================================
// CREDENTIAL
// =============================================================================

/// Shared, runtime-replaceable API credential.
#[derive(Clone, Default)]
pub struct ApiKey(Arc<RwLock<Option<String>>>);

impl ApiKey {
    #[must_use]
    pub fn new(key: Option<String>) -> Self {
        let api_key = Self::default();
        api_key.set(key);
        api_key
    }

    /// Current key, `None` when absent or blank.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, key: Option<String>) {
        let key = key.filter(|k| !k.trim().is_empty());
        *self
            .0
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = key;
    }
}

// =============================================================================
// PROVIDER
// =============================================================================

pub struct GeminiProvider {
    client: gemini::GeminiClient,
    api_key: ApiKey,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(client: gemini::GeminiClient, api_key: ApiKey) -> Self {
        Self { client, api_key }
    }
}

#[async_trait::async_trait]
impl ResponseProvider for GeminiProvider {
    async fn respond(&self, prompt: &str) -> String {
        let result = match self.api_key.get() {
            Some(key) => self.client.generate(&key, prompt).await,
            None => Err(LlmError::MissingApiKey),
        };

        match result {
            Ok(Some(text)) => {
                info!(model = self.client.model(), reply_len = text.len(), "llm: reply received");
                text
            }
            Ok(None) => NO_TEXT_REPLY.to_string(),
            Err(LlmError::MissingApiKey) => {
                warn!("llm: no API key configured");
                MISSING_KEY_REPLY.to_string()
            }
            Err(e) => {
                warn!(code = e.error_code(), retryable = e.retryable(), error = %e, "llm: request failed");
                FAILURE_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
