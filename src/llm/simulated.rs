//! Simulated replies for tools without a native integration.

use std::time::Duration;

use rand::Rng;

pub const DEFAULT_SIMULATED_DELAY_MIN_MS: u64 = 1000;
pub const DEFAULT_SIMULATED_DELAY_MAX_MS: u64 = 3000;
pub const DEFAULT_DIRECT_REPLY_DELAY_MS: u64 = 1000;

/// Waits a random delay in `[min_ms, max_ms]`, then returns a canned reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedResponder {
    min_ms: u64,
    max_ms: u64,
}

impl Default for SimulatedResponder {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_DELAY_MIN_MS, DEFAULT_SIMULATED_DELAY_MAX_MS)
    }
}

impl SimulatedResponder {
    /// Bounds are swapped if given in the wrong order.
    #[must_use]
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms: min_ms.min(max_ms), max_ms: max_ms.max(min_ms) }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }

    pub async fn reply(&self, tool_label: &str) -> String {
        tokio::time::sleep(self.delay()).await;
        canned_reply(tool_label)
    }
}

#[must_use]
pub fn canned_reply(tool_label: &str) -> String {
    format!("[{tool_label}] Resposta simulada...")
}

/// Reply to a message sent straight to one widget.
#[must_use]
pub fn direct_reply(tool_label: &str) -> String {
    format!("[Simulação] Resposta de {tool_label}...")
}
