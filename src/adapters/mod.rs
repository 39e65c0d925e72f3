//! Adapter interfaces for external systems.
//!
//! The only external collaborator is the content-safety check run before an
//! episode is published. Adapters report failures as errors; deciding
//! whether a failure lets content through is the job of
//! [`crate::core::ModerationGate`], not of the adapter.

pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export the Gemini adapter
pub use gemini::GeminiModerator;

/// Outcome of a safety check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the text may be published
    pub safe: bool,

    /// Explanation when unsafe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    /// A passing verdict
    pub fn safe() -> Self {
        Self {
            safe: true,
            reason: None,
        }
    }

    /// A failing verdict with an explanation
    pub fn flagged(reason: impl Into<String>) -> Self {
        Self {
            safe: false,
            reason: Some(reason.into()),
        }
    }
}

/// Why a moderator could not produce a verdict
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Moderation API key is not configured")]
    MissingCredentials,

    #[error("Moderation request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Moderation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Moderation API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed moderation verdict: {0}")]
    MalformedVerdict(#[from] serde_json::Error),
}

/// Trait for text-safety checks
#[async_trait]
pub trait ContentModerator: Send + Sync {
    /// Human-readable moderator name
    fn name(&self) -> &str;

    /// Judge whether `text` is fit for a public reading platform
    async fn check(&self, text: &str) -> Result<Verdict, ModerationError>;
}
