//! Content safety for publishing and commenting.
//!
//! Two gates live here:
//! - `ModerationGate`: runs the injected moderator and applies the
//!   configured policy when it cannot produce a verdict
//! - `CommentFilter`: glob denylist screening reader comments

use std::sync::Arc;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::adapters::{ContentModerator, Verdict};
use crate::config::default_blocked_patterns;

/// What to do when the moderator cannot be reached or misbehaves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationPolicy {
    /// Let the content through and log a warning
    #[default]
    FailOpen,

    /// Reject the content, naming the failure as the reason
    FailClosed,
}

impl std::fmt::Display for ModerationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationPolicy::FailOpen => write!(f, "fail_open"),
            ModerationPolicy::FailClosed => write!(f, "fail_closed"),
        }
    }
}

impl std::str::FromStr for ModerationPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(ModerationPolicy::FailOpen),
            "fail_closed" | "closed" => Ok(ModerationPolicy::FailClosed),
            _ => anyhow::bail!("Unknown moderation policy: {}", s),
        }
    }
}

/// Moderator plus the policy applied to its failures
#[derive(Clone)]
pub struct ModerationGate {
    moderator: Arc<dyn ContentModerator>,
    policy: ModerationPolicy,
}

impl ModerationGate {
    pub fn new(moderator: Arc<dyn ContentModerator>, policy: ModerationPolicy) -> Self {
        Self { moderator, policy }
    }

    pub fn policy(&self) -> ModerationPolicy {
        self.policy
    }

    pub fn moderator_name(&self) -> &str {
        self.moderator.name()
    }

    /// Always yields a verdict; moderator errors are resolved by the policy
    pub async fn screen(&self, text: &str) -> Verdict {
        match self.moderator.check(text).await {
            Ok(verdict) => verdict,
            Err(e) => match self.policy {
                ModerationPolicy::FailOpen => {
                    warn!(
                        moderator = self.moderator.name(),
                        error = %e,
                        "Moderation unavailable, allowing content"
                    );
                    Verdict::safe()
                }
                ModerationPolicy::FailClosed => {
                    warn!(
                        moderator = self.moderator.name(),
                        error = %e,
                        "Moderation unavailable, rejecting content"
                    );
                    Verdict::flagged(format!("Moderation unavailable: {}", e))
                }
            },
        }
    }
}

impl std::fmt::Debug for ModerationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationGate")
            .field("moderator", &self.moderator.name())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Comment rejected by the filter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommentError {
    #[error("Please keep comments respectful.")]
    Disrespectful,
}

/// Case-insensitive glob denylist for comments
#[derive(Debug, Clone)]
pub struct CommentFilter {
    patterns: Vec<Pattern>,
}

impl Default for CommentFilter {
    fn default() -> Self {
        Self::new(&default_blocked_patterns())
    }
}

impl CommentFilter {
    /// Compile patterns, skipping (and logging) any that are invalid
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(pattern = %p, error = %e, "Ignoring invalid comment pattern");
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    /// Check a comment against the denylist
    pub fn is_blocked(&self, text: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };

        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(text, options))
    }

    /// Validate a comment
    pub fn validate(&self, text: &str) -> Result<(), CommentError> {
        if self.is_blocked(text) {
            return Err(CommentError::Disrespectful);
        }
        Ok(())
    }
}
