//! Core session logic.
//!
//! This module contains:
//! - Navigation: Current view, retained selections and screen resolution
//! - Safety: Moderation policy gate and comment filter
//! - Session: The controller owning catalog, navigation and moderation

pub mod navigation;
pub mod safety;
pub mod session;

// Re-export commonly used types
pub use navigation::{Navigation, NavigationError, Screen, View};
pub use safety::{CommentError, CommentFilter, ModerationGate, ModerationPolicy};
pub use session::{ActionError, EpisodeDraft, NewBook, PublishError, Session};
