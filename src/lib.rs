//! storystream - Serial-fiction reading and publishing core
//!
//! Readers browse books organized into seasons and episodes, authors
//! publish new episodes, and an AI moderation hook screens every episode
//! before it reaches the catalog.
//!
//! # Architecture
//!
//! The system is built around one in-memory session:
//! - The catalog holds immutable `Arc` snapshots; each mutation swaps in a
//!   new snapshot of the affected book and shares everything else
//! - Navigation keeps the current view and selected ids and resolves them
//!   against the catalog on demand
//! - Moderation is an injected adapter behind an explicit fail-open or
//!   fail-closed policy
//!
//! # Modules
//!
//! - `adapters`: External system integrations (Gemini moderation)
//! - `core`: Session controller, navigation, safety gates
//! - `domain`: Data structures (Book, Season, Episode, User)
//! - `library`: Catalog store, seed data, discovery shelves
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Browse the home shelves
//! storystream home
//!
//! # Read the first episode of a book
//! storystream read b1
//!
//! # Moderate and publish an episode
//! echo "It begins..." | storystream publish b1 --title "Chapter 3"
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod library;

// Re-export main types at crate root for convenience
pub use crate::adapters::{ContentModerator, GeminiModerator, ModerationError, Verdict};
pub use crate::core::{ModerationGate, ModerationPolicy, Navigation, Screen, Session, View};
pub use crate::domain::{Book, BookId, Episode, EpisodeId, Season, SeasonId, User, UserId, UserRole};
pub use crate::library::Catalog;
