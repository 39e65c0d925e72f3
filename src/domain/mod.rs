//! Domain types for StoryStream.
//!
//! This module contains the core data structures:
//! - Ids: String identifiers for every entity
//! - Book: Books, seasons, episodes and comments
//! - User: The signed-in account and profile edits

pub mod book;
pub mod ids;
pub mod user;

// Re-export commonly used types
pub use book::{Book, Comment, Episode, Reaction, Season};
pub use ids::{BookId, CommentId, EpisodeId, SeasonId, UserId};
pub use user::{ProfileUpdate, User, UserRole};
