//! Books, seasons, episodes and comments.
//!
//! Children are held behind `Arc` so a mutation can rebuild one path from
//! book to episode while every untouched sibling stays pointer-identical.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BookId, CommentId, EpisodeId, SeasonId, UserId};
use super::user::User;

/// A serialized story owned by one author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,

    /// Owning author
    pub author_id: UserId,

    /// Author display name at creation time
    pub author_name: String,

    pub title: String,
    pub cover_url: String,
    pub description: String,
    pub genre: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Sum of every episode view ever counted
    pub total_views: u64,

    /// Seasons in `season_number` order
    pub seasons: Vec<Arc<Season>>,

    pub created_at: DateTime<Utc>,

    /// Refreshed whenever an episode is added
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Create a book with a single empty first season
    pub fn new(
        author: &User,
        title: impl Into<String>,
        description: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        let id = BookId::generate();
        let now = Utc::now();

        Self {
            cover_url: format!("https://picsum.photos/300/450?random={}", id),
            id,
            author_id: author.id.clone(),
            author_name: author.username.clone(),
            title: title.into(),
            description: description.into(),
            genre: genre.into(),
            tags: Vec::new(),
            total_views: 0,
            seasons: vec![Arc::new(Season::new(SeasonId::generate(), 1))],
            created_at: now,
            updated_at: now,
        }
    }

    /// Add multiple tags
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Look up a season by id
    pub fn season(&self, id: &SeasonId) -> Option<&Arc<Season>> {
        self.seasons.iter().find(|s| &s.id == id)
    }

    /// The season new episodes are published into
    pub fn latest_season(&self) -> Option<&Arc<Season>> {
        self.seasons.last()
    }

    /// Total number of published episodes across all seasons
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

/// A numbered run of episodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,

    /// 1-based, dense within the book
    pub season_number: u32,

    /// Episodes in `episode_number` order
    pub episodes: Vec<Arc<Episode>>,
}

impl Season {
    pub fn new(id: SeasonId, season_number: u32) -> Self {
        Self {
            id,
            season_number,
            episodes: Vec::new(),
        }
    }

    /// Look up an episode by id
    pub fn episode(&self, id: &EpisodeId) -> Option<&Arc<Episode>> {
        self.episodes.iter().find(|e| &e.id == id)
    }

    /// Number the next appended episode will carry
    pub fn next_episode_number(&self) -> u32 {
        self.episodes.len() as u32 + 1
    }

    /// Episode following `id` in this season, if any
    pub fn episode_after(&self, id: &EpisodeId) -> Option<&Arc<Episode>> {
        let idx = self.episodes.iter().position(|e| &e.id == id)?;
        self.episodes.get(idx + 1)
    }
}

/// A single published installment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,

    /// 1-based, dense within the season
    pub episode_number: u32,

    pub title: String,
    pub content: String,
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,

    /// Newest first
    #[serde(default)]
    pub comments: Vec<Comment>,

    pub published_at: DateTime<Utc>,
}

impl Episode {
    /// Create a fresh episode with zeroed counters
    pub fn new(episode_number: u32, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: EpisodeId::generate(),
            episode_number,
            title: title.into(),
            content: content.into(),
            views: 0,
            likes: 0,
            dislikes: 0,
            comments: Vec::new(),
            published_at: Utc::now(),
        }
    }
}

/// A reader comment with a snapshot of its author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub username: String,
    pub user_avatar: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    /// Create a comment authored by `user`
    pub fn by(user: &User, content: impl Into<String>) -> Self {
        Self {
            id: CommentId::generate(),
            user_id: user.id.clone(),
            username: user.username.clone(),
            user_avatar: user.avatar_url.clone(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Reader reaction to an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Like,
    Dislike,
}
