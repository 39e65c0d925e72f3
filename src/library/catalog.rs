//! In-memory catalog of books and the signed-in user.
//!
//! Every mutator rebuilds only the path from the targeted book down to the
//! targeted season/episode and swaps in a new `Arc`; untouched books,
//! seasons and episodes keep their pointers. A mutator returns the new
//! snapshot of what it changed, or `None` when an id did not resolve, in
//! which case nothing changed.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::domain::{
    Book, BookId, Comment, Episode, EpisodeId, ProfileUpdate, Reaction, Season, SeasonId, User,
    UserId,
};

use super::seed;

/// Catalog of all books plus the current user
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    /// Newest first
    books: Vec<Arc<Book>>,

    user: Option<Arc<User>>,
}

impl Catalog {
    /// Create a catalog from explicit books and an optional user
    pub fn new(books: Vec<Book>, user: Option<User>) -> Self {
        Self {
            books: books.into_iter().map(Arc::new).collect(),
            user: user.map(Arc::new),
        }
    }

    /// Catalog populated with the compiled-in seed data
    pub fn seeded() -> Self {
        Self::new(seed::initial_books(), Some(seed::default_user()))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn books(&self) -> &[Arc<Book>] {
        &self.books
    }

    pub fn user(&self) -> Option<&Arc<User>> {
        self.user.as_ref()
    }

    /// Get a book by ID
    pub fn book(&self, id: &BookId) -> Option<Arc<Book>> {
        self.books.iter().find(|b| &b.id == id).cloned()
    }

    /// Get a season of a book
    pub fn season(&self, book_id: &BookId, season_id: &SeasonId) -> Option<Arc<Season>> {
        self.books
            .iter()
            .find(|b| &b.id == book_id)?
            .season(season_id)
            .cloned()
    }

    /// Get an episode of a season of a book
    pub fn episode(
        &self,
        book_id: &BookId,
        season_id: &SeasonId,
        episode_id: &EpisodeId,
    ) -> Option<Arc<Episode>> {
        self.season(book_id, season_id)?.episode(episode_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    // ------------------------------------------------------------------
    // Content mutations
    // ------------------------------------------------------------------

    /// Add a book at the front of the catalog
    pub fn add_book(&mut self, book: Book) -> Arc<Book> {
        debug!(book = %book.id, title = %book.title, "Adding book");
        let book = Arc::new(book);
        self.books.insert(0, Arc::clone(&book));
        book
    }

    /// Append a new, empty season numbered after the last one
    pub fn add_season(&mut self, book_id: &BookId) -> Option<Arc<Book>> {
        self.update_book(book_id, |book| {
            let mut book = book.clone();
            let number = book.seasons.len() as u32 + 1;
            book.seasons
                .push(Arc::new(Season::new(SeasonId::generate(), number)));
            debug!(book = %book.id, season = number, "Added season");
            Some(book)
        })
    }

    /// Append an episode to a season and refresh the book's `updated_at`.
    ///
    /// The episode is renumbered to follow the season's current last
    /// episode, so numbering stays dense whatever the caller supplied.
    pub fn add_episode(
        &mut self,
        book_id: &BookId,
        season_id: &SeasonId,
        mut episode: Episode,
    ) -> Option<Arc<Book>> {
        self.update_book(book_id, |book| {
            let idx = book.seasons.iter().position(|s| &s.id == season_id)?;
            let mut season = Season::clone(&book.seasons[idx]);

            let number = season.next_episode_number();
            if episode.episode_number != number {
                debug!(
                    supplied = episode.episode_number,
                    assigned = number,
                    "Renumbering episode"
                );
                episode.episode_number = number;
            }
            season.episodes.push(Arc::new(episode));

            let mut book = book.clone();
            book.seasons[idx] = Arc::new(season);
            book.updated_at = Utc::now();
            Some(book)
        })
    }

    /// Count one view on an episode and on its book
    pub fn increment_views(
        &mut self,
        book_id: &BookId,
        season_id: &SeasonId,
        episode_id: &EpisodeId,
    ) -> Option<Arc<Book>> {
        self.update_book(book_id, |book| {
            let mut book = rebuild_episode(book, season_id, episode_id, |ep| ep.views += 1)?;
            book.total_views += 1;
            Some(book)
        })
    }

    /// Record a like or a dislike on an episode
    pub fn toggle_like(
        &mut self,
        book_id: &BookId,
        season_id: &SeasonId,
        episode_id: &EpisodeId,
        reaction: Reaction,
    ) -> Option<Arc<Book>> {
        self.update_book(book_id, |book| {
            rebuild_episode(book, season_id, episode_id, |ep| match reaction {
                Reaction::Like => ep.likes += 1,
                Reaction::Dislike => ep.dislikes += 1,
            })
        })
    }

    /// Prepend a comment by the current user; no-op when signed out
    pub fn add_comment(
        &mut self,
        book_id: &BookId,
        season_id: &SeasonId,
        episode_id: &EpisodeId,
        content: &str,
    ) -> Option<Arc<Book>> {
        let comment = Comment::by(self.user.as_deref()?, content);

        self.update_book(book_id, |book| {
            rebuild_episode(book, season_id, episode_id, |ep| {
                ep.comments.insert(0, comment)
            })
        })
    }

    // ------------------------------------------------------------------
    // User mutations
    // ------------------------------------------------------------------

    /// Add or remove a book from the current user's favorites
    pub fn toggle_favorite(&mut self, book_id: &BookId) -> Option<Arc<User>> {
        self.update_user(|user| {
            let mut user = user.clone();
            if !user.favorites.remove(book_id) {
                user.favorites.insert(book_id.clone());
            }
            user
        })
    }

    /// Follow or unfollow an author
    pub fn toggle_follow(&mut self, author_id: &UserId) -> Option<Arc<User>> {
        self.update_user(|user| {
            let mut user = user.clone();
            if !user.following.remove(author_id) {
                user.following.insert(author_id.clone());
            }
            user
        })
    }

    /// Merge profile fields into the current user
    pub fn update_user_profile(&mut self, update: &ProfileUpdate) -> Option<Arc<User>> {
        self.update_user(|user| user.with_profile(update))
    }

    /// Replace the current user
    pub fn login(&mut self, user: User) -> Arc<User> {
        debug!(user = %user.id, "Logging in");
        let user = Arc::new(user);
        self.user = Some(Arc::clone(&user));
        user
    }

    /// Clear the current user
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            debug!(user = %user.id, "Logged out");
        }
    }

    // ------------------------------------------------------------------
    // Snapshot plumbing
    // ------------------------------------------------------------------

    fn update_book<F>(&mut self, id: &BookId, f: F) -> Option<Arc<Book>>
    where
        F: FnOnce(&Book) -> Option<Book>,
    {
        let pos = self.books.iter().position(|b| &b.id == id)?;
        let updated = Arc::new(f(&self.books[pos])?);
        self.books[pos] = Arc::clone(&updated);
        Some(updated)
    }

    fn update_user<F>(&mut self, f: F) -> Option<Arc<User>>
    where
        F: FnOnce(&User) -> User,
    {
        let updated = Arc::new(f(self.user.as_deref()?));
        self.user = Some(Arc::clone(&updated));
        Some(updated)
    }
}

/// Copy `book` with one episode replaced by an edited copy
fn rebuild_episode<F>(
    book: &Book,
    season_id: &SeasonId,
    episode_id: &EpisodeId,
    edit: F,
) -> Option<Book>
where
    F: FnOnce(&mut Episode),
{
    let s_idx = book.seasons.iter().position(|s| &s.id == season_id)?;
    let season = &book.seasons[s_idx];
    let e_idx = season.episodes.iter().position(|e| &e.id == episode_id)?;

    let mut episode = Episode::clone(&season.episodes[e_idx]);
    edit(&mut episode);

    let mut season = Season::clone(season);
    season.episodes[e_idx] = Arc::new(episode);

    let mut book = book.clone();
    book.seasons[s_idx] = Arc::new(season);
    Some(book)
}
