//! A reading/publishing session.
//!
//! `Session` is the single owner of the catalog, the navigation state and
//! the moderation gate. Screen-level actions (publishing, reading,
//! commenting, signing in) go through it so that each one is a short
//! sequence of store mutations and navigation changes.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::adapters::GeminiModerator;
use crate::config::ResolvedConfig;
use crate::domain::{
    Book, BookId, Comment, Episode, EpisodeId, ProfileUpdate, Reaction, SeasonId, User, UserId,
    UserRole,
};
use crate::library::{seed, Catalog};

use super::navigation::{Navigation, NavigationError, Screen, View};
use super::safety::{CommentError, CommentFilter, ModerationGate};

/// Reason shown when a moderator flags content without explaining why
const DEFAULT_REJECTION: &str = "Unsafe content";

/// Why an episode was not published
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("Book {0} has no season to publish into")]
    NoSeason(BookId),

    #[error("Content Violation Detected: {reason}. Please revise.")]
    Rejected { reason: String },
}

/// Errors from session actions
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Sign in to continue")]
    NotSignedIn,

    #[error("Only authors can do that")]
    NotAuthor,

    #[error("Book {0} belongs to another author")]
    NotOwner(BookId),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Unknown genre: {0}")]
    UnknownGenre(String),

    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Comment(#[from] CommentError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Fields for a new book
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub title: String,
    pub description: String,

    /// One of [`crate::library::GENRES`]; blank picks the first
    pub genre: String,

    pub tags: Vec<String>,
}

/// Fields for a new episode
#[derive(Debug, Clone, Default)]
pub struct EpisodeDraft {
    pub title: String,
    pub content: String,
}

impl EpisodeDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Text handed to the moderator
    pub fn moderation_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }
}

/// Session controller
#[derive(Debug)]
pub struct Session {
    catalog: Catalog,
    navigation: Navigation,
    gate: ModerationGate,
    comment_filter: CommentFilter,
}

impl Session {
    pub fn new(catalog: Catalog, gate: ModerationGate) -> Self {
        Self {
            catalog,
            navigation: Navigation::new(),
            gate,
            comment_filter: CommentFilter::default(),
        }
    }

    /// Session over the seed data, signed in as the default user
    pub fn seeded(gate: ModerationGate) -> Self {
        Self::new(Catalog::seeded(), gate)
    }

    /// Seeded session wired to the configured Gemini moderator
    pub fn from_config(config: &ResolvedConfig) -> Self {
        let moderator = GeminiModerator::from_settings(&config.moderation);
        let gate = ModerationGate::new(Arc::new(moderator), config.moderation.policy);

        Self::seeded(gate)
            .with_comment_filter(CommentFilter::new(&config.blocked_comment_patterns))
    }

    pub fn with_comment_filter(mut self, filter: CommentFilter) -> Self {
        self.comment_filter = filter;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn gate(&self) -> &ModerationGate {
        &self.gate
    }

    pub fn user(&self) -> Option<&Arc<User>> {
        self.catalog.user()
    }

    /// Resolve the current screen
    pub fn screen(&self) -> Screen {
        self.navigation.screen(&self.catalog)
    }

    pub fn navigate(
        &mut self,
        view: View,
        book_id: Option<BookId>,
        season_id: Option<SeasonId>,
        episode_id: Option<EpisodeId>,
    ) {
        self.navigation.navigate(view, book_id, season_id, episode_id);
    }

    fn require_user(&self) -> Result<Arc<User>, ActionError> {
        self.catalog.user().cloned().ok_or(ActionError::NotSignedIn)
    }

    fn require_author(&self) -> Result<Arc<User>, ActionError> {
        let user = self.require_user()?;
        if !user.is_author() {
            return Err(ActionError::NotAuthor);
        }
        Ok(user)
    }

    /// The book, provided the signed-in author wrote it
    fn require_own_book(&self, book_id: &BookId) -> Result<Arc<Book>, ActionError> {
        let author = self.require_author()?;
        let book = self
            .catalog
            .book(book_id)
            .ok_or_else(|| ActionError::BookNotFound(book_id.clone()))?;

        if book.author_id != author.id {
            return Err(ActionError::NotOwner(book_id.clone()));
        }
        Ok(book)
    }

    // ------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------

    /// Sign in as a fresh account and go home
    pub fn sign_in(&mut self, username: &str, role: UserRole) -> Arc<User> {
        let username = match username.trim() {
            "" => "NewUser",
            name => name,
        };

        let user = self.catalog.login(User::new(username, role));
        info!(user = %user.id, %role, "Signed in");
        self.navigation.go(View::Home);
        user
    }

    /// Sign out and show the auth screen
    pub fn sign_out(&mut self) {
        self.catalog.logout();
        self.navigation.go(View::Auth);
        info!("Signed out");
    }

    pub fn save_profile(&mut self, update: &ProfileUpdate) -> Result<Arc<User>, ActionError> {
        self.catalog
            .update_user_profile(update)
            .ok_or(ActionError::NotSignedIn)
    }

    /// Returns whether the book is now a favorite
    pub fn toggle_favorite(&mut self, book_id: &BookId) -> Result<bool, ActionError> {
        let user = self
            .catalog
            .toggle_favorite(book_id)
            .ok_or(ActionError::NotSignedIn)?;
        Ok(user.favorites.contains(book_id))
    }

    /// Returns whether the author is now followed
    pub fn toggle_follow(&mut self, author_id: &UserId) -> Result<bool, ActionError> {
        let user = self
            .catalog
            .toggle_follow(author_id)
            .ok_or(ActionError::NotSignedIn)?;
        Ok(user.following.contains(author_id))
    }

    // ------------------------------------------------------------------
    // Authoring
    // ------------------------------------------------------------------

    /// Create a book owned by the current author
    pub fn create_book(&mut self, new_book: NewBook) -> Result<Arc<Book>, ActionError> {
        let author = self.require_author()?;

        if new_book.title.trim().is_empty() {
            return Err(ActionError::MissingField("title"));
        }
        if new_book.description.trim().is_empty() {
            return Err(ActionError::MissingField("description"));
        }

        let genre = match new_book.genre.trim() {
            "" => seed::GENRES[0].to_string(),
            g if seed::is_known_genre(g) => g.to_string(),
            g => return Err(ActionError::UnknownGenre(g.to_string())),
        };

        let book = Book::new(&author, new_book.title, new_book.description, genre)
            .with_tags(new_book.tags);
        let book = self.catalog.add_book(book);
        info!(book = %book.id, title = %book.title, "Created book");
        Ok(book)
    }

    /// Open a new, empty season on one of the author's books
    pub fn start_new_season(&mut self, book_id: &BookId) -> Result<Arc<Book>, ActionError> {
        self.require_own_book(book_id)?;
        let book = self
            .catalog
            .add_season(book_id)
            .ok_or_else(|| ActionError::BookNotFound(book_id.clone()))?;

        info!(book = %book.id, seasons = book.seasons.len(), "Started new season");
        Ok(book)
    }

    /// Moderate a draft and publish it as the next episode of the latest
    /// season of one of the author's books
    #[instrument(skip(self, draft), fields(book = %book_id))]
    pub async fn publish_episode(
        &mut self,
        book_id: &BookId,
        draft: EpisodeDraft,
    ) -> Result<Arc<Episode>, ActionError> {
        self.require_author()?;

        if draft.title.trim().is_empty() {
            return Err(ActionError::MissingField("title"));
        }
        if draft.content.trim().is_empty() {
            return Err(ActionError::MissingField("content"));
        }

        let book = self.require_own_book(book_id)?;
        let season = book
            .latest_season()
            .cloned()
            .ok_or_else(|| PublishError::NoSeason(book_id.clone()))?;
        let number = season.next_episode_number();

        let verdict = self.gate.screen(&draft.moderation_text()).await;
        if !verdict.safe {
            let reason = verdict
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION.to_string());
            info!(%reason, "Episode rejected by moderation");
            return Err(PublishError::Rejected { reason }.into());
        }

        let episode = Episode::new(number, draft.title, draft.content);
        let episode_id = episode.id.clone();
        self.catalog
            .add_episode(book_id, &season.id, episode)
            .ok_or_else(|| ActionError::BookNotFound(book_id.clone()))?;

        let published = self
            .catalog
            .episode(book_id, &season.id, &episode_id)
            .ok_or_else(|| ActionError::BookNotFound(book_id.clone()))?;
        info!(
            season = season.season_number,
            episode = published.episode_number,
            "Episode published"
        );
        Ok(published)
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Show a book's details page
    pub fn view_book(&mut self, book_id: &BookId) -> Result<Arc<Book>, ActionError> {
        let book = self
            .catalog
            .book(book_id)
            .ok_or_else(|| ActionError::BookNotFound(book_id.clone()))?;
        self.navigation
            .navigate(View::BookDetails, Some(book_id.clone()), None, None);
        Ok(book)
    }

    /// Open the first episode of the first season
    pub fn start_reading(&mut self, book_id: &BookId) -> Result<Arc<Episode>, ActionError> {
        let book = self
            .catalog
            .book(book_id)
            .ok_or_else(|| ActionError::BookNotFound(book_id.clone()))?;

        let (season_id, episode_id) = book
            .seasons
            .first()
            .and_then(|s| s.episodes.first().map(|e| (s.id.clone(), e.id.clone())))
            .ok_or_else(|| NavigationError::NoEpisodes(book_id.clone()))?;

        self.open_episode(book_id, &season_id, &episode_id)
    }

    /// Show an episode and count the view
    pub fn open_episode(
        &mut self,
        book_id: &BookId,
        season_id: &SeasonId,
        episode_id: &EpisodeId,
    ) -> Result<Arc<Episode>, ActionError> {
        if self.catalog.episode(book_id, season_id, episode_id).is_none() {
            return Err(NavigationError::EpisodeNotFound {
                book: book_id.clone(),
                season: season_id.clone(),
                episode: episode_id.clone(),
            }
            .into());
        }

        self.navigation.navigate(
            View::ReadEpisode,
            Some(book_id.clone()),
            Some(season_id.clone()),
            Some(episode_id.clone()),
        );
        self.catalog.increment_views(book_id, season_id, episode_id);
        debug!(book = %book_id, season = %season_id, episode = %episode_id, "Opened episode");

        self.catalog
            .episode(book_id, season_id, episode_id)
            .ok_or_else(|| ActionError::BookNotFound(book_id.clone()))
    }

    /// Open the episode after the selected one in the same season
    pub fn next_episode(&mut self) -> Result<Arc<Episode>, ActionError> {
        let (book_id, season_id, episode_id) = self.selected_ids()?;
        let season = self
            .catalog
            .season(&book_id, &season_id)
            .ok_or(NavigationError::NothingSelected)?;

        let next = season
            .episode_after(&episode_id)
            .ok_or(NavigationError::EndOfSeason)?;
        let next_id = next.id.clone();

        self.open_episode(&book_id, &season_id, &next_id)
    }

    /// Like or dislike the selected episode
    pub fn react(&mut self, reaction: Reaction) -> Result<Arc<Episode>, ActionError> {
        let (book_id, season_id, episode_id) = self.selected_ids()?;
        self.catalog
            .toggle_like(&book_id, &season_id, &episode_id, reaction)
            .ok_or(NavigationError::NothingSelected)?;

        self.catalog
            .episode(&book_id, &season_id, &episode_id)
            .ok_or_else(|| NavigationError::NothingSelected.into())
    }

    /// Comment on the selected episode.
    ///
    /// Blank text is ignored and yields `Ok(None)`.
    pub fn post_comment(&mut self, text: &str) -> Result<Option<Comment>, ActionError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        self.require_user()?;
        self.comment_filter.validate(text)?;

        let (book_id, season_id, episode_id) = self.selected_ids()?;
        let book = self
            .catalog
            .add_comment(&book_id, &season_id, &episode_id, text)
            .ok_or(NavigationError::NothingSelected)?;

        let comment = book
            .season(&season_id)
            .and_then(|s| s.episode(&episode_id))
            .and_then(|e| e.comments.first().cloned());
        Ok(comment)
    }

    /// Ids of the selected episode, if all three resolve
    fn selected_ids(&self) -> Result<(BookId, SeasonId, EpisodeId), NavigationError> {
        let episode = self
            .navigation
            .selected_episode(&self.catalog)
            .ok_or(NavigationError::NothingSelected)?;

        match (self.navigation.book_id(), self.navigation.season_id()) {
            (Some(book_id), Some(season_id)) => {
                Ok((book_id.clone(), season_id.clone(), episode.id.clone()))
            }
            _ => Err(NavigationError::NothingSelected),
        }
    }
}
