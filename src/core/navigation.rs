//! Which screen is showing and what is selected.
//!
//! `navigate` only overwrites the ids it is given. A selection made on one
//! screen therefore survives trips through screens that do not use it: going
//! Reader -> Profile -> Book details keeps the previously read season and
//! episode selected. Selected entities are looked up on every call and come
//! back `None` once an id stops resolving.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Book, BookId, Episode, EpisodeId, Season, SeasonId, User};
use crate::library::Catalog;

/// Screen discriminator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Home,
    BookDetails,
    ReadEpisode,
    Dashboard,
    Profile,
    Auth,
}

/// Navigation failures surfaced by reader actions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("No episode is selected")]
    NothingSelected,

    #[error("Episode {episode} not found in {book}/{season}")]
    EpisodeNotFound {
        book: BookId,
        season: SeasonId,
        episode: EpisodeId,
    },

    #[error("Book {0} has no episodes yet")]
    NoEpisodes(BookId),

    #[error("End of season! Check back later.")]
    EndOfSeason,
}

/// Current view plus retained selections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Navigation {
    view: View,
    book_id: Option<BookId>,
    season_id: Option<SeasonId>,
    episode_id: Option<EpisodeId>,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Switch view, overwriting only the ids supplied
    pub fn navigate(
        &mut self,
        view: View,
        book_id: Option<BookId>,
        season_id: Option<SeasonId>,
        episode_id: Option<EpisodeId>,
    ) {
        self.view = view;
        if book_id.is_some() {
            self.book_id = book_id;
        }
        if season_id.is_some() {
            self.season_id = season_id;
        }
        if episode_id.is_some() {
            self.episode_id = episode_id;
        }
    }

    /// Switch view without touching selections
    pub fn go(&mut self, view: View) {
        self.navigate(view, None, None, None);
    }

    pub fn book_id(&self) -> Option<&BookId> {
        self.book_id.as_ref()
    }

    pub fn season_id(&self) -> Option<&SeasonId> {
        self.season_id.as_ref()
    }

    pub fn episode_id(&self) -> Option<&EpisodeId> {
        self.episode_id.as_ref()
    }

    pub fn selected_book(&self, catalog: &Catalog) -> Option<Arc<Book>> {
        catalog.book(self.book_id.as_ref()?)
    }

    pub fn selected_season(&self, catalog: &Catalog) -> Option<Arc<Season>> {
        catalog.season(self.book_id.as_ref()?, self.season_id.as_ref()?)
    }

    pub fn selected_episode(&self, catalog: &Catalog) -> Option<Arc<Episode>> {
        catalog.episode(
            self.book_id.as_ref()?,
            self.season_id.as_ref()?,
            self.episode_id.as_ref()?,
        )
    }

    /// Resolve the current view into the data its screen needs
    pub fn screen(&self, catalog: &Catalog) -> Screen {
        let missing = Screen::Missing { view: self.view };

        match self.view {
            View::Home => Screen::Home,
            View::Auth => Screen::Auth,
            View::BookDetails => self
                .selected_book(catalog)
                .map(|book| Screen::BookDetails { book })
                .unwrap_or(missing),
            View::ReadEpisode => {
                match (
                    self.selected_book(catalog),
                    self.selected_season(catalog),
                    self.selected_episode(catalog),
                ) {
                    (Some(book), Some(season), Some(episode)) => Screen::Reader {
                        book,
                        season,
                        episode,
                    },
                    _ => missing,
                }
            }
            View::Dashboard => catalog
                .user()
                .filter(|user| user.is_author())
                .cloned()
                .map(|author| Screen::Dashboard { author })
                .unwrap_or(missing),
            View::Profile => catalog
                .user()
                .cloned()
                .map(|user| Screen::Profile { user })
                .unwrap_or(missing),
        }
    }
}

/// A resolved screen carrying only the data it renders
#[derive(Debug, Clone)]
pub enum Screen {
    Home,
    BookDetails {
        book: Arc<Book>,
    },
    Reader {
        book: Arc<Book>,
        season: Arc<Season>,
        episode: Arc<Episode>,
    },
    Dashboard {
        author: Arc<User>,
    },
    Profile {
        user: Arc<User>,
    },
    Auth,

    /// The view's entity (or the signed-in user it needs; the dashboard
    /// needs an author) does not resolve
    Missing {
        view: View,
    },
}
