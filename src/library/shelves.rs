//! Read-only discovery queries over a catalog snapshot.
//!
//! Shelves never mutate; they borrow the books and hand back ordered
//! subsets for the home page, profile page and author dashboard.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{Book, User, UserId};

/// Length of the "this week" window in days
pub const WEEK_DAYS: i64 = 7;

/// Books sorted by creation time, most recent first
pub fn recent_releases(books: &[Arc<Book>], limit: usize) -> Vec<&Arc<Book>> {
    let mut items: Vec<_> = books.iter().collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items.truncate(limit);
    items
}

/// Books sorted by total views, most read first
pub fn trending(books: &[Arc<Book>], limit: usize) -> Vec<&Arc<Book>> {
    let mut items: Vec<_> = books.iter().collect();
    items.sort_by(|a, b| b.total_views.cmp(&a.total_views));
    items.truncate(limit);
    items
}

/// Top five by views, ranked from 1
pub fn leaderboard(books: &[Arc<Book>]) -> Vec<(usize, &Arc<Book>)> {
    trending(books, 5)
        .into_iter()
        .enumerate()
        .map(|(idx, book)| (idx + 1, book))
        .collect()
}

/// Books updated within the last week
pub fn this_week(books: &[Arc<Book>], now: DateTime<Utc>) -> Vec<&Arc<Book>> {
    books
        .iter()
        .filter(|b| now - b.updated_at < Duration::days(WEEK_DAYS))
        .collect()
}

/// Books of one genre (case-insensitive)
pub fn by_genre<'a>(books: &'a [Arc<Book>], genre: &str) -> Vec<&'a Arc<Book>> {
    books
        .iter()
        .filter(|b| b.genre.eq_ignore_ascii_case(genre))
        .collect()
}

/// Search by query (case-insensitive substring match on title, author,
/// genre and tags)
pub fn search<'a>(books: &'a [Arc<Book>], query: &str) -> Vec<&'a Arc<Book>> {
    let query_lower = query.to_lowercase();

    books
        .iter()
        .filter(|book| {
            book.title.to_lowercase().contains(&query_lower)
                || book.author_name.to_lowercase().contains(&query_lower)
                || book.genre.to_lowercase().contains(&query_lower)
                || book
                    .tags
                    .iter()
                    .any(|t| t.to_lowercase().contains(&query_lower))
        })
        .collect()
}

/// Books the user has favorited, in catalog order
pub fn favorites_of<'a>(books: &'a [Arc<Book>], user: &User) -> Vec<&'a Arc<Book>> {
    books
        .iter()
        .filter(|b| user.favorites.contains(&b.id))
        .collect()
}

/// Books written by an author, in catalog order
pub fn stories_by<'a>(books: &'a [Arc<Book>], author_id: &UserId) -> Vec<&'a Arc<Book>> {
    books.iter().filter(|b| &b.author_id == author_id).collect()
}

/// Where an author currently is in a book: last season and its episode count
pub fn latest_position(book: &Book) -> Option<(u32, usize)> {
    book.latest_season()
        .map(|s| (s.season_number, s.episodes.len()))
}

/// Aggregate numbers for an author's dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthorStats {
    pub books: usize,
    pub total_views: u64,
    pub episodes: usize,
}

impl AuthorStats {
    pub fn for_author(books: &[Arc<Book>], author_id: &UserId) -> Self {
        let mine = stories_by(books, author_id);

        Self {
            books: mine.len(),
            total_views: mine.iter().map(|b| b.total_views).sum(),
            episodes: mine.iter().map(|b| b.episode_count()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::seed::initial_books;

    fn seeded() -> Vec<Arc<Book>> {
        initial_books().into_iter().map(Arc::new).collect()
    }

    #[test]
    fn test_trending_orders_by_views() {
        let books = seeded();
        let ranked = trending(&books, 10);

        assert_eq!(ranked[0].id.as_str(), "b1");
        assert_eq!(ranked[1].id.as_str(), "b2");
        assert_eq!(trending(&books, 1).len(), 1);
    }

    #[test]
    fn test_recent_releases_orders_by_creation() {
        let books = seeded();
        let recent = recent_releases(&books, 10);

        // b2 was created after b1
        assert_eq!(recent[0].id.as_str(), "b2");
    }

    #[test]
    fn test_leaderboard_ranks_from_one() {
        let books = seeded();
        let board = leaderboard(&books);

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].0, 1);
        assert_eq!(board[0].1.title, "The Midnight Chronicles");
    }

    #[test]
    fn test_this_week_excludes_stale_books() {
        let books = seeded();
        assert_eq!(this_week(&books, Utc::now()).len(), 2);
        assert!(this_week(&books, Utc::now() + Duration::days(8)).is_empty());
    }

    #[test]
    fn test_search() {
        let books = seeded();

        // Title
        assert_eq!(search(&books, "midnight").len(), 1);
        // Author
        assert_eq!(search(&books, "janedoe").len(), 1);
        // Tag, case insensitive
        assert_eq!(search(&books, "ALIENS").len(), 1);
        // Genre
        assert_eq!(search(&books, "mystery").len(), 1);
        // No match
        assert!(search(&books, "cooking").is_empty());
    }

    #[test]
    fn test_author_stats() {
        let books = seeded();
        let stats = AuthorStats::for_author(&books, &UserId::from("u1"));

        assert_eq!(stats.books, 1);
        assert_eq!(stats.total_views, 12500);
        assert_eq!(stats.episodes, 3);
        assert_eq!(latest_position(&books[0]), Some((2, 1)));
    }
}
