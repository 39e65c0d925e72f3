//! Compiled-in seed data every session starts from.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::{Book, Episode, EpisodeId, Season, SeasonId, User, UserId, UserRole};

/// Genres offered when creating a book
pub const GENRES: [&str; 8] = [
    "Fantasy",
    "Sci-Fi",
    "Romance",
    "Mystery",
    "Thriller",
    "Horror",
    "Historical",
    "Drama",
];

/// The account a fresh session is signed in as
pub fn default_user() -> User {
    User {
        id: UserId::from("u1"),
        username: "StoryLover99".to_string(),
        email: "reader@example.com".to_string(),
        avatar_url: "https://picsum.photos/200/200?random=1".to_string(),
        bio: "I love reading mystery novels.".to_string(),
        country: "USA".to_string(),
        contact_number: "+1234567890".to_string(),
        role: UserRole::Author,
        favorites: BTreeSet::new(),
        following: BTreeSet::new(),
    }
}

/// Books present at the start of every session
pub fn initial_books() -> Vec<Book> {
    let now = Utc::now();
    let ago = |ms: i64| now - Duration::milliseconds(ms);

    let seed_episode = |id: &str, number: u32, title: &str, content: &str, stats: [u64; 3], age_ms| {
        Arc::new(Episode {
            id: EpisodeId::from(id),
            episode_number: number,
            title: title.to_string(),
            content: content.to_string(),
            views: stats[0],
            likes: stats[1],
            dislikes: stats[2],
            comments: Vec::new(),
            published_at: ago(age_ms),
        })
    };

    vec![
        Book {
            id: "b1".into(),
            author_id: "u1".into(),
            author_name: "StoryLover99".to_string(),
            title: "The Midnight Chronicles".to_string(),
            cover_url: "https://picsum.photos/300/450?random=1".to_string(),
            description: "A detective discovers a hidden world beneath the city streets."
                .to_string(),
            genre: "Mystery".to_string(),
            tags: vec!["Detective".into(), "Magic".into(), "Noir".into()],
            total_views: 12500,
            created_at: ago(10_000_000),
            updated_at: now,
            seasons: vec![
                Arc::new(Season {
                    id: SeasonId::from("s1"),
                    season_number: 1,
                    episodes: vec![
                        seed_episode(
                            "e1",
                            1,
                            "The First Clue",
                            "It was a dark and stormy night...",
                            [5000, 120, 2],
                            10_000_000,
                        ),
                        seed_episode(
                            "e2",
                            2,
                            "Shadows Move",
                            "The shadows seemed to dance on the walls...",
                            [4500, 110, 1],
                            9_000_000,
                        ),
                    ],
                }),
                Arc::new(Season {
                    id: SeasonId::from("s2"),
                    season_number: 2,
                    episodes: vec![seed_episode(
                        "e3",
                        1,
                        "New Beginnings",
                        "Chapter 2 starts here...",
                        [3000, 90, 5],
                        5_000_000,
                    )],
                }),
            ],
        },
        Book {
            id: "b2".into(),
            author_id: "u2".into(),
            author_name: "JaneDoe".to_string(),
            title: "Galactic Horizons".to_string(),
            cover_url: "https://picsum.photos/300/450?random=2".to_string(),
            description: "Humanity reaches for the stars, but finds something else looking back."
                .to_string(),
            genre: "Sci-Fi".to_string(),
            tags: vec!["Space".into(), "Aliens".into(), "War".into()],
            total_views: 8900,
            created_at: ago(8_000_000),
            updated_at: now,
            seasons: vec![Arc::new(Season {
                id: SeasonId::from("s1"),
                season_number: 1,
                episodes: vec![seed_episode(
                    "e1",
                    1,
                    "Liftoff",
                    "The engines roared to life...",
                    [8900, 300, 10],
                    8_000_000,
                )],
            })],
        },
    ]
}

/// Whether `genre` is one of the offered genres (case-insensitive)
pub fn is_known_genre(genre: &str) -> bool {
    GENRES.iter().any(|g| g.eq_ignore_ascii_case(genre))
}
