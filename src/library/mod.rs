//! The content library: books, the signed-in user and discovery shelves.
//!
//! Everything here is in memory for the lifetime of one session. A new
//! session starts again from the compiled-in seed data.
//!
//! # Layout
//!
//! ```text
//! Catalog
//! ├── user                      # current account (or none)
//! └── books[]                   # newest first
//!     └── seasons[]             # season_number 1..=n
//!         └── episodes[]        # episode_number 1..=n
//!             └── comments[]    # newest first
//! ```

pub mod catalog;
pub mod seed;
pub mod shelves;

pub use catalog::Catalog;
pub use seed::GENRES;
pub use shelves::AuthorStats;
