//! String identifiers for catalog entities.
//!
//! Seed data uses short literal ids (`b1`, `s1`, `e1`); ids minted at
//! runtime are a one-letter prefix followed by a simple-form UUID v4.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing id
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mint a fresh, unique id
            pub fn generate() -> Self {
                Self(format!("{}{}", $prefix, Uuid::new_v4().simple()))
            }

            /// Get the raw string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Book identifier
    BookId,
    "b"
);
string_id!(
    /// Season identifier (unique within its book)
    SeasonId,
    "s"
);
string_id!(
    /// Episode identifier (unique within its season)
    EpisodeId,
    "e"
);
string_id!(
    /// User identifier; authors are users
    UserId,
    "u"
);
string_id!(
    /// Comment identifier
    CommentId,
    "c"
);
