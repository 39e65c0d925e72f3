//! The signed-in user and profile edits.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ids::{BookId, UserId};

/// What a user is allowed to do on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Reader,
    Author,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Reader => write!(f, "reader"),
            UserRole::Author => write!(f, "author"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "reader" => Ok(UserRole::Reader),
            "author" | "writer" => Ok(UserRole::Author),
            _ => anyhow::bail!("Unknown role: {}", s),
        }
    }
}

/// A platform account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
    pub bio: String,
    pub country: String,
    pub contact_number: String,
    pub role: UserRole,

    /// Favorited book ids
    #[serde(default)]
    pub favorites: BTreeSet<BookId>,

    /// Followed author ids
    #[serde(default)]
    pub following: BTreeSet<UserId>,
}

impl User {
    /// Create a freshly signed-up account
    pub fn new(username: impl Into<String>, role: UserRole) -> Self {
        let id = UserId::generate();
        let username = username.into();

        Self {
            email: format!("{}@example.com", username),
            avatar_url: format!("https://picsum.photos/200/200?random={}", id),
            id,
            username,
            bio: "Just joined!".to_string(),
            country: "Unknown".to_string(),
            contact_number: String::new(),
            role,
            favorites: BTreeSet::new(),
            following: BTreeSet::new(),
        }
    }

    pub fn is_author(&self) -> bool {
        self.role == UserRole::Author
    }

    /// Apply a partial profile edit, returning the updated copy
    pub fn with_profile(&self, update: &ProfileUpdate) -> Self {
        let mut user = self.clone();
        if let Some(ref username) = update.username {
            user.username = username.clone();
        }
        if let Some(ref email) = update.email {
            user.email = email.clone();
        }
        if let Some(ref avatar_url) = update.avatar_url {
            user.avatar_url = avatar_url.clone();
        }
        if let Some(ref bio) = update.bio {
            user.bio = bio.clone();
        }
        if let Some(ref country) = update.country {
            user.country = country.clone();
        }
        if let Some(ref contact_number) = update.contact_number {
            user.contact_number = contact_number.clone();
        }
        user
    }
}

/// Partial profile edit; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub country: Option<String>,
    pub contact_number: Option<String>,
}
