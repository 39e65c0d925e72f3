//! Session Integration Tests
//!
//! Tests for moderated publishing, reading flow and comments, using
//! in-process moderators instead of the Gemini API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use storystream::core::{
    ActionError, CommentError, EpisodeDraft, ModerationGate, ModerationPolicy, NavigationError,
    NewBook, PublishError, Screen, View,
};
use storystream::domain::{Reaction, UserRole};
use storystream::{
    BookId, ContentModerator, EpisodeId, ModerationError, SeasonId, Session, Verdict,
};

/// Returns a fixed verdict and counts calls
struct FixedModerator {
    verdict: Verdict,
    calls: AtomicUsize,
}

impl FixedModerator {
    fn new(verdict: Verdict) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ContentModerator for FixedModerator {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn check(&self, _text: &str) -> Result<Verdict, ModerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdict.clone())
    }
}

/// Always fails as if the API were unreachable
struct OfflineModerator;

#[async_trait]
impl ContentModerator for OfflineModerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn check(&self, _text: &str) -> Result<Verdict, ModerationError> {
        Err(ModerationError::MissingCredentials)
    }
}

/// Flags any text containing "NSFW" and records what it was shown
struct KeywordModerator {
    seen: std::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl ContentModerator for KeywordModerator {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn check(&self, text: &str) -> Result<Verdict, ModerationError> {
        self.seen.lock().unwrap().push(text.to_string());
        if text.contains("NSFW") {
            Ok(Verdict::flagged("NSFW"))
        } else {
            Ok(Verdict::safe())
        }
    }
}

fn session_with(moderator: Arc<dyn ContentModerator>, policy: ModerationPolicy) -> Session {
    Session::seeded(ModerationGate::new(moderator, policy))
}

fn allow_all() -> Session {
    session_with(FixedModerator::new(Verdict::safe()), ModerationPolicy::FailOpen)
}

fn b1() -> BookId {
    BookId::from("b1")
}

fn episode_count(session: &Session, book: &BookId, season: &str) -> usize {
    session
        .catalog()
        .season(book, &SeasonId::from(season))
        .map(|s| s.episodes.len())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_publish_appends_to_latest_season() {
    let mut session = allow_all();

    let episode = session
        .publish_episode(&b1(), EpisodeDraft::new("Return", "The detective returns."))
        .await
        .unwrap();

    // b1's latest season is s2, which had one episode
    assert_eq!(episode.episode_number, 2);
    assert_eq!(episode.views, 0);
    assert_eq!(episode_count(&session, &b1(), "s2"), 2);
    assert_eq!(episode_count(&session, &b1(), "s1"), 2);
}

#[tokio::test]
async fn test_rejected_episode_is_not_added() {
    let moderator = FixedModerator::new(Verdict::flagged("NSFW"));
    let mut session = session_with(moderator.clone(), ModerationPolicy::FailOpen);
    let before = session.catalog().book(&b1()).unwrap();

    let result = session
        .publish_episode(&b1(), EpisodeDraft::new("Steamy", "..."))
        .await;

    match result {
        Err(ActionError::Publish(PublishError::Rejected { reason })) => {
            assert_eq!(reason, "NSFW");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(moderator.calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&before, &session.catalog().book(&b1()).unwrap()));
}

#[tokio::test]
async fn test_rejection_without_reason_gets_default() {
    let moderator = FixedModerator::new(Verdict {
        safe: false,
        reason: None,
    });
    let mut session = session_with(moderator, ModerationPolicy::FailOpen);

    let err = session
        .publish_episode(&b1(), EpisodeDraft::new("Title", "Body"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Content Violation Detected: Unsafe content. Please revise."
    );
}

#[tokio::test]
async fn test_moderator_failure_fails_open() {
    let mut session = session_with(Arc::new(OfflineModerator), ModerationPolicy::FailOpen);

    let episode = session
        .publish_episode(&b1(), EpisodeDraft::new("Anyway", "Published regardless."))
        .await
        .unwrap();
    assert_eq!(episode.title, "Anyway");
}

#[tokio::test]
async fn test_moderator_failure_fails_closed() {
    let mut session = session_with(Arc::new(OfflineModerator), ModerationPolicy::FailClosed);

    let err = session
        .publish_episode(&b1(), EpisodeDraft::new("Blocked", "Never published."))
        .await
        .unwrap_err();

    match err {
        ActionError::Publish(PublishError::Rejected { reason }) => {
            assert!(reason.contains("Moderation unavailable"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(episode_count(&session, &b1(), "s2"), 1);
}

#[tokio::test]
async fn test_moderator_sees_title_and_body() {
    let moderator = Arc::new(KeywordModerator {
        seen: std::sync::Mutex::new(Vec::new()),
    });
    let mut session = session_with(moderator.clone(), ModerationPolicy::FailOpen);

    session
        .publish_episode(&b1(), EpisodeDraft::new("Clean title", "NSFW body"))
        .await
        .unwrap_err();

    let seen = moderator.seen.lock().unwrap();
    assert_eq!(seen.as_slice(), ["Clean title\nNSFW body"]);
}

#[tokio::test]
async fn test_blank_draft_skips_moderation() {
    let moderator = FixedModerator::new(Verdict::safe());
    let mut session = session_with(moderator.clone(), ModerationPolicy::FailOpen);

    let err = session
        .publish_episode(&b1(), EpisodeDraft::new("Title", "   "))
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::MissingField("content")));
    assert_eq!(moderator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_publish_to_unknown_book() {
    let mut session = allow_all();

    let err = session
        .publish_episode(&BookId::from("b404"), EpisodeDraft::new("T", "C"))
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::BookNotFound(_)));
}

#[tokio::test]
async fn test_new_book_then_new_season_then_publish() {
    let mut session = allow_all();

    let book = session
        .create_book(NewBook {
            title: "Tidewater".to_string(),
            description: "A lighthouse keeper's secrets.".to_string(),
            genre: "Horror".to_string(),
            tags: vec!["Sea".to_string()],
        })
        .unwrap();
    assert_eq!(session.catalog().books()[0].id, book.id);
    assert_eq!(book.author_name, "StoryLover99");

    let first = session
        .publish_episode(&book.id, EpisodeDraft::new("Pilot", "Waves."))
        .await
        .unwrap();
    assert_eq!(first.episode_number, 1);

    let book = session.start_new_season(&book.id).unwrap();
    assert_eq!(book.seasons.len(), 2);
    assert_eq!(book.seasons[1].season_number, 2);

    let second = session
        .publish_episode(&book.id, EpisodeDraft::new("Storm", "More waves."))
        .await
        .unwrap();
    assert_eq!(second.episode_number, 1);
    assert_eq!(
        session.catalog().book(&book.id).unwrap().seasons[1].episodes[0].title,
        "Storm"
    );
}

#[test]
fn test_create_book_validation() {
    let mut session = allow_all();

    let err = session
        .create_book(NewBook {
            title: "Untitled".to_string(),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::MissingField("description")));

    let err = session
        .create_book(NewBook {
            title: "Cookbook".to_string(),
            description: "Recipes".to_string(),
            genre: "Cooking".to_string(),
            tags: Vec::new(),
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::UnknownGenre(_)));

    session.sign_out();
    let err = session
        .create_book(NewBook {
            title: "T".to_string(),
            description: "D".to_string(),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::NotSignedIn));
}

#[test]
fn test_reading_flow_counts_views() {
    let mut session = allow_all();

    let first = session.start_reading(&b1()).unwrap();
    assert_eq!(first.id, EpisodeId::from("e1"));
    assert_eq!(first.views, 5001);
    assert_eq!(session.navigation().view(), View::ReadEpisode);

    let second = session.next_episode().unwrap();
    assert_eq!(second.id, EpisodeId::from("e2"));
    assert_eq!(second.views, 4501);

    let err = session.next_episode().unwrap_err();
    assert!(matches!(
        err,
        ActionError::Navigation(NavigationError::EndOfSeason)
    ));

    assert_eq!(session.catalog().book(&b1()).unwrap().total_views, 12502);
}

#[test]
fn test_open_unknown_episode_does_not_navigate() {
    let mut session = allow_all();

    let err = session
        .open_episode(&b1(), &SeasonId::from("s1"), &EpisodeId::from("e9"))
        .unwrap_err();

    assert!(matches!(
        err,
        ActionError::Navigation(NavigationError::EpisodeNotFound { .. })
    ));
    assert_eq!(session.navigation().view(), View::Home);
}

#[test]
fn test_comments_and_reactions_on_selected_episode() {
    let mut session = allow_all();
    session.start_reading(&BookId::from("b2")).unwrap();

    assert!(session.post_comment("   ").unwrap().is_none());

    let err = session.post_comment("such SLANG").unwrap_err();
    assert!(matches!(
        err,
        ActionError::Comment(CommentError::Disrespectful)
    ));

    let comment = session.post_comment("Great opener!").unwrap().unwrap();
    assert_eq!(comment.content, "Great opener!");

    let episode = session.react(Reaction::Dislike).unwrap();
    assert_eq!(episode.dislikes, 11);
    assert_eq!(episode.comments.len(), 1);

    match session.screen() {
        Screen::Reader { episode, .. } => assert_eq!(episode.comments[0].content, "Great opener!"),
        other => panic!("expected reader screen, got {:?}", other),
    }
}

#[test]
fn test_comment_without_selection() {
    let mut session = allow_all();

    let err = session.post_comment("Hello").unwrap_err();
    assert!(matches!(
        err,
        ActionError::Navigation(NavigationError::NothingSelected)
    ));
}

#[test]
fn test_sign_in_and_out() {
    let mut session = allow_all();

    session.sign_out();
    assert!(session.user().is_none());
    assert!(matches!(session.screen(), Screen::Auth));
    assert!(matches!(
        session.toggle_favorite(&b1()),
        Err(ActionError::NotSignedIn)
    ));

    let user = session.sign_in("  ", UserRole::Reader);
    assert_eq!(user.username, "NewUser");
    assert_eq!(user.bio, "Just joined!");
    assert_eq!(session.navigation().view(), View::Home);

    assert!(session.toggle_favorite(&b1()).unwrap());
    assert!(!session.toggle_favorite(&b1()).unwrap());
}

#[tokio::test]
async fn test_reader_cannot_author() {
    let moderator = FixedModerator::new(Verdict::safe());
    let mut session = session_with(moderator.clone(), ModerationPolicy::FailOpen);
    session.sign_in("lurker", UserRole::Reader);
    let b2 = BookId::from("b2");

    let err = session
        .publish_episode(&b2, EpisodeDraft::new("Hijack", "Not my book."))
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::NotAuthor));

    let err = session.start_new_season(&b2).unwrap_err();
    assert!(matches!(err, ActionError::NotAuthor));

    let err = session
        .create_book(NewBook {
            title: "Diary".to_string(),
            description: "Private".to_string(),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::NotAuthor));

    assert_eq!(moderator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.catalog().book(&b2).unwrap().seasons.len(), 1);
    assert_eq!(session.catalog().len(), 2);
}

#[tokio::test]
async fn test_author_cannot_touch_another_authors_book() {
    let moderator = FixedModerator::new(Verdict::safe());
    let mut session = session_with(moderator.clone(), ModerationPolicy::FailOpen);
    // The seed user u1 wrote b1; b2 belongs to u2
    let b2 = BookId::from("b2");
    let before = session.catalog().book(&b2).unwrap();

    let err = session
        .publish_episode(&b2, EpisodeDraft::new("Hijack", "Not my book."))
        .await
        .unwrap_err();
    match err {
        ActionError::NotOwner(book) => assert_eq!(book, b2),
        other => panic!("expected ownership error, got {:?}", other),
    }

    let err = session.start_new_season(&b2).unwrap_err();
    assert!(matches!(err, ActionError::NotOwner(_)));

    assert_eq!(moderator.calls.load(Ordering::SeqCst), 0);
    assert!(Arc::ptr_eq(&before, &session.catalog().book(&b2).unwrap()));
}

#[test]
fn test_new_author_owns_only_their_books() {
    let mut session = allow_all();
    session.sign_in("quill", UserRole::Author);

    let book = session
        .create_book(NewBook {
            title: "Ink".to_string(),
            description: "Fresh pages".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(book.genre, "Fantasy");
    assert_eq!(session.start_new_season(&book.id).unwrap().seasons.len(), 2);

    assert!(matches!(
        session.start_new_season(&b1()),
        Err(ActionError::NotOwner(_))
    ));
}

#[tokio::test]
async fn test_session_gate_screens_text() {
    let session = session_with(Arc::new(OfflineModerator), ModerationPolicy::FailClosed);

    assert_eq!(session.gate().moderator_name(), "offline");
    assert_eq!(session.gate().policy(), ModerationPolicy::FailClosed);
    assert!(!session.gate().screen("Any text").await.safe);
}
