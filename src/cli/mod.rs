//! Command-line interface for storystream.
//!
//! Every invocation starts a fresh session over the seed data, so changes
//! made by one command (a counted view, a published episode) are visible
//! only in that command's output.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::config::{self, ResolvedConfig};
use crate::core::{ActionError, EpisodeDraft, PublishError, Screen, Session, View};
use crate::domain::{Book, BookId, EpisodeId, ProfileUpdate, SeasonId, UserId};
use crate::library::{shelves, AuthorStats, GENRES};

/// storystream - Serial-fiction reading and publishing
#[derive(Parser, Debug)]
#[command(name = "storystream")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the home shelves
    Home,

    /// Show a book with its seasons and episodes
    Book {
        /// Book ID
        book_id: String,

        /// Print the book snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read an episode (defaults to the first one)
    Read {
        /// Book ID
        book_id: String,

        /// Season ID
        #[arg(short, long, requires = "episode")]
        season: Option<String>,

        /// Episode ID
        #[arg(short, long, requires = "season")]
        episode: Option<String>,
    },

    /// Search books by title, author, genre or tag
    Search {
        /// Search query
        query: String,
    },

    /// Show the signed-in author's dashboard
    Dashboard,

    /// Show the signed-in user's profile, optionally editing it first
    Profile {
        /// Toggle a book in favorites (repeatable)
        #[arg(long = "favorite")]
        favorites: Vec<String>,

        /// Toggle following an author (repeatable)
        #[arg(long = "follow")]
        follows: Vec<String>,

        /// New bio
        #[arg(long)]
        bio: Option<String>,

        /// New country
        #[arg(long)]
        country: Option<String>,
    },

    /// Moderate and publish a new episode
    Publish {
        /// Book ID
        book_id: String,

        /// Episode title
        #[arg(short, long)]
        title: String,

        /// Episode body file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Run the moderation check on a text
    Moderate {
        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = config::config()?;

        match self.command {
            Commands::Home => show_home(config),
            Commands::Book { book_id, json } => show_book(config, &book_id, json),
            Commands::Read {
                book_id,
                season,
                episode,
            } => read_episode(config, &book_id, season, episode),
            Commands::Search { query } => search_books(config, &query),
            Commands::Dashboard => show_dashboard(config),
            Commands::Profile {
                favorites,
                follows,
                bio,
                country,
            } => show_profile(config, favorites, follows, bio, country),
            Commands::Publish {
                book_id,
                title,
                input,
            } => publish_episode(config, &book_id, title, input).await,
            Commands::Moderate { input } => moderate(config, input).await,
            Commands::Config => show_config(config),
        }
    }
}

/// Show the home shelves
fn show_home(config: &ResolvedConfig) -> Result<()> {
    let session = Session::from_config(config);
    let books = session.catalog().books();

    print_shelf("This Week's Hits", &shelves::this_week(books, Utc::now()));
    print_shelf("New Releases", &shelves::recent_releases(books, 10));
    print_shelf("Trending Now", &shelves::trending(books, 10));
    for genre in GENRES {
        print_shelf(genre, &shelves::by_genre(books, genre));
    }

    println!("Leaderboard");
    println!("{}", "-".repeat(80));
    for (rank, book) in shelves::leaderboard(books) {
        println!("#{:<3} {:<50} {:>10} reads", rank, truncate(&book.title, 47), book.total_views);
    }

    Ok(())
}

/// Show a book with its seasons and episodes
fn show_book(config: &ResolvedConfig, book_id: &str, json: bool) -> Result<()> {
    let mut session = Session::from_config(config);
    let book = session.view_book(&BookId::from(book_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&book)?);
        return Ok(());
    }

    println!("  ID: {}", book.id);
    println!("  Title: {}", book.title);
    println!("  Author: {} ({})", book.author_name, book.author_id);
    println!("  Genre: {}", book.genre);
    if !book.tags.is_empty() {
        println!("  Tags: {}", book.tags.join(", "));
    }
    println!("  Reads: {}", book.total_views);
    println!("  Updated: {}", book.updated_at);
    println!("\n{}\n", book.description);

    for season in &book.seasons {
        println!("Season {} ({})", season.season_number, season.id);
        if season.episodes.is_empty() {
            println!("  No episodes yet.");
        }
        for episode in &season.episodes {
            println!(
                "  {:>3}. {:<40} [{}] {:>8} views",
                episode.episode_number,
                truncate(&episode.title, 37),
                episode.id,
                episode.views
            );
        }
    }

    Ok(())
}

/// Read an episode, counting the view
fn read_episode(
    config: &ResolvedConfig,
    book_id: &str,
    season: Option<String>,
    episode: Option<String>,
) -> Result<()> {
    let mut session = Session::from_config(config);
    let book_id = BookId::from(book_id);

    let episode = match (season, episode) {
        (Some(season), Some(episode)) => session.open_episode(
            &book_id,
            &SeasonId::from(season),
            &EpisodeId::from(episode),
        )?,
        _ => session.start_reading(&book_id)?,
    };

    let book = session
        .navigation()
        .selected_book(session.catalog())
        .context("Selected book disappeared")?;
    let season = session
        .navigation()
        .selected_season(session.catalog())
        .context("Selected season disappeared")?;

    println!("{} - Season {}", book.title, season.season_number);
    println!("Ep {}: {}\n", episode.episode_number, episode.title);
    for paragraph in episode.content.split('\n') {
        println!("{}", paragraph);
    }
    println!(
        "\n{} views  {} likes  {} dislikes",
        episode.views, episode.likes, episode.dislikes
    );

    if !episode.comments.is_empty() {
        println!("\nComments");
        for comment in &episode.comments {
            println!("  {} ({}): {}", comment.username, comment.timestamp, comment.content);
        }
    }

    match season.episode_after(&episode.id) {
        Some(next) => eprintln!("\n[Next: {} --season {} --episode {}]", book.id, season.id, next.id),
        None => eprintln!("\n[End of season! Check back later.]"),
    }

    Ok(())
}

/// Search books
fn search_books(config: &ResolvedConfig, query: &str) -> Result<()> {
    let session = Session::from_config(config);
    let results = shelves::search(session.catalog().books(), query);

    if results.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    println!("Found {} result(s) for \"{}\":\n", results.len(), query);
    print_table(&results);

    Ok(())
}

/// Show the signed-in author's dashboard
fn show_dashboard(config: &ResolvedConfig) -> Result<()> {
    let mut session = Session::from_config(config);
    session.navigate(View::Dashboard, None, None, None);
    let user = match session.screen() {
        Screen::Dashboard { author } => author,
        _ => return Err(ActionError::NotAuthor.into()),
    };
    let books = session.catalog().books();
    let stats = AuthorStats::for_author(books, &user.id);

    println!("Dashboard for {} ({})", user.username, user.role);
    println!(
        "  Stories: {}  Episodes: {}  Reads: {}\n",
        stats.books, stats.episodes, stats.total_views
    );

    for book in shelves::stories_by(books, &user.id) {
        let (season, episodes) = shelves::latest_position(book).unwrap_or((0, 0));
        println!(
            "{:<12} {:<40} Season {}, Ep {}",
            book.id.as_str(),
            truncate(&book.title, 37),
            season,
            episodes
        );
    }

    Ok(())
}

/// Show the signed-in user's profile after applying any edits
fn show_profile(
    config: &ResolvedConfig,
    favorites: Vec<String>,
    follows: Vec<String>,
    bio: Option<String>,
    country: Option<String>,
) -> Result<()> {
    let mut session = Session::from_config(config);

    for book_id in favorites {
        let book_id = BookId::from(book_id);
        let added = session.toggle_favorite(&book_id)?;
        eprintln!("[{} {} favorites]", book_id, if added { "added to" } else { "removed from" });
    }
    for author_id in follows {
        let author_id = UserId::from(author_id);
        let followed = session.toggle_follow(&author_id)?;
        eprintln!("[{} {}]", if followed { "Following" } else { "Unfollowed" }, author_id);
    }
    if bio.is_some() || country.is_some() {
        session.save_profile(&ProfileUpdate {
            bio,
            country,
            ..Default::default()
        })?;
    }

    session.navigate(View::Profile, None, None, None);
    let user = match session.screen() {
        Screen::Profile { user } => user,
        _ => return Err(ActionError::NotSignedIn.into()),
    };

    println!("{} ({})", user.username, user.role);
    println!("  Email: {}", user.email);
    println!("  Country: {}", user.country);
    println!("  Bio: {}", user.bio);
    println!("  Following: {}", user.following.len());
    println!();

    print_shelf("Favorites", &shelves::favorites_of(session.catalog().books(), &user));
    print_shelf("My Stories", &shelves::stories_by(session.catalog().books(), &user.id));

    Ok(())
}

/// Moderate and publish an episode
async fn publish_episode(
    config: &ResolvedConfig,
    book_id: &str,
    title: String,
    input: Option<PathBuf>,
) -> Result<()> {
    let content = read_input(input)?;
    let mut session = Session::from_config(config);
    let book_id = BookId::from(book_id);

    match session
        .publish_episode(&book_id, EpisodeDraft::new(title, content))
        .await
    {
        Ok(episode) => {
            let season = session
                .catalog()
                .book(&book_id)
                .and_then(|b| b.latest_season().map(|s| s.season_number))
                .unwrap_or_default();

            eprintln!("\n[Episode Published Successfully!]");
            eprintln!("   Book: {}", book_id);
            eprintln!("   Season {}, Ep {}: {}", season, episode.episode_number, episode.title);
            eprintln!("   ID: {}", episode.id);
            Ok(())
        }
        Err(ActionError::Publish(PublishError::Rejected { reason })) => {
            eprintln!("\n[Content Violation Detected: {}. Please revise.]", reason);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Run the moderation check on a text
async fn moderate(config: &ResolvedConfig, input: Option<PathBuf>) -> Result<()> {
    let text = read_input(input)?;
    let session = Session::from_config(config);

    let verdict = session.gate().screen(&text).await;
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    if !verdict.safe {
        std::process::exit(1);
    }
    Ok(())
}

/// Show resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    println!("storystream configuration");
    println!("{}", "=".repeat(50));
    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }

    let moderation = &config.moderation;
    println!("\nModeration:");
    println!("  Model: {}", moderation.model);
    println!("  Endpoint: {}", moderation.endpoint);
    println!("  Policy: {}", moderation.policy);
    println!("  Timeout: {}s", moderation.timeout_seconds);
    println!("  Prompt excerpt: {} chars", moderation.max_prompt_chars);
    println!(
        "  API key: {}",
        if moderation.api_key.is_some() { "set" } else { "missing" }
    );

    println!("\nBlocked comment patterns:");
    for pattern in &config.blocked_comment_patterns {
        println!("  {}", pattern);
    }

    Ok(())
}

/// Read text from a file, or from stdin when no file is given
fn read_input(input: Option<PathBuf>) -> Result<String> {
    let text = if let Some(path) = input {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        anyhow::bail!("No input provided. Use --input <file> or pipe to stdin");
    };

    if text.trim().is_empty() {
        anyhow::bail!("Input is empty");
    }

    Ok(text)
}

fn print_shelf(title: &str, books: &[&Arc<Book>]) {
    if books.is_empty() {
        return;
    }

    println!("{}", title);
    print_table(books);
    println!();
}

fn print_table(books: &[&Arc<Book>]) {
    println!("{:<12} {:<40} {:<16} {:>10}", "ID", "TITLE", "AUTHOR", "READS");
    println!("{}", "-".repeat(80));

    for book in books {
        println!(
            "{:<12} {:<40} {:<16} {:>10}",
            book.id.as_str(),
            truncate(&book.title, 37),
            truncate(&book.author_name, 13),
            book.total_views
        );
    }
}

/// Shorten to `max` characters, marking the cut with an ellipsis
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
