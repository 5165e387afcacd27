use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use flashcards_srs::config::Config;
use flashcards_srs::database::db;
use flashcards_srs::export::json;
use flashcards_srs::models::{CardId, DeckId, RatingSubmission};
use rusqlite::Connection;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Spaced-repetition flashcards
#[derive(Parser)]
#[command(name = "flashcards")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Review scheduler for spaced-repetition flashcards")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Study date to use instead of today's UTC date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List decks and their card counts
    Decks,

    /// Create an empty deck
    NewDeck {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Append a card to a deck
    AddCard {
        deck: DeckId,
        front: String,
        back: String,
        #[arg(long)]
        reversible: bool,
    },

    /// Show a deck with its cards
    Show { deck: DeckId },

    /// Print the study queue for a deck, or for all decks
    Due {
        #[arg(long)]
        deck: Option<DeckId>,
    },

    /// Record one rating (0 = Again, 1 = Hard, 2 = Good, 3 = Easy)
    Rate { card: CardId, rating: i64 },

    /// Record a session's ratings from a JSON array of {cardId, rating}
    Submit { file: PathBuf },

    /// Import generated {front, back, reversible} cards into a deck
    Import { deck: DeckId, file: PathBuf },

    /// Import a whole deck file as a new deck
    ImportDeck { file: PathBuf },

    /// Export a deck to a JSON file
    Export { deck: DeckId, output: PathBuf },
}

impl Commands {
    /// Read-only listings seed a sample deck for a user with no decks yet.
    fn shows_sample_deck(&self) -> bool {
        matches!(self, Commands::Decks | Commands::Due { .. })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let mut conn =
        db::init_database(&config.database.path).context("Failed to initialize database")?;
    let user = config.study.user.as_str();

    if cli.command.shows_sample_deck() && db::get_decks_for_user(user, &conn)?.is_empty() {
        seed_sample_deck(user, &conn)?;
    }

    let today = cli.today.unwrap_or_else(|| Utc::now().date_naive());
    // A fixed --today also pins the review timestamp to that day.
    let now = match cli.today {
        Some(day) => day.and_time(NaiveTime::MIN).and_utc(),
        None => Utc::now(),
    };

    match cli.command {
        Commands::Decks => {
            for deck in db::get_decks_for_user(user, &conn)? {
                println!("{:>4}  {} ({} cards)", deck.id, deck.title, deck.cards.len());
            }
        }
        Commands::NewDeck { title, description } => {
            let id = db::new_deck(user, &title, description.as_deref(), None, &conn)?;
            println!("{id}");
        }
        Commands::AddCard {
            deck,
            front,
            back,
            reversible,
        } => {
            let id = db::add_card(deck, &front, &back, reversible, &conn)?;
            println!("{id}");
        }
        Commands::Show { deck } => {
            print_json(&db::get_deck(deck, &conn)?)?;
        }
        Commands::Due { deck } => {
            let due = match deck {
                Some(deck_id) => db::get_due_set_for_deck(user, deck_id, today, &conn)?,
                None => db::get_due_set_for_user(user, today, &conn)?,
            };
            print_json(&due)?;
        }
        Commands::Rate { card, rating } => {
            let (card_id, rating) = RatingSubmission {
                card_id: Some(card),
                rating: Some(rating),
            }
            .validate()?;
            let record = db::submit_rating(user, card_id, rating, now, &mut conn)?;
            info!(card_id, rating = %rating, next = %record.next_review_date, "rated");
            print_json(&record)?;
        }
        Commands::Submit { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let submissions: Vec<RatingSubmission> = serde_json::from_str(&contents)?;
            let report = db::submit_batch(user, &submissions, now, &mut conn);
            print_json(&report)?;
            if !report.is_complete_success() {
                anyhow::bail!(
                    "{} of {} ratings were not stored",
                    report.failed.len(),
                    submissions.len()
                );
            }
        }
        Commands::Import { deck, file } => {
            let cards = json::import_generated_cards(&file)?;
            json::add_generated_cards(deck, &cards, &conn)?;
            println!("{} cards added to deck {deck}", cards.len());
        }
        Commands::ImportDeck { file } => {
            let deck = json::import_json(&file)?;
            let id = json::store_deck(user, &deck, &conn)?;
            println!("{id}");
        }
        Commands::Export { deck, output } => {
            json::export_json_to_path(&db::get_deck(deck, &conn)?, &output)?;
        }
    }

    Ok(())
}

fn seed_sample_deck(user: &str, conn: &Connection) -> Result<()> {
    let deck_id = db::new_deck(user, "Polish Vocabulary", None, None, conn)?;
    db::add_card(deck_id, "cześć", "hello", true, conn)?;
    db::add_card(deck_id, "dziękuję", "thank you", true, conn)?;
    db::add_card(deck_id, "proszę", "please", true, conn)?;
    info!(deck_id, "sample deck created");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
