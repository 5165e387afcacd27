//! Database operations for the review scheduler
//!
//! Handles SQLite schema creation, deck and card storage, and the review
//! records the scheduler reads and rewrites. Rating submission is a single
//! IMMEDIATE transaction: read the current record, advance it, upsert it.

use crate::error::{Error, Result};
use crate::models::{
    Card, CardId, Deck, DeckId, DueSet, Rating, RatingSubmission, ReviewRecord, ReviewState,
    select_due, sm2,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Opens (or creates) the SQLite file at `path` and makes sure the schema exists.
pub fn init_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    create_schema(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS decks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            source_url TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_id INTEGER NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            is_reversible INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL
        );

        -- One row per (user, card) pair, created on the first rating
        CREATE TABLE IF NOT EXISTS reviews (
            user_id TEXT NOT NULL,
            card_id INTEGER NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
            ease_factor REAL NOT NULL,
            interval INTEGER NOT NULL,
            repetitions INTEGER NOT NULL,
            next_review_date TEXT NOT NULL,
            last_reviewed_at TEXT NOT NULL,
            PRIMARY KEY (user_id, card_id)
        );

        CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id, position);
        CREATE INDEX IF NOT EXISTS idx_decks_user ON decks(user_id);",
    )?;
    Ok(())
}

// Deck operations

/// Creates a deck owned by `user_id` and returns its id
pub fn new_deck(
    user_id: &str,
    title: &str,
    description: Option<&str>,
    source_url: Option<&str>,
    conn: &Connection,
) -> Result<DeckId> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("deck title must not be empty".to_string()));
    }
    conn.execute(
        "INSERT INTO decks (user_id, title, description, source_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, title, description, source_url, Utc::now()],
    )?;
    let deck_id = conn.last_insert_rowid();
    info!(deck_id, title, "deck created");
    Ok(deck_id)
}

/// Deletes a deck; its cards and their review records go with it.
pub fn delete_deck(deck_id: DeckId, conn: &Connection) -> Result<()> {
    let deleted = conn.execute("DELETE FROM decks WHERE id = ?1", params![deck_id])?;
    if deleted == 0 {
        return Err(Error::NotFound(format!("deck {deck_id}")));
    }
    info!(deck_id, "deck deleted");
    Ok(())
}

/// Loads a deck with its cards in position order
pub fn get_deck(deck_id: DeckId, conn: &Connection) -> Result<Deck> {
    let deck = conn
        .query_row(
            "SELECT id, user_id, title, description, source_url, created_at
             FROM decks WHERE id = ?1",
            params![deck_id],
            deck_from_row,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("deck {deck_id}")))?;

    Ok(Deck {
        cards: get_cards_for_deck(deck_id, conn)?,
        ..deck
    })
}

/// Loads every deck owned by `user_id`, each with its cards
pub fn get_decks_for_user(user_id: &str, conn: &Connection) -> Result<Vec<Deck>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, description, source_url, created_at
         FROM decks WHERE user_id = ?1 ORDER BY id",
    )?;
    let decks = stmt
        .query_map(params![user_id], deck_from_row)?
        .collect::<rusqlite::Result<Vec<Deck>>>()?;

    decks
        .into_iter()
        .map(|deck| {
            let cards = get_cards_for_deck(deck.id, conn)?;
            Ok(Deck { cards, ..deck })
        })
        .collect()
}

fn deck_from_row(row: &Row) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        source_url: row.get(4)?,
        created_at: row.get(5)?,
        cards: Vec::new(),
    })
}

// Card operations

/// Appends a card to the end of a deck and returns its id.
///
/// Both sides must carry text. No review record is created: the card stays
/// "new" for every user until it is first rated.
pub fn add_card(
    deck_id: DeckId,
    front: &str,
    back: &str,
    is_reversible: bool,
    conn: &Connection,
) -> Result<CardId> {
    if front.trim().is_empty() || back.trim().is_empty() {
        return Err(Error::InvalidInput(
            "card front and back must not be empty".to_string(),
        ));
    }

    let deck_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM decks WHERE id = ?1)",
        params![deck_id],
        |row| row.get(0),
    )?;
    if !deck_exists {
        return Err(Error::NotFound(format!("deck {deck_id}")));
    }

    conn.execute(
        "INSERT INTO cards (deck_id, front, back, is_reversible, position)
         VALUES (?1, ?2, ?3, ?4,
                 (SELECT COALESCE(MAX(position) + 1, 0) FROM cards WHERE deck_id = ?1))",
        params![deck_id, front, back, is_reversible],
    )?;
    let card_id = conn.last_insert_rowid();
    debug!(deck_id, card_id, "card added");
    Ok(card_id)
}

pub fn delete_card(card_id: CardId, conn: &Connection) -> Result<()> {
    let deleted = conn.execute("DELETE FROM cards WHERE id = ?1", params![card_id])?;
    if deleted == 0 {
        return Err(Error::NotFound(format!("card {card_id}")));
    }
    Ok(())
}

pub fn get_card(card_id: CardId, conn: &Connection) -> Result<Card> {
    conn.query_row(
        "SELECT id, deck_id, front, back, is_reversible, position FROM cards WHERE id = ?1",
        params![card_id],
        card_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("card {card_id}")))
}

/// Retrieves all cards of a deck in position order
pub fn get_cards_for_deck(deck_id: DeckId, conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        "SELECT id, deck_id, front, back, is_reversible, position
         FROM cards WHERE deck_id = ?1 ORDER BY position, id",
    )?;
    let cards = stmt
        .query_map(params![deck_id], card_from_row)?
        .collect::<rusqlite::Result<Vec<Card>>>()?;
    Ok(cards)
}

/// Retrieves every card in every deck owned by `user_id`
pub fn get_cards_for_user(user_id: &str, conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.deck_id, c.front, c.back, c.is_reversible, c.position
         FROM cards c
         JOIN decks d ON d.id = c.deck_id
         WHERE d.user_id = ?1
         ORDER BY c.deck_id, c.position, c.id",
    )?;
    let cards = stmt
        .query_map(params![user_id], card_from_row)?
        .collect::<rusqlite::Result<Vec<Card>>>()?;
    Ok(cards)
}

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        is_reversible: row.get(4)?,
        position: row.get(5)?,
    })
}

// Review operations

pub fn get_review(
    user_id: &str,
    card_id: CardId,
    conn: &Connection,
) -> Result<Option<ReviewRecord>> {
    let review = conn
        .query_row(
            "SELECT user_id, card_id, ease_factor, interval, repetitions,
                    next_review_date, last_reviewed_at
             FROM reviews WHERE user_id = ?1 AND card_id = ?2",
            params![user_id, card_id],
            review_from_row,
        )
        .optional()?;
    Ok(review)
}

/// Review records of `user_id` for the cards of one deck, keyed by card id
pub fn get_reviews_for_deck(
    user_id: &str,
    deck_id: DeckId,
    conn: &Connection,
) -> Result<HashMap<CardId, ReviewRecord>> {
    let mut stmt = conn.prepare(
        "SELECT r.user_id, r.card_id, r.ease_factor, r.interval, r.repetitions,
                r.next_review_date, r.last_reviewed_at
         FROM reviews r
         JOIN cards c ON c.id = r.card_id
         WHERE r.user_id = ?1 AND c.deck_id = ?2",
    )?;
    collect_reviews(stmt.query_map(params![user_id, deck_id], review_from_row)?)
}

/// Every review record of `user_id`, keyed by card id
pub fn get_reviews_for_user(
    user_id: &str,
    conn: &Connection,
) -> Result<HashMap<CardId, ReviewRecord>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, card_id, ease_factor, interval, repetitions,
                next_review_date, last_reviewed_at
         FROM reviews WHERE user_id = ?1",
    )?;
    collect_reviews(stmt.query_map(params![user_id], review_from_row)?)
}

fn collect_reviews(
    rows: impl Iterator<Item = rusqlite::Result<ReviewRecord>>,
) -> Result<HashMap<CardId, ReviewRecord>> {
    let mut reviews = HashMap::new();
    for review in rows {
        let review = review?;
        reviews.insert(review.card_id, review);
    }
    Ok(reviews)
}

fn review_from_row(row: &Row) -> rusqlite::Result<ReviewRecord> {
    Ok(ReviewRecord {
        user_id: row.get(0)?,
        card_id: row.get(1)?,
        ease_factor: row.get(2)?,
        interval: row.get(3)?,
        repetitions: row.get(4)?,
        next_review_date: row.get(5)?,
        last_reviewed_at: row.get(6)?,
    })
}

/// Builds the study queue for one deck as seen by `user_id`
pub fn get_due_set_for_deck(
    user_id: &str,
    deck_id: DeckId,
    today: NaiveDate,
    conn: &Connection,
) -> Result<DueSet> {
    let deck = get_deck(deck_id, conn)?;
    let reviews = get_reviews_for_deck(user_id, deck_id, conn)?;
    Ok(select_due(&deck.cards, &reviews, today))
}

/// Builds the study queue across every deck owned by `user_id`
pub fn get_due_set_for_user(user_id: &str, today: NaiveDate, conn: &Connection) -> Result<DueSet> {
    let cards = get_cards_for_user(user_id, conn)?;
    let reviews = get_reviews_for_user(user_id, conn)?;
    Ok(select_due(&cards, &reviews, today))
}

/// Applies one rating to the (user, card) record and returns the stored result.
///
/// The first rating seeds the record with the initial state and advances it
/// immediately, so an unrated record is never written. The read and the upsert
/// share one IMMEDIATE transaction, so a concurrent or duplicated submission
/// for the same pair waits instead of overwriting this one.
pub fn submit_rating(
    user_id: &str,
    card_id: CardId,
    rating: Rating,
    now: DateTime<Utc>,
    conn: &mut Connection,
) -> Result<ReviewRecord> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let card = get_card(card_id, &tx)?;
    if !card.is_studyable() {
        return Err(Error::InvalidInput(format!(
            "card {card_id} has an empty side and cannot be rated"
        )));
    }

    let state = get_review(user_id, card_id, &tx)?
        .map(|review| review.state())
        .unwrap_or_else(ReviewState::initial);
    let scheduled = sm2::advance(state, rating, now.date_naive());
    let record = ReviewRecord::from_scheduled(user_id, card_id, scheduled, now);

    tx.execute(
        "INSERT INTO reviews (user_id, card_id, ease_factor, interval, repetitions,
                              next_review_date, last_reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (user_id, card_id) DO UPDATE SET
             ease_factor = excluded.ease_factor,
             interval = excluded.interval,
             repetitions = excluded.repetitions,
             next_review_date = excluded.next_review_date,
             last_reviewed_at = excluded.last_reviewed_at",
        params![
            record.user_id,
            record.card_id,
            record.ease_factor,
            record.interval,
            record.repetitions,
            record.next_review_date,
            record.last_reviewed_at,
        ],
    )?;
    tx.commit()?;

    debug!(
        user_id,
        card_id,
        rating = rating.value(),
        interval = record.interval,
        next_review_date = %record.next_review_date,
        "review recorded"
    );
    Ok(record)
}

/// A submission that could not be stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    /// Position in the submitted batch.
    pub index: usize,
    pub card_id: Option<CardId>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub saved: Vec<ReviewRecord>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stores a whole session's ratings.
///
/// Each entry is validated and persisted on its own; a failing entry is
/// reported and the others are still stored. Nothing is rolled back.
pub fn submit_batch(
    user_id: &str,
    submissions: &[RatingSubmission],
    now: DateTime<Utc>,
    conn: &mut Connection,
) -> BatchReport {
    let mut report = BatchReport::default();

    for (index, submission) in submissions.iter().enumerate() {
        let outcome = submission
            .validate()
            .and_then(|(card_id, rating)| submit_rating(user_id, card_id, rating, now, conn));

        match outcome {
            Ok(record) => report.saved.push(record),
            Err(e) => {
                warn!(index, card_id = ?submission.card_id, "rating not stored: {}", e);
                report.failed.push(BatchFailure {
                    index,
                    card_id: submission.card_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        saved = report.saved.len(),
        failed = report.failed.len(),
        "batch submitted"
    );
    report
}
