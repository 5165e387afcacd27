//! JSON import/export for deck content.
//! Decks are exported without ids or review state. Generated card lists use the
//! `{front, back, reversible}` shape produced by the content generator.

use crate::database::db;
use crate::error::{Error, Result};
use crate::models::{Deck, DeckId};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Card content as produced by external ingestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub reversible: bool,
}

/// On-disk form of a deck.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckFile {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    pub cards: Vec<GeneratedCard>,
}

impl From<&Deck> for DeckFile {
    fn from(deck: &Deck) -> Self {
        Self {
            title: deck.title.clone(),
            description: deck.description.clone(),
            source_url: deck.source_url.clone(),
            cards: deck
                .cards
                .iter()
                .map(|card| GeneratedCard {
                    front: card.front.clone(),
                    back: card.back.clone(),
                    reversible: card.is_reversible,
                })
                .collect(),
        }
    }
}

/// Exports a deck to a JSON file at the specified path.
pub fn export_json_to_path(deck: &Deck, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(&DeckFile::from(deck))?;
    fs::write(path, json_string)?;
    info!(deck_id = deck.id, path = %path.display(), "deck exported");
    Ok(())
}

/// Imports a deck file. Every card must have text on both sides.
pub fn import_json(path: &Path) -> Result<DeckFile> {
    let contents = fs::read_to_string(path)?;
    let deck: DeckFile = serde_json::from_str(&contents)?;
    validate_cards(&deck.cards)?;
    Ok(deck)
}

/// Extracts the card array from generator output.
///
/// The generator is asked for a bare JSON array but may wrap it in prose, so
/// everything between the first `[` and the last `]` is parsed.
pub fn parse_generated_cards(text: &str) -> Result<Vec<GeneratedCard>> {
    let array = match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            return Err(Error::InvalidInput(
                "no card array found in generated content".to_string(),
            ));
        }
    };
    let cards: Vec<GeneratedCard> = serde_json::from_str(array)?;
    validate_cards(&cards)?;
    Ok(cards)
}

pub fn import_generated_cards(path: &Path) -> Result<Vec<GeneratedCard>> {
    parse_generated_cards(&fs::read_to_string(path)?)
}

fn validate_cards(cards: &[GeneratedCard]) -> Result<()> {
    match cards
        .iter()
        .position(|c| c.front.trim().is_empty() || c.back.trim().is_empty())
    {
        Some(index) => Err(Error::InvalidInput(format!(
            "card {index} has an empty front or back"
        ))),
        None => Ok(()),
    }
}

/// Stores a deck file as a new deck owned by `user_id`; cards keep their file order.
/// Either the deck and all of its cards are stored, or nothing is.
pub fn store_deck(user_id: &str, deck: &DeckFile, conn: &Connection) -> Result<DeckId> {
    let tx = conn.unchecked_transaction()?;
    let deck_id = db::new_deck(
        user_id,
        &deck.title,
        deck.description.as_deref(),
        deck.source_url.as_deref(),
        &tx,
    )?;
    insert_cards(deck_id, &deck.cards, &tx)?;
    tx.commit()?;
    info!(deck_id, cards = deck.cards.len(), "deck imported");
    Ok(deck_id)
}

/// Appends generated cards to an existing deck, all or none.
pub fn add_generated_cards(
    deck_id: DeckId,
    cards: &[GeneratedCard],
    conn: &Connection,
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    insert_cards(deck_id, cards, &tx)?;
    tx.commit()?;
    Ok(())
}

fn insert_cards(deck_id: DeckId, cards: &[GeneratedCard], conn: &Connection) -> Result<()> {
    for card in cards {
        db::add_card(deck_id, &card.front, &card.back, card.reversible, conn)?;
    }
    Ok(())
}
