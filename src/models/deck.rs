//! Deck is an owned, ordered set of cards
use super::{Card, DeckId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: DeckId,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Where the content was ingested from, if anywhere.
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Ordered by position.
    pub cards: Vec<Card>,
}
