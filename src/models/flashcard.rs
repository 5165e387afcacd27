//! Card is a <front, back> pair living in one deck. Review state is kept per user elsewhere.
use super::{CardId, DeckId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    pub is_reversible: bool,
    /// Stable deck-relative order; used as the tie-break when building study queues.
    pub position: i64,
}

impl Card {
    /// A card can only be studied once both sides carry text.
    pub fn is_studyable(&self) -> bool {
        !self.front.trim().is_empty() && !self.back.trim().is_empty()
    }
}
