//! Selection of the cards to study today.
//!
//! New cards (no review record) are always eligible. Reviewed cards are eligible
//! once due, and stay eligible however overdue they are. New cards come first,
//! then due cards; each group is ordered by position.

use super::{Card, CardId, ReviewRecord, StudyCard};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueStats {
    pub total: usize,
    pub due: usize,
    pub new: usize,
    pub to_study: usize,
}

/// Ordered study queue plus the counts it was built from.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueSet {
    pub cards: Vec<StudyCard>,
    pub stats: DueStats,
}

impl DueSet {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn card_ids(&self) -> Vec<CardId> {
        self.cards.iter().map(|c| c.card.id).collect()
    }
}

/// Builds today's study queue. Inputs are left untouched.
pub fn select_due(
    cards: &[Card],
    reviews_by_card_id: &HashMap<CardId, ReviewRecord>,
    today: NaiveDate,
) -> DueSet {
    let mut new_cards = Vec::new();
    let mut due_cards = Vec::new();

    for card in cards {
        match reviews_by_card_id.get(&card.id) {
            None => new_cards.push(StudyCard::new(card.clone(), None)),
            Some(review) if review.is_due(today) => {
                due_cards.push(StudyCard::new(card.clone(), Some(review.clone())))
            }
            Some(_) => {}
        }
    }

    new_cards.sort_by_key(queue_key);
    due_cards.sort_by_key(queue_key);

    let stats = DueStats {
        total: cards.len(),
        due: due_cards.len(),
        new: new_cards.len(),
        to_study: new_cards.len() + due_cards.len(),
    };

    new_cards.extend(due_cards);

    DueSet {
        cards: new_cards,
        stats,
    }
}

// Card id breaks position ties across decks.
fn queue_key(card: &StudyCard) -> (i64, CardId) {
    (card.card.position, card.card.id)
}
