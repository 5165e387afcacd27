//! A card queued for study together with the user's review record, if any.
use super::{Card, ReviewRecord, ReviewState};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyCard {
    pub card: Card,
    pub review: Option<ReviewRecord>,
}

impl StudyCard {
    pub fn new(card: Card, review: Option<ReviewRecord>) -> Self {
        Self { card, review }
    }

    /// Never rated by this user.
    pub fn is_new(&self) -> bool {
        self.review.is_none()
    }

    /// State the scheduler starts from for this card's next rating.
    pub fn review_state(&self) -> ReviewState {
        self.review
            .as_ref()
            .map(ReviewRecord::state)
            .unwrap_or_else(ReviewState::initial)
    }
}
