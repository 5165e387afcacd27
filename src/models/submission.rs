//! Rating submission as received from a client, validated before anything is scheduled.
use super::{CardId, Rating};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    pub card_id: Option<CardId>,
    pub rating: Option<i64>,
}

impl RatingSubmission {
    pub fn new(card_id: CardId, rating: Rating) -> Self {
        Self {
            card_id: Some(card_id),
            rating: Some(i64::from(rating.value())),
        }
    }

    pub fn validate(&self) -> Result<(CardId, Rating)> {
        let (Some(card_id), Some(rating)) = (self.card_id, self.rating) else {
            return Err(Error::InvalidInput(
                "cardId and rating are required".to_string(),
            ));
        };
        Ok((card_id, Rating::try_from(rating)?))
    }
}
