//! Per-user review state for a single card.
use super::CardId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// The values the scheduler reads and rewrites on every rating.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
}

impl ReviewState {
    /// Pre-state of a card that has never been rated. Never persisted as-is.
    pub fn initial() -> Self {
        Self {
            ease_factor: INITIAL_EASE_FACTOR,
            interval: 0,
            repetitions: 0,
        }
    }
}

impl Default for ReviewState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Scheduler output: the next state plus the day the card comes due.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReview {
    #[serde(flatten)]
    pub state: ReviewState,
    pub next_review_date: NaiveDate,
}

/// Stored review record, keyed by (user_id, card_id).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub user_id: String,
    pub card_id: CardId,
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    pub next_review_date: NaiveDate,
    pub last_reviewed_at: DateTime<Utc>,
}

impl ReviewRecord {
    pub fn state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.ease_factor,
            interval: self.interval,
            repetitions: self.repetitions,
        }
    }

    /// Builds the record that results from applying `scheduled` at `reviewed_at`.
    pub fn from_scheduled(
        user_id: &str,
        card_id: CardId,
        scheduled: ScheduledReview,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            card_id,
            ease_factor: scheduled.state.ease_factor,
            interval: scheduled.state.interval,
            repetitions: scheduled.state.repetitions,
            next_review_date: scheduled.next_review_date,
            last_reviewed_at: reviewed_at,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        super::sm2::is_due(self.next_review_date, today)
    }
}
