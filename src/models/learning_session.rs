//! Study session over a due set.
//! Presents cards one at a time and buffers the scheduler's output for each rating.
//! Nothing is persisted here; the caller submits the buffered ratings.

use super::{CardId, DueSet, Rating, ScheduledReview, StudyCard, sm2};
use chrono::NaiveDate;
use serde::Serialize;

/// One rating given during the session, with the schedule it produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub card_id: CardId,
    pub rating: Rating,
    pub scheduled: ScheduledReview,
}

/// Each card in the queue is rated exactly once, in queue order.
pub struct StudySession {
    cards: Vec<StudyCard>,
    results: Vec<SessionResult>,
    pub show_back: bool,
}

impl StudySession {
    pub fn new(due_set: DueSet) -> Self {
        Self {
            cards: due_set.cards,
            results: Vec::new(),
            show_back: false,
        }
    }

    pub fn current_card(&self) -> Option<&StudyCard> {
        self.cards.get(self.results.len())
    }

    pub fn flip(&mut self) {
        self.show_back = !self.show_back;
    }

    /// Rates the current card and moves to the next one.
    /// Returns `None` once every card has been rated.
    pub fn grade_current_card(
        &mut self,
        rating: Rating,
        today: NaiveDate,
    ) -> Option<&SessionResult> {
        let card = self.current_card()?;
        let scheduled = sm2::advance(card.review_state(), rating, today);
        let card_id = card.card.id;

        self.results.push(SessionResult {
            card_id,
            rating,
            scheduled,
        });
        self.show_back = false;
        self.results.last()
    }

    /// Results in the order the ratings were given.
    pub fn results(&self) -> &[SessionResult] {
        &self.results
    }

    pub fn total_count(&self) -> usize {
        self.cards.len()
    }

    pub fn reviewed_count(&self) -> usize {
        self.results.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.reviewed_count()
    }

    pub fn correct_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.rating.is_success())
            .count()
    }

    /// Share of ratings that were Good or Easy; 0.0 before any rating.
    pub fn accuracy(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            self.correct_count() as f64 / self.results.len() as f64
        }
    }

    pub fn is_completed(&self) -> bool {
        self.results.len() == self.cards.len()
    }

    pub fn phase_message(&self) -> String {
        if self.is_completed() {
            format!(
                "Session complete: {} cards, {:.0}% correct",
                self.total_count(),
                self.accuracy() * 100.0
            )
        } else {
            format!(
                "Card {} of {}",
                self.reviewed_count() + 1,
                self.total_count()
            )
        }
    }

    /// Ratings to hand to the persistence layer, in submission order.
    pub fn into_submissions(self) -> Vec<(CardId, Rating)> {
        self.results
            .into_iter()
            .map(|r| (r.card_id, r.rating))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Card, ReviewRecord, select_due};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn card(id: CardId, position: i64) -> Card {
        Card {
            id,
            deck_id: 1,
            front: "term".to_string(),
            back: "definition".to_string(),
            is_reversible: false,
            position,
        }
    }

    fn session() -> StudySession {
        let today = date(2024, 1, 10);
        let cards = vec![card(1, 0), card(2, 1), card(3, 2)];
        let reviews = HashMap::from([(
            3,
            ReviewRecord {
                user_id: "user".to_string(),
                card_id: 3,
                ease_factor: 2.5,
                interval: 6,
                repetitions: 2,
                next_review_date: today,
                last_reviewed_at: Utc.with_ymd_and_hms(2024, 1, 4, 8, 0, 0).unwrap(),
            },
        )]);
        StudySession::new(select_due(&cards, &reviews, today))
    }

    #[test]
    fn test_session_walks_queue_in_order() {
        let today = date(2024, 1, 10);
        let mut session = session();
        assert_eq!(session.total_count(), 3);
        assert_eq!(session.current_card().map(|c| c.card.id), Some(1));

        session.grade_current_card(Rating::Good, today);
        assert_eq!(session.current_card().map(|c| c.card.id), Some(2));

        session.grade_current_card(Rating::Again, today);
        let last = session.grade_current_card(Rating::Good, today).unwrap();
        // reviewed card continues from its stored state: round(6 * 2.5)
        assert_eq!(last.scheduled.state.interval, 15);

        assert!(session.is_completed());
        assert!(session.current_card().is_none());
        assert!(session.grade_current_card(Rating::Easy, today).is_none());
        assert_eq!(session.reviewed_count(), 3);
    }

    #[test]
    fn test_new_card_starts_from_initial_state() {
        let today = date(2024, 1, 10);
        let mut session = session();
        let result = session.grade_current_card(Rating::Easy, today).unwrap();
        assert_eq!(result.scheduled.state.repetitions, 1);
        assert_eq!(result.scheduled.state.interval, 1);
        assert_eq!(result.scheduled.next_review_date, date(2024, 1, 11));
    }

    #[test]
    fn test_accuracy_and_submission_order() {
        let today = date(2024, 1, 10);
        let mut session = session();
        assert_eq!(session.accuracy(), 0.0);

        session.grade_current_card(Rating::Easy, today);
        session.grade_current_card(Rating::Hard, today);
        session.grade_current_card(Rating::Good, today);

        assert_eq!(session.correct_count(), 2);
        assert!((session.accuracy() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            session.into_submissions(),
            vec![(1, Rating::Easy), (2, Rating::Hard), (3, Rating::Good)]
        );
    }

    #[test]
    fn test_flip_resets_on_next_card() {
        let today = date(2024, 1, 10);
        let mut session = session();
        session.flip();
        assert!(session.show_back);
        session.grade_current_card(Rating::Good, today);
        assert!(!session.show_back);
        assert_eq!(session.remaining_count(), 2);
        assert_eq!(session.phase_message(), "Card 2 of 3");
    }

    #[test]
    fn test_stored_repetition_count_at_limit() {
        let today = date(2024, 1, 10);
        let cards = vec![card(1, 0)];
        let reviews = HashMap::from([(
            1,
            ReviewRecord {
                user_id: "user".to_string(),
                card_id: 1,
                ease_factor: 2.5,
                interval: 4,
                repetitions: u32::MAX,
                next_review_date: today,
                last_reviewed_at: Utc.with_ymd_and_hms(2024, 1, 6, 8, 0, 0).unwrap(),
            },
        )]);
        let mut session = StudySession::new(select_due(&cards, &reviews, today));

        let result = session.grade_current_card(Rating::Easy, today).unwrap();
        assert_eq!(result.scheduled.state.repetitions, u32::MAX);
        assert_eq!(result.scheduled.state.interval, 10);
    }

    #[test]
    fn test_empty_session_is_complete() {
        let session = StudySession::new(DueSet::default());
        assert!(session.is_completed());
        assert!(session.current_card().is_none());
    }
}
