//! SM-2 (SuperMemo 2) spaced repetition scheduler.
//!
//! Ratings use a four-step scale (Again/Hard/Good/Easy = 0..=3) that is shifted
//! onto positions 2..=5 of the classic SM-2 quality scale for the ease update:
//! - Again/Hard: lapse, repetitions reset and the card comes back tomorrow
//! - Good/Easy: interval grows 1 day → 6 days → previous interval × EF
//! - EF is recomputed after every rating, lapses included, and never drops below 1.3
//!
//! Everything here is a pure function of its arguments. "Today" is always passed in.

use super::review_data::{MIN_EASE_FACTOR, ReviewState, ScheduledReview};
use super::Rating;
use chrono::{Days, NaiveDate};

/// Applies one rating to `state` and schedules the next review relative to `today`.
pub fn advance(state: ReviewState, rating: Rating, today: NaiveDate) -> ScheduledReview {
    let (interval, repetitions) = if rating.is_success() {
        let interval = match state.repetitions {
            0 => 1,
            1 => 6,
            // f64::round rounds half away from zero: 12.5 becomes 13.
            _ => (f64::from(state.interval) * state.ease_factor).round() as u32,
        };
        (interval.max(1), state.repetitions.saturating_add(1))
    } else {
        (1, 0)
    };

    let ease_factor = next_ease_factor(state.ease_factor, rating);

    ScheduledReview {
        state: ReviewState {
            ease_factor,
            interval,
            repetitions,
        },
        next_review_date: add_days(today, interval),
    }
}

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3.
fn next_ease_factor(ease_factor: f64, rating: Rating) -> f64 {
    let distance = 5.0 - f64::from(rating.quality());
    let ease_factor = ease_factor + (0.1 - distance * (0.08 + distance * 0.02));
    ease_factor.max(MIN_EASE_FACTOR)
}

/// Calendar-day addition, saturating at the last representable date.
fn add_days(today: NaiveDate, interval: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(interval)))
        .unwrap_or(NaiveDate::MAX)
}

/// A reviewed card is due once its next review date is today or earlier.
pub fn is_due(next_review_date: NaiveDate, today: NaiveDate) -> bool {
    next_review_date <= today
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state(ease_factor: f64, interval: u32, repetitions: u32) -> ReviewState {
        ReviewState {
            ease_factor,
            interval,
            repetitions,
        }
    }

    #[test]
    fn test_first_review_easy() {
        let next = advance(ReviewState::initial(), Rating::Easy, date(2024, 1, 1));
        assert_eq!(next.state.repetitions, 1);
        assert_eq!(next.state.interval, 1);
        assert_eq!(next.next_review_date, date(2024, 1, 2));
        assert!((next.state.ease_factor - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_first_review_good_keeps_ease() {
        let next = advance(ReviewState::initial(), Rating::Good, date(2024, 1, 1));
        assert_eq!(next.state.interval, 1);
        assert_eq!(next.state.repetitions, 1);
        assert!((next.state.ease_factor - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_second_review() {
        let next = advance(state(2.5, 1, 1), Rating::Good, date(2024, 1, 2));
        assert_eq!(next.state.interval, 6);
        assert_eq!(next.state.repetitions, 2);
        assert_eq!(next.next_review_date, date(2024, 1, 8));
    }

    #[test]
    fn test_third_review_multiplies_by_ease() {
        let next = advance(state(2.5, 6, 2), Rating::Good, date(2024, 1, 8));
        assert_eq!(next.state.interval, 15);
        assert_eq!(next.state.repetitions, 3);
        assert_eq!(next.next_review_date, date(2024, 1, 23));
    }

    #[test]
    fn test_again_resets() {
        let next = advance(state(2.6, 1, 1), Rating::Again, date(2024, 1, 2));
        assert_eq!(next.state.repetitions, 0);
        assert_eq!(next.state.interval, 1);
        // q = 2: 2.6 + (0.1 - 3 * (0.08 + 3 * 0.02)) = 2.28
        assert!((next.state.ease_factor - 2.28).abs() < 1e-9);
        assert_eq!(next.next_review_date, date(2024, 1, 3));
    }

    #[test]
    fn test_hard_is_a_lapse() {
        let next = advance(state(2.5, 40, 7), Rating::Hard, date(2024, 3, 1));
        assert_eq!(next.state.repetitions, 0);
        assert_eq!(next.state.interval, 1);
        assert!((next.state.ease_factor - 2.36).abs() < 1e-9);
    }

    #[test]
    fn test_rounding_half_goes_up() {
        // 5 * 2.5 = 12.5 exactly
        let next = advance(state(2.5, 5, 2), Rating::Good, date(2024, 1, 1));
        assert_eq!(next.state.interval, 13);
    }

    #[test]
    fn test_ef_floor() {
        let next = advance(state(1.3, 1, 1), Rating::Again, date(2024, 1, 1));
        assert_eq!(next.state.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_inconsistent_state_still_yields_positive_interval() {
        let next = advance(state(2.5, 0, 3), Rating::Good, date(2024, 1, 1));
        assert_eq!(next.state.interval, 1);
    }

    #[test]
    fn test_far_future_saturates() {
        let next = advance(state(2.5, u32::MAX / 4, 9), Rating::Easy, NaiveDate::MAX);
        assert_eq!(next.next_review_date, NaiveDate::MAX);
    }

    #[test]
    fn test_repetitions_saturate() {
        let next = advance(state(2.5, 10, u32::MAX), Rating::Good, date(2024, 1, 1));
        assert_eq!(next.state.repetitions, u32::MAX);
        assert_eq!(next.state.interval, 25);
    }

    #[test]
    fn test_due_boundary_is_inclusive() {
        let today = date(2024, 5, 10);
        assert!(is_due(today, today));
        assert!(is_due(date(2024, 5, 1), today));
        assert!(!is_due(date(2024, 5, 11), today));
    }

    fn any_rating() -> impl Strategy<Value = Rating> {
        prop::sample::select(Rating::ALL.to_vec())
    }

    fn any_state() -> impl Strategy<Value = ReviewState> {
        (1.3f64..4.0, 0u32..400, 0u32..30).prop_map(|(e, i, r)| state(e, i, r))
    }

    proptest! {
        #[test]
        fn prop_ease_never_below_floor(s in any_state(), rating in any_rating()) {
            let next = advance(s, rating, date(2024, 1, 1));
            prop_assert!(next.state.ease_factor >= MIN_EASE_FACTOR);
        }

        #[test]
        fn prop_failure_resets(s in any_state(), rating in any_rating()) {
            let next = advance(s, rating, date(2024, 1, 1));
            if !rating.is_success() {
                prop_assert_eq!(next.state.repetitions, 0);
                prop_assert_eq!(next.state.interval, 1);
            } else {
                prop_assert_eq!(next.state.repetitions, s.repetitions + 1);
            }
        }

        #[test]
        fn prop_next_date_is_today_plus_interval(s in any_state(), rating in any_rating()) {
            let today = date(2024, 2, 28);
            let next = advance(s, rating, today);
            prop_assert!(next.state.interval >= 1);
            prop_assert_eq!(
                next.next_review_date,
                today + chrono::Duration::days(i64::from(next.state.interval))
            );
        }

        #[test]
        fn prop_advance_is_pure(s in any_state(), rating in any_rating()) {
            let today = date(2024, 1, 1);
            prop_assert_eq!(advance(s, rating, today), advance(s, rating, today));
        }
    }
}
