pub mod deck;
pub mod due_set;
pub mod flashcard;
pub mod learning_card;
pub mod learning_session;
pub mod rating;
pub mod review_data;
pub mod sm2;
pub mod submission;

pub type CardId = i64;
pub type DeckId = i64;

pub use deck::Deck;
pub use due_set::{DueSet, DueStats, select_due};
pub use flashcard::Card;
pub use learning_card::StudyCard;
pub use learning_session::{SessionResult, StudySession};
pub use rating::Rating;
pub use review_data::{ReviewRecord, ReviewState, ScheduledReview};
pub use submission::RatingSubmission;
