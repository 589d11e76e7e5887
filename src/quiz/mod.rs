//! Quizzes over flashcard decks
//!
//! A quiz is one pass over a deck: the user submits an answer per card, the
//! answers are graded against the cards' stored answers, and the scored
//! result is kept for history.

pub mod grading;
pub mod models;
pub mod storage;

pub use grading::{grade, Grade, GradingError};
pub use models::*;
pub use storage::{QuizStorage, QuizStorageError};
