//! Flashcard decks, quiz grading and spaced repetition behind a JSON REST API.
//!
//! Data lives in plain JSON files, one directory per user:
//!
//! ```text
//! {data_dir}/users/{user-id}/
//! ├── flashcards/        # decks, cards and review state
//! └── quiz_results/      # one file per graded quiz
//! ```

pub mod config;
pub mod error;
pub mod flashcards;
pub mod quiz;
pub mod server;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use server::{create_router, AppState};
