//! Flashcard and spaced repetition system
//!
//! This module provides:
//! - Deck management (per-user flashcard collections)
//! - Flashcard CRUD
//! - SM-2 spaced repetition algorithm
//! - Review state tracking

pub mod algorithm;
pub mod models;
pub mod storage;

pub use models::*;
pub use storage::{FlashcardStorage, FlashcardStorageError};
