//! Storage operations for flashcards
//!
//! Directory structure per user:
//! ```text
//! users/{user-id}/flashcards/
//! ├── decks.json           # Array of all decks
//! ├── cards/
//! │   └── {card-id}.json   # Individual card files
//! └── states/
//!     └── {card-id}.json   # Card spaced repetition state
//! ```

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use super::algorithm::{
    calculate_next_review, quiz_outcome_quality, ui_rating_to_quality, ReviewResult,
    PASSING_QUALITY,
};
use super::models::*;

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

/// Storage manager for flashcard operations
pub struct FlashcardStorage {
    /// Base path holding one directory per user
    users_path: PathBuf,
}

impl FlashcardStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            users_path: data_dir.join("users"),
        }
    }

    fn flashcards_dir(&self, user_id: Uuid) -> PathBuf {
        self.users_path.join(user_id.to_string()).join("flashcards")
    }

    fn cards_dir(&self, user_id: Uuid) -> PathBuf {
        self.flashcards_dir(user_id).join("cards")
    }

    fn states_dir(&self, user_id: Uuid) -> PathBuf {
        self.flashcards_dir(user_id).join("states")
    }

    fn decks_path(&self, user_id: Uuid) -> PathBuf {
        self.flashcards_dir(user_id).join("decks.json")
    }

    fn card_path(&self, user_id: Uuid, card_id: Uuid) -> PathBuf {
        self.cards_dir(user_id).join(format!("{}.json", card_id))
    }

    fn state_path(&self, user_id: Uuid, card_id: Uuid) -> PathBuf {
        self.states_dir(user_id).join(format!("{}.json", card_id))
    }

    /// Initialize flashcard storage for a user
    pub fn init(&self, user_id: Uuid) -> Result<()> {
        fs::create_dir_all(self.cards_dir(user_id))?;
        fs::create_dir_all(self.states_dir(user_id))?;

        let decks_path = self.decks_path(user_id);
        if !decks_path.exists() {
            self.write_decks(user_id, &[])?;
        }

        Ok(())
    }

    fn write_decks(&self, user_id: Uuid, decks: &[Deck]) -> Result<()> {
        fs::write(self.decks_path(user_id), serde_json::to_string_pretty(decks)?)?;
        Ok(())
    }

    // ==================== Deck Operations ====================

    /// List all decks owned by a user
    pub fn list_decks(&self, user_id: Uuid) -> Result<Vec<Deck>> {
        let decks_path = self.decks_path(user_id);
        if !decks_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&decks_path)?;
        let decks: Vec<Deck> = serde_json::from_str(&content)?;
        Ok(decks)
    }

    pub fn get_deck(&self, user_id: Uuid, deck_id: Uuid) -> Result<Deck> {
        self.list_decks(user_id)?
            .into_iter()
            .find(|d| d.id == deck_id)
            .ok_or(FlashcardStorageError::DeckNotFound(deck_id))
    }

    pub fn create_deck(&self, user_id: Uuid, request: CreateDeckRequest) -> Result<Deck> {
        let name = required("deck name", request.name)?;
        self.init(user_id)?;

        let mut deck = Deck::new(user_id, name);
        deck.description = request.description;
        deck.color = request.color;

        let mut decks = self.list_decks(user_id)?;
        decks.push(deck.clone());
        self.write_decks(user_id, &decks)?;

        log::debug!("Created deck {} for user {}", deck.id, user_id);
        Ok(deck)
    }

    /// Apply a partial update to a deck and return the stored result
    pub fn update_deck(
        &self,
        user_id: Uuid,
        deck_id: Uuid,
        mut update: UpdateDeckRequest,
    ) -> Result<Deck> {
        if let Some(name) = update.name.take() {
            update.name = Some(required("deck name", name)?);
        }
        if let Some(limit) = update.new_cards_per_day {
            non_negative("newCardsPerDay", limit)?;
        }
        if let Some(limit) = update.reviews_per_day {
            non_negative("reviewsPerDay", limit)?;
        }

        let mut deck = self.get_deck(user_id, deck_id)?;
        deck.apply(update);
        self.save_deck(user_id, &deck)?;
        Ok(deck)
    }

    fn save_deck(&self, user_id: Uuid, deck: &Deck) -> Result<()> {
        let mut decks = self.list_decks(user_id)?;
        let pos = decks
            .iter()
            .position(|d| d.id == deck.id)
            .ok_or(FlashcardStorageError::DeckNotFound(deck.id))?;

        decks[pos] = deck.clone();
        self.write_decks(user_id, &decks)
    }

    /// Delete a deck and all its cards
    pub fn delete_deck(&self, user_id: Uuid, deck_id: Uuid) -> Result<()> {
        // Existence check first so deleting an unknown deck is reported
        self.get_deck(user_id, deck_id)?;

        for card in self.list_cards(user_id, deck_id)? {
            self.remove_card_files(user_id, card.id)?;
        }

        let mut decks = self.list_decks(user_id)?;
        decks.retain(|d| d.id != deck_id);
        self.write_decks(user_id, &decks)?;

        log::debug!("Deleted deck {} for user {}", deck_id, user_id);
        Ok(())
    }

    fn update_deck_card_count(&self, user_id: Uuid, deck_id: Uuid) -> Result<()> {
        let cards = self.list_cards(user_id, deck_id)?;
        let mut deck = self.get_deck(user_id, deck_id)?;
        deck.card_count = cards.len();
        deck.updated_at = Utc::now();
        self.save_deck(user_id, &deck)
    }

    // ==================== Card Operations ====================

    /// List all cards in a deck, ordered by position
    pub fn list_cards(&self, user_id: Uuid, deck_id: Uuid) -> Result<Vec<Flashcard>> {
        let mut cards: Vec<Flashcard> = self
            .list_all_cards(user_id)?
            .into_iter()
            .filter(|card| card.deck_id == deck_id)
            .collect();

        cards.sort_by(|a, b| a.position.cmp(&b.position).then(a.created_at.cmp(&b.created_at)));
        Ok(cards)
    }

    /// List all cards owned by a user (across all decks)
    pub fn list_all_cards(&self, user_id: Uuid) -> Result<Vec<Flashcard>> {
        let cards_dir = self.cards_dir(user_id);
        if !cards_dir.exists() {
            return Ok(Vec::new());
        }

        let mut cards = Vec::new();
        for entry in fs::read_dir(&cards_dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                cards.push(serde_json::from_str(&content)?);
            }
        }

        Ok(cards)
    }

    pub fn get_card(&self, user_id: Uuid, card_id: Uuid) -> Result<Flashcard> {
        let card_path = self.card_path(user_id, card_id);
        if !card_path.exists() {
            return Err(FlashcardStorageError::CardNotFound(card_id));
        }

        let content = fs::read_to_string(&card_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Create a new card at the end of a deck
    pub fn create_card(
        &self,
        user_id: Uuid,
        deck_id: Uuid,
        request: CreateCardRequest,
    ) -> Result<Flashcard> {
        let front = required("question", request.front)?;
        let back = required("answer", request.back)?;
        self.get_deck(user_id, deck_id)?;

        let position = self.list_cards(user_id, deck_id)?.len() as i32;

        let mut card = Flashcard::new(deck_id, front, back);
        card.position = position;
        card.tags = clean_tags(request.tags);

        self.write_card(user_id, &card)?;
        self.update_card_state(user_id, &CardState::new(card.id))?;
        self.update_deck_card_count(user_id, deck_id)?;

        Ok(card)
    }

    pub fn update_card(
        &self,
        user_id: Uuid,
        card_id: Uuid,
        mut update: UpdateCardRequest,
    ) -> Result<Flashcard> {
        if let Some(front) = update.front.take() {
            update.front = Some(required("question", front)?);
        }
        if let Some(back) = update.back.take() {
            update.back = Some(required("answer", back)?);
        }
        if let Some(tags) = update.tags.take() {
            update.tags = Some(clean_tags(tags));
        }

        let mut card = self.get_card(user_id, card_id)?;
        card.apply(update);
        self.write_card(user_id, &card)?;
        Ok(card)
    }

    fn write_card(&self, user_id: Uuid, card: &Flashcard) -> Result<()> {
        fs::write(
            self.card_path(user_id, card.id),
            serde_json::to_string_pretty(card)?,
        )?;
        Ok(())
    }

    /// Delete a card and its state
    pub fn delete_card(&self, user_id: Uuid, card_id: Uuid) -> Result<()> {
        let card = self.get_card(user_id, card_id)?;
        self.remove_card_files(user_id, card_id)?;
        self.update_deck_card_count(user_id, card.deck_id)
    }

    fn remove_card_files(&self, user_id: Uuid, card_id: Uuid) -> Result<()> {
        for path in [self.card_path(user_id, card_id), self.state_path(user_id, card_id)] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    // ==================== State Operations ====================

    /// Get the state for a card, falling back to a fresh state
    pub fn get_card_state(&self, user_id: Uuid, card_id: Uuid) -> Result<CardState> {
        let state_path = self.state_path(user_id, card_id);
        if !state_path.exists() {
            return Ok(CardState::new(card_id));
        }

        let content = fs::read_to_string(&state_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn update_card_state(&self, user_id: Uuid, state: &CardState) -> Result<()> {
        fs::create_dir_all(self.states_dir(user_id))?;
        fs::write(
            self.state_path(user_id, state.card_id),
            serde_json::to_string_pretty(state)?,
        )?;
        Ok(())
    }

    // ==================== Review Operations ====================

    fn cards_in_scope(&self, user_id: Uuid, deck_id: Option<Uuid>) -> Result<Vec<Flashcard>> {
        match deck_id {
            Some(did) => {
                self.get_deck(user_id, did)?;
                self.list_cards(user_id, did)
            }
            None => self.list_all_cards(user_id),
        }
    }

    /// Get all due cards (optionally filtered by deck), oldest due first
    pub fn get_due_cards(&self, user_id: Uuid, deck_id: Option<Uuid>) -> Result<Vec<CardWithState>> {
        let now = Utc::now();
        let mut due_cards = Vec::new();

        for card in self.cards_in_scope(user_id, deck_id)? {
            let state = self.get_card_state(user_id, card.id)?;
            if state.due_date <= now {
                due_cards.push(CardWithState { card, state });
            }
        }

        due_cards.sort_by(|a, b| a.state.due_date.cmp(&b.state.due_date));
        Ok(due_cards)
    }

    /// Submit a UI rating (1-4) for a card
    pub fn submit_review(&self, user_id: Uuid, card_id: Uuid, rating: i32) -> Result<CardState> {
        let quality = ui_rating_to_quality(rating).ok_or_else(|| {
            FlashcardStorageError::Validation(format!("rating must be between 1 and 4, got {}", rating))
        })?;

        self.get_card(user_id, card_id)?;
        self.record_review(user_id, card_id, quality)
    }

    fn record_review(&self, user_id: Uuid, card_id: Uuid, quality: i32) -> Result<CardState> {
        let mut state = self.get_card_state(user_id, card_id)?;

        let ReviewResult {
            interval,
            ease_factor,
            due_date,
            status,
        } = calculate_next_review(&state, quality, Utc::now());

        state.interval = interval;
        state.ease_factor = ease_factor;
        state.due_date = due_date;
        state.status = status;
        state.review_count += 1;
        if quality >= PASSING_QUALITY {
            state.correct_count += 1;
        }

        self.update_card_state(user_id, &state)?;
        Ok(state)
    }

    /// Feed a graded quiz back into the review schedule.
    ///
    /// Every card in `correct` is recorded as a successful recall and every
    /// card in `missed` as a lapse.
    pub fn apply_quiz_outcome(
        &self,
        user_id: Uuid,
        correct: &[Uuid],
        missed: &[Uuid],
    ) -> Result<Vec<CardState>> {
        let outcomes = correct
            .iter()
            .map(|id| (*id, true))
            .chain(missed.iter().map(|id| (*id, false)));

        let mut states = Vec::with_capacity(correct.len() + missed.len());
        for (card_id, was_correct) in outcomes {
            states.push(self.record_review(user_id, card_id, quiz_outcome_quality(was_correct))?);
        }
        Ok(states)
    }

    /// Get review statistics (optionally filtered by deck)
    pub fn get_review_stats(&self, user_id: Uuid, deck_id: Option<Uuid>) -> Result<ReviewStats> {
        let cards = self.cards_in_scope(user_id, deck_id)?;

        let mut stats = ReviewStats {
            total_cards: cards.len(),
            ..ReviewStats::default()
        };

        for card in &cards {
            let state = self.get_card_state(user_id, card.id)?;

            match state.status {
                CardStatus::New => stats.new_cards += 1,
                CardStatus::Learning => stats.learning_cards += 1,
                CardStatus::Review | CardStatus::Relearning => stats.review_cards += 1,
            }

            if state.is_due() {
                stats.due_cards += 1;
            }
        }

        Ok(stats)
    }
}

fn required(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FlashcardStorageError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn non_negative(field: &str, value: i32) -> Result<()> {
    if value < 0 {
        return Err(FlashcardStorageError::Validation(format!(
            "{} must not be negative, got {}",
            field, value
        )));
    }
    Ok(())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}
