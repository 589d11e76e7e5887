//! Data models for the flashcard system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A deck is a collection of flashcards owned by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub card_count: usize,
    #[serde(default = "default_new_cards_per_day")]
    pub new_cards_per_day: i32,
    #[serde(default = "default_reviews_per_day")]
    pub reviews_per_day: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_new_cards_per_day() -> i32 {
    20
}

fn default_reviews_per_day() -> i32 {
    100
}

impl Deck {
    pub fn new(owner_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            description: None,
            color: None,
            card_count: 0,
            new_cards_per_day: default_new_cards_per_day(),
            reviews_per_day: default_reviews_per_day(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Absent fields are left untouched.
    pub fn apply(&mut self, update: UpdateDeckRequest) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(new_cards) = update.new_cards_per_day {
            self.new_cards_per_day = new_cards;
        }
        if let Some(reviews) = update.reviews_per_day {
            self.reviews_per_day = reviews;
        }
        self.updated_at = Utc::now();
    }
}

/// A flashcard with question (front) and answer (back)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn new(deck_id: Uuid, front: String, back: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            deck_id,
            front,
            back,
            tags: Vec::new(),
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: UpdateCardRequest) {
        if let Some(front) = update.front {
            self.front = front;
        }
        if let Some(back) = update.back {
            self.back = back;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        self.updated_at = Utc::now();
    }
}

/// Status of a card in the spaced repetition system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CardStatus {
    /// Never reviewed
    #[default]
    New,
    /// In initial learning phase
    Learning,
    /// Regular spaced review
    Review,
    /// Failed and re-learning
    Relearning,
}

/// Current spaced repetition state for a card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardState {
    pub card_id: Uuid,
    /// Current interval in days
    #[serde(default)]
    pub interval: i32,
    /// SM-2 ease factor (default 2.5)
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f32,
    /// When the card is due for review
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub review_count: i32,
    #[serde(default)]
    pub correct_count: i32,
    #[serde(default)]
    pub status: CardStatus,
}

fn default_ease_factor() -> f32 {
    2.5
}

impl CardState {
    pub fn new(card_id: Uuid) -> Self {
        Self {
            card_id,
            interval: 0,
            ease_factor: default_ease_factor(),
            due_date: Utc::now(),
            review_count: 0,
            correct_count: 0,
            status: CardStatus::New,
        }
    }

    /// Check if the card is due for review
    pub fn is_due(&self) -> bool {
        Utc::now() >= self.due_date
    }
}

/// Statistics for a deck or all of a user's decks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub new_cards: usize,
    pub learning_cards: usize,
    pub review_cards: usize,
    pub due_cards: usize,
}

/// A card with its current state, used for review sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardWithState {
    pub card: Flashcard,
    pub state: CardState,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeckRequest {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Partial deck update.
///
/// `description` and `color` are doubly optional so a client can clear them
/// with an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeckRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub color: Option<Option<String>>,
    pub new_cards_per_day: Option<i32>,
    pub reviews_per_day: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    pub front: Option<String>,
    pub back: Option<String>,
    pub tags: Option<Vec<String>>,
    pub position: Option<i32>,
}

/// Distinguishes a field that is absent from one explicitly set to `null`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_serializes_camel_case() {
        let deck = Deck::new(Uuid::new_v4(), "Spanish".to_string());
        let json = serde_json::to_value(&deck).unwrap();

        assert_eq!(json["name"], "Spanish");
        assert_eq!(json["cardCount"], 0);
        assert_eq!(json["newCardsPerDay"], 20);
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_update_deck_null_clears_description() {
        let mut deck = Deck::new(Uuid::new_v4(), "Spanish".to_string());
        deck.description = Some("verbs".to_string());
        deck.color = Some("#ff0000".to_string());

        let update: UpdateDeckRequest =
            serde_json::from_str(r#"{"description": null, "name": "Español"}"#).unwrap();
        deck.apply(update);

        assert_eq!(deck.name, "Español");
        assert_eq!(deck.description, None);
        assert_eq!(deck.color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_card_state_defaults_when_fields_missing() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"cardId": "{}", "dueDate": "2026-01-01T00:00:00Z"}}"#,
            id
        );
        let state: CardState = serde_json::from_str(&json).unwrap();

        assert_eq!(state.card_id, id);
        assert_eq!(state.ease_factor, 2.5);
        assert_eq!(state.status, CardStatus::New);
    }
}
