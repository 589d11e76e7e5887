use anyhow::{bail, Context, Result};
use uuid::Uuid;

use quizdeck_lib::flashcards::{Deck, FlashcardStorage};
use quizdeck_lib::quiz::QuizStorage;
use quizdeck_lib::Config;

/// Shared application state for CLI commands
pub struct App {
    pub flashcards: FlashcardStorage,
    pub quizzes: QuizStorage,
    user: Option<Uuid>,
}

impl App {
    pub fn new(config: Config, user: Option<Uuid>) -> Result<Self> {
        let data_dir = config
            .resolve_data_dir()
            .context("Failed to resolve data directory")?;

        Ok(Self {
            flashcards: FlashcardStorage::new(data_dir.clone()),
            quizzes: QuizStorage::new(data_dir),
            user,
        })
    }

    /// The user commands act for (`--user` or `QUIZDECK_USER`)
    pub fn user(&self) -> Result<Uuid> {
        self.user
            .context("No user selected. Pass --user <uuid> or set QUIZDECK_USER.")
    }

    /// Find a deck by name (case-insensitive, exact match first, then prefix)
    pub fn find_deck(&self, name: &str) -> Result<Deck> {
        let decks = self
            .flashcards
            .list_decks(self.user()?)
            .context("Failed to list decks")?;

        let name_lower = name.to_lowercase();

        if let Some(deck) = decks.iter().find(|d| d.name.to_lowercase() == name_lower) {
            return Ok(deck.clone());
        }

        let matches: Vec<&Deck> = decks
            .iter()
            .filter(|d| d.name.to_lowercase().starts_with(&name_lower))
            .collect();

        match matches.len() {
            0 => bail!(
                "No deck matching '{}'. Available decks:\n{}",
                name,
                decks
                    .iter()
                    .map(|d| format!("  - {}", d.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous deck name '{}'. Matches:\n{}",
                name,
                matches
                    .iter()
                    .map(|d| format!("  - {}", d.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizdeck_lib::flashcards::CreateDeckRequest;
    use tempfile::TempDir;

    fn app_with_decks(names: &[&str]) -> (TempDir, App) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: Some(temp_dir.path().to_path_buf()),
            ..Config::default()
        };
        let app = App::new(config, Some(Uuid::new_v4())).unwrap();
        for name in names {
            app.flashcards
                .create_deck(
                    app.user().unwrap(),
                    CreateDeckRequest {
                        name: name.to_string(),
                        description: None,
                        color: None,
                    },
                )
                .unwrap();
        }
        (temp_dir, app)
    }

    #[test]
    fn test_find_deck_exact_then_prefix() {
        let (_dir, app) = app_with_decks(&["Spanish", "Spanish Verbs", "Chemistry"]);

        assert_eq!(app.find_deck("spanish").unwrap().name, "Spanish");
        assert_eq!(app.find_deck("chem").unwrap().name, "Chemistry");
    }

    #[test]
    fn test_find_deck_ambiguous_or_missing() {
        let (_dir, app) = app_with_decks(&["Spanish Nouns", "Spanish Verbs"]);

        assert!(app.find_deck("span").is_err());
        assert!(app.find_deck("german").is_err());
    }

    #[test]
    fn test_user_required() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: Some(temp_dir.path().to_path_buf()),
            ..Config::default()
        };
        let app = App::new(config, None).unwrap();
        assert!(app.user().is_err());
    }
}
