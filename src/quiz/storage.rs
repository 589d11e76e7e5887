//! Quiz result storage
//!
//! Results are stored one file per attempt under
//! `users/{user-id}/quiz_results/{result-id}.json`.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use super::models::{QuizHistory, QuizResult};

#[derive(Error, Debug)]
pub enum QuizStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Quiz result not found: {0}")]
    ResultNotFound(Uuid),
}

pub type Result<T> = std::result::Result<T, QuizStorageError>;

pub struct QuizStorage {
    users_path: PathBuf,
}

impl QuizStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            users_path: data_dir.join("users"),
        }
    }

    fn results_dir(&self, user_id: Uuid) -> PathBuf {
        self.users_path.join(user_id.to_string()).join("quiz_results")
    }

    fn result_path(&self, user_id: Uuid, result_id: Uuid) -> PathBuf {
        self.results_dir(user_id).join(format!("{}.json", result_id))
    }

    pub fn save_result(&self, result: &QuizResult) -> Result<()> {
        fs::create_dir_all(self.results_dir(result.user_id))?;
        fs::write(
            self.result_path(result.user_id, result.id),
            serde_json::to_string_pretty(result)?,
        )?;
        log::debug!(
            "Saved quiz result {} ({}/{}) for deck {}",
            result.id,
            result.score,
            result.total,
            result.deck_id
        );
        Ok(())
    }

    pub fn get_result(&self, user_id: Uuid, result_id: Uuid) -> Result<QuizResult> {
        let path = self.result_path(user_id, result_id);
        if !path.exists() {
            return Err(QuizStorageError::ResultNotFound(result_id));
        }

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// List a user's results, newest first, optionally for a single deck
    pub fn list_results(&self, user_id: Uuid, deck_id: Option<Uuid>) -> Result<Vec<QuizResult>> {
        let dir = self.results_dir(user_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let content = fs::read_to_string(&path)?;
                let result: QuizResult = serde_json::from_str(&content)?;
                if deck_id.map_or(true, |id| result.deck_id == id) {
                    results.push(result);
                }
            }
        }

        results.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(results)
    }

    pub fn delete_result(&self, user_id: Uuid, result_id: Uuid) -> Result<()> {
        let path = self.result_path(user_id, result_id);
        if !path.exists() {
            return Err(QuizStorageError::ResultNotFound(result_id));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Remove every result recorded against a deck. Returns how many were removed.
    pub fn delete_results_for_deck(&self, user_id: Uuid, deck_id: Uuid) -> Result<usize> {
        let results = self.list_results(user_id, Some(deck_id))?;
        for result in &results {
            fs::remove_file(self.result_path(user_id, result.id))?;
        }
        Ok(results.len())
    }

    pub fn deck_history(&self, user_id: Uuid, deck_id: Uuid) -> Result<QuizHistory> {
        let results = self.list_results(user_id, Some(deck_id))?;

        let attempts = results.len();
        let best_percentage = results
            .iter()
            .map(|r| r.percentage)
            .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.max(p))));
        let average_percentage = (attempts > 0).then(|| {
            let sum: f64 = results.iter().map(|r| r.percentage).sum();
            (sum / attempts as f64 * 100.0).round() / 100.0
        });

        Ok(QuizHistory {
            deck_id,
            attempts,
            best_percentage,
            average_percentage,
            last_attempt_at: results.first().map(|r| r.submitted_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    use crate::quiz::models::MatchMode;

    fn result(user_id: Uuid, deck_id: Uuid, score: usize, total: usize, age_minutes: i64) -> QuizResult {
        QuizResult {
            id: Uuid::new_v4(),
            user_id,
            deck_id,
            deck_name: "Capitals".to_string(),
            correct: Vec::new(),
            incorrect: Vec::new(),
            unanswered: Vec::new(),
            score,
            total,
            percentage: score as f64 / total as f64 * 100.0,
            match_mode: MatchMode::Normalized,
            submitted_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn test_save_get_delete() {
        let temp_dir = TempDir::new().unwrap();
        let storage = QuizStorage::new(temp_dir.path().to_path_buf());
        let user = Uuid::new_v4();
        let saved = result(user, Uuid::new_v4(), 1, 2, 0);

        storage.save_result(&saved).unwrap();
        assert_eq!(storage.get_result(user, saved.id).unwrap().score, 1);

        storage.delete_result(user, saved.id).unwrap();
        assert!(matches!(
            storage.get_result(user, saved.id),
            Err(QuizStorageError::ResultNotFound(_))
        ));
    }

    #[test]
    fn test_results_are_private_to_user() {
        let temp_dir = TempDir::new().unwrap();
        let storage = QuizStorage::new(temp_dir.path().to_path_buf());
        let saved = result(Uuid::new_v4(), Uuid::new_v4(), 1, 1, 0);
        storage.save_result(&saved).unwrap();

        assert!(storage.get_result(Uuid::new_v4(), saved.id).is_err());
    }

    #[test]
    fn test_list_newest_first_and_filter_by_deck() {
        let temp_dir = TempDir::new().unwrap();
        let storage = QuizStorage::new(temp_dir.path().to_path_buf());
        let user = Uuid::new_v4();
        let deck = Uuid::new_v4();

        let older = result(user, deck, 1, 4, 30);
        let newer = result(user, deck, 3, 4, 5);
        let other = result(user, Uuid::new_v4(), 2, 2, 1);
        for r in [&older, &newer, &other] {
            storage.save_result(r).unwrap();
        }

        let listed = storage.list_results(user, Some(deck)).unwrap();
        assert_eq!(listed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
        assert_eq!(storage.list_results(user, None).unwrap().len(), 3);
    }

    #[test]
    fn test_deck_history() {
        let temp_dir = TempDir::new().unwrap();
        let storage = QuizStorage::new(temp_dir.path().to_path_buf());
        let user = Uuid::new_v4();
        let deck = Uuid::new_v4();

        let empty = storage.deck_history(user, deck).unwrap();
        assert_eq!(empty.attempts, 0);
        assert_eq!(empty.best_percentage, None);

        storage.save_result(&result(user, deck, 1, 4, 30)).unwrap();
        let latest = result(user, deck, 3, 4, 5);
        storage.save_result(&latest).unwrap();

        let history = storage.deck_history(user, deck).unwrap();
        assert_eq!(history.attempts, 2);
        assert_eq!(history.best_percentage, Some(75.0));
        assert_eq!(history.average_percentage, Some(50.0));
        assert_eq!(history.last_attempt_at, Some(latest.submitted_at));

        assert_eq!(storage.delete_results_for_deck(user, deck).unwrap(), 2);
        assert_eq!(storage.deck_history(user, deck).unwrap().attempts, 0);
    }
}
