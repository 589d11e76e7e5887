//! Data models for quizzes and their results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a submitted answer is compared to a card's stored answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    /// Equal after trimming surrounding whitespace
    Exact,
    /// Case, inner whitespace and trailing punctuation are ignored
    #[default]
    Normalized,
}

/// A single answer given by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub flashcard_id: Uuid,
    pub answer: String,
}

/// Answers submitted for one pass over a deck
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    #[serde(default)]
    pub answers: Vec<AnswerSubmission>,
    #[serde(default)]
    pub match_mode: MatchMode,
    /// Also record the outcome in the spaced repetition schedule
    #[serde(default)]
    pub update_schedule: bool,
}

/// Scored record of a quiz attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub deck_id: Uuid,
    pub deck_name: String,
    pub correct: Vec<Uuid>,
    pub incorrect: Vec<Uuid>,
    #[serde(default)]
    pub unanswered: Vec<Uuid>,
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
    #[serde(default)]
    pub match_mode: MatchMode,
    pub submitted_at: DateTime<Utc>,
}

impl QuizResult {
    pub fn summary(&self) -> QuizResultSummary {
        QuizResultSummary {
            id: self.id,
            deck_id: self.deck_id,
            deck_name: self.deck_name.clone(),
            score: self.score,
            total: self.total,
            percentage: self.percentage,
            submitted_at: self.submitted_at,
        }
    }
}

/// Listing view of a quiz result, without the per-card sets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultSummary {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub deck_name: String,
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
    pub submitted_at: DateTime<Utc>,
}

/// Aggregate over all attempts at one deck
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizHistory {
    pub deck_id: Uuid,
    pub attempts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_defaults() {
        let submission: QuizSubmission = serde_json::from_str(r#"{"answers": []}"#).unwrap();

        assert_eq!(submission.match_mode, MatchMode::Normalized);
        assert!(!submission.update_schedule);
    }

    #[test]
    fn test_submission_parses_camel_case() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"answers": [{{"flashcardId": "{}", "answer": "Paris"}}], "matchMode": "exact", "updateSchedule": true}}"#,
            id
        );
        let submission: QuizSubmission = serde_json::from_str(&json).unwrap();

        assert_eq!(submission.answers[0].flashcard_id, id);
        assert_eq!(submission.match_mode, MatchMode::Exact);
        assert!(submission.update_schedule);
    }
}
