//! Quiz grading
//!
//! Cross-references submitted answers against the cards of a deck. Each card
//! ends up in exactly one of the correct, incorrect or unanswered sets, in
//! deck order, and the score is the number of correct cards.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use super::models::{AnswerSubmission, MatchMode, QuizResult};
use crate::flashcards::{Deck, Flashcard};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GradingError {
    #[error("Deck has no flashcards to quiz on")]
    EmptyDeck,

    #[error("Flashcard {0} is not part of this deck")]
    UnknownCard(Uuid),

    #[error("Flashcard {0} was answered more than once")]
    DuplicateAnswer(Uuid),
}

/// Outcome of grading one submission
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub correct: Vec<Uuid>,
    pub incorrect: Vec<Uuid>,
    pub unanswered: Vec<Uuid>,
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
}

impl Grade {
    /// Cards that were not answered correctly
    pub fn missed(&self) -> Vec<Uuid> {
        self.incorrect.iter().chain(&self.unanswered).copied().collect()
    }

    pub fn into_result(self, user_id: Uuid, deck: &Deck, match_mode: MatchMode) -> QuizResult {
        QuizResult {
            id: Uuid::new_v4(),
            user_id,
            deck_id: deck.id,
            deck_name: deck.name.clone(),
            correct: self.correct,
            incorrect: self.incorrect,
            unanswered: self.unanswered,
            score: self.score,
            total: self.total,
            percentage: self.percentage,
            match_mode,
            submitted_at: Utc::now(),
        }
    }
}

/// Grade `answers` against `cards`, which must be in deck order.
pub fn grade(
    cards: &[Flashcard],
    answers: &[AnswerSubmission],
    mode: MatchMode,
) -> Result<Grade, GradingError> {
    if cards.is_empty() {
        return Err(GradingError::EmptyDeck);
    }

    let mut by_card: HashMap<Uuid, &str> = HashMap::with_capacity(answers.len());
    for submission in answers {
        if !cards.iter().any(|c| c.id == submission.flashcard_id) {
            return Err(GradingError::UnknownCard(submission.flashcard_id));
        }
        if by_card
            .insert(submission.flashcard_id, submission.answer.as_str())
            .is_some()
        {
            return Err(GradingError::DuplicateAnswer(submission.flashcard_id));
        }
    }

    let mut correct = Vec::new();
    let mut incorrect = Vec::new();
    let mut unanswered = Vec::new();

    for card in cards {
        match by_card.get(&card.id) {
            Some(answer) if !answer.trim().is_empty() => {
                if answers_match(answer, &card.back, mode) {
                    correct.push(card.id);
                } else {
                    incorrect.push(card.id);
                }
            }
            _ => unanswered.push(card.id),
        }
    }

    let score = correct.len();
    let total = cards.len();

    Ok(Grade {
        correct,
        incorrect,
        unanswered,
        score,
        total,
        percentage: percentage(score, total),
    })
}

/// Compare a given answer with the expected one under `mode`
pub fn answers_match(given: &str, expected: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Exact => given.trim() == expected.trim(),
        MatchMode::Normalized => normalize(given) == normalize(expected),
    }
}

fn normalize(text: &str) -> String {
    let collapsed = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    collapsed
        .trim_end_matches(|c| matches!(c, '.' | '!' | '?'))
        .trim_end()
        .to_string()
}

/// Percentage rounded to two decimals
fn percentage(score: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (score as f64 / total as f64 * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck_cards(pairs: &[(&str, &str)]) -> Vec<Flashcard> {
        let deck_id = Uuid::new_v4();
        pairs
            .iter()
            .enumerate()
            .map(|(i, (front, back))| {
                let mut card = Flashcard::new(deck_id, front.to_string(), back.to_string());
                card.position = i as i32;
                card
            })
            .collect()
    }

    fn answer(card: &Flashcard, text: &str) -> AnswerSubmission {
        AnswerSubmission {
            flashcard_id: card.id,
            answer: text.to_string(),
        }
    }

    #[test]
    fn test_grade_splits_correct_and_incorrect() {
        let cards = deck_cards(&[("France?", "Paris"), ("Peru?", "Lima"), ("Chad?", "N'Djamena")]);
        let answers = vec![
            answer(&cards[0], "paris"),
            answer(&cards[1], "Quito"),
            answer(&cards[2], "N'Djamena"),
        ];

        let grade = grade(&cards, &answers, MatchMode::Normalized).unwrap();

        assert_eq!(grade.correct, vec![cards[0].id, cards[2].id]);
        assert_eq!(grade.incorrect, vec![cards[1].id]);
        assert!(grade.unanswered.is_empty());
        assert_eq!(grade.score, 2);
        assert_eq!(grade.total, 3);
        assert_eq!(grade.percentage, 66.67);
    }

    #[test]
    fn test_missing_and_blank_answers_are_unanswered() {
        let cards = deck_cards(&[("1+1", "2"), ("2+2", "4"), ("3+3", "6")]);
        let answers = vec![answer(&cards[0], "2"), answer(&cards[1], "   ")];

        let grade = grade(&cards, &answers, MatchMode::Normalized).unwrap();

        assert_eq!(grade.correct, vec![cards[0].id]);
        assert!(grade.incorrect.is_empty());
        assert_eq!(grade.unanswered, vec![cards[1].id, cards[2].id]);
        assert_eq!(grade.missed(), vec![cards[1].id, cards[2].id]);
    }

    #[test]
    fn test_results_follow_deck_order_not_submission_order() {
        let cards = deck_cards(&[("a", "A"), ("b", "B"), ("c", "C")]);
        let answers = vec![
            answer(&cards[2], "C"),
            answer(&cards[0], "A"),
            answer(&cards[1], "B"),
        ];

        let grade = grade(&cards, &answers, MatchMode::Exact).unwrap();

        assert_eq!(grade.correct, cards.iter().map(|c| c.id).collect::<Vec<_>>());
        assert_eq!(grade.percentage, 100.0);
    }

    #[test]
    fn test_empty_deck_rejected() {
        assert_eq!(grade(&[], &[], MatchMode::Normalized), Err(GradingError::EmptyDeck));
    }

    #[test]
    fn test_unknown_card_rejected() {
        let cards = deck_cards(&[("a", "A")]);
        let stray = Uuid::new_v4();
        let answers = vec![AnswerSubmission {
            flashcard_id: stray,
            answer: "A".to_string(),
        }];

        assert_eq!(
            grade(&cards, &answers, MatchMode::Normalized),
            Err(GradingError::UnknownCard(stray))
        );
    }

    #[test]
    fn test_duplicate_answer_rejected() {
        let cards = deck_cards(&[("a", "A")]);
        let answers = vec![answer(&cards[0], "A"), answer(&cards[0], "B")];

        assert_eq!(
            grade(&cards, &answers, MatchMode::Normalized),
            Err(GradingError::DuplicateAnswer(cards[0].id))
        );
    }

    #[test]
    fn test_exact_mode_is_case_sensitive() {
        assert!(answers_match("  Paris ", "Paris", MatchMode::Exact));
        assert!(!answers_match("paris", "Paris", MatchMode::Exact));
    }

    #[test]
    fn test_normalized_mode_ignores_case_spacing_and_punctuation() {
        assert!(answers_match("the   Eiffel tower!", "The Eiffel Tower", MatchMode::Normalized));
        assert!(answers_match("ÉCOLE", "école.", MatchMode::Normalized));
        assert!(!answers_match("Eiffel", "The Eiffel Tower", MatchMode::Normalized));
    }

    #[test]
    fn test_into_result_copies_deck_identity() {
        let user = Uuid::new_v4();
        let deck = Deck::new(user, "Capitals".to_string());
        let mut cards = deck_cards(&[("France?", "Paris")]);
        cards[0].deck_id = deck.id;

        let result = grade(&cards, &[answer(&cards[0], "Paris")], MatchMode::Exact)
            .unwrap()
            .into_result(user, &deck, MatchMode::Exact);

        assert_eq!(result.deck_id, deck.id);
        assert_eq!(result.deck_name, "Capitals");
        assert_eq!(result.user_id, user);
        assert_eq!(result.score, 1);
    }
}
