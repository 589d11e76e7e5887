//! SM-2 Spaced Repetition Algorithm
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but upon seeing answer, remembered
//! - 2: Incorrect, but answer seemed easy to recall
//! - 3: Correct response with serious difficulty
//! - 4: Correct response after hesitation
//! - 5: Perfect response with no hesitation

use chrono::{DateTime, Duration, Utc};

use super::models::{CardState, CardStatus};

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f32 = 1.3;

/// Lowest quality still counted as a correct recall
pub const PASSING_QUALITY: i32 = 3;

/// Quality recorded for a card answered correctly in a quiz
const QUIZ_CORRECT_QUALITY: i32 = 4;

/// Quality recorded for a card answered incorrectly (or skipped) in a quiz
const QUIZ_INCORRECT_QUALITY: i32 = 1;

/// Result of calculating the next review
#[derive(Debug, Clone)]
pub struct ReviewResult {
    pub interval: i32,
    pub ease_factor: f32,
    pub due_date: DateTime<Utc>,
    pub status: CardStatus,
}

/// Calculate the next review interval and ease factor, counting from `now`.
pub fn calculate_next_review(state: &CardState, quality: i32, now: DateTime<Utc>) -> ReviewResult {
    let quality = quality.clamp(0, 5);

    let mut ease_factor = state.ease_factor;
    let interval;
    let status;

    if quality >= PASSING_QUALITY {
        match state.review_count {
            0 => {
                interval = 1;
                status = CardStatus::Learning;
            }
            1 => {
                interval = 6;
                status = CardStatus::Review;
            }
            _ => {
                interval = ((state.interval as f32 * ease_factor).round() as i32).max(1);
                status = CardStatus::Review;
            }
        }

        // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
        let miss = (5 - quality) as f32;
        ease_factor = (ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR);
    } else {
        interval = 1;
        ease_factor = (ease_factor - 0.2).max(MIN_EASE_FACTOR);

        status = if state.status == CardStatus::Review {
            CardStatus::Relearning
        } else {
            CardStatus::Learning
        };
    }

    ReviewResult {
        interval,
        ease_factor,
        due_date: now + Duration::days(interval as i64),
        status,
    }
}

/// Intervals each UI rating would produce: Again, Hard, Good, Easy.
pub fn preview_intervals(state: &CardState) -> [i32; 4] {
    let now = Utc::now();
    [1, 2, 3, 4].map(|rating| {
        let quality = ui_rating_to_quality(rating).unwrap_or(PASSING_QUALITY);
        calculate_next_review(state, quality, now).interval
    })
}

/// Map UI rating (1-4: Again, Hard, Good, Easy) to SM-2 quality (0-5)
pub fn ui_rating_to_quality(rating: i32) -> Option<i32> {
    match rating {
        1 => Some(1),
        2 => Some(3),
        3 => Some(4),
        4 => Some(5),
        _ => None,
    }
}

/// SM-2 quality for a quiz outcome
pub fn quiz_outcome_quality(correct: bool) -> i32 {
    if correct {
        QUIZ_CORRECT_QUALITY
    } else {
        QUIZ_INCORRECT_QUALITY
    }
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: i32) -> String {
    match days {
        d if d <= 0 => "now".to_string(),
        d if d < 7 => format!("{}d", d),
        d if d < 30 => format!("{}w", d / 7),
        d if d < 365 => format!("{}mo", d / 30),
        d => format!("{}y", d / 365),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_card_state() -> CardState {
        CardState::new(Uuid::new_v4())
    }

    #[test]
    fn test_first_review_correct() {
        let state = new_card_state();
        let result = calculate_next_review(&state, 4, Utc::now());

        assert_eq!(result.interval, 1);
        assert_eq!(result.status, CardStatus::Learning);
    }

    #[test]
    fn test_second_review_correct() {
        let mut state = new_card_state();
        state.review_count = 1;
        state.interval = 1;

        let result = calculate_next_review(&state, 4, Utc::now());

        assert_eq!(result.interval, 6);
        assert_eq!(result.status, CardStatus::Review);
    }

    #[test]
    fn test_subsequent_review_correct() {
        let mut state = new_card_state();
        state.review_count = 5;
        state.interval = 10;
        state.ease_factor = 2.5;

        let result = calculate_next_review(&state, 4, Utc::now());

        assert_eq!(result.interval, 25);
    }

    #[test]
    fn test_due_date_counts_from_now() {
        let now = Utc::now();
        let mut state = new_card_state();
        state.review_count = 1;

        let result = calculate_next_review(&state, 5, now);

        assert_eq!(result.due_date, now + Duration::days(6));
    }

    #[test]
    fn test_review_incorrect_resets() {
        let mut state = new_card_state();
        state.review_count = 5;
        state.interval = 30;
        state.status = CardStatus::Review;

        let result = calculate_next_review(&state, 1, Utc::now());

        assert_eq!(result.interval, 1);
        assert_eq!(result.status, CardStatus::Relearning);
    }

    #[test]
    fn test_ease_factor_minimum() {
        let mut state = new_card_state();
        state.ease_factor = 1.4;
        state.review_count = 5;
        state.interval = 10;

        let result = calculate_next_review(&state, 1, Utc::now());
        assert!(result.ease_factor >= MIN_EASE_FACTOR);

        let result2 = calculate_next_review(
            &CardState {
                ease_factor: result.ease_factor,
                ..state
            },
            1,
            Utc::now(),
        );
        assert!(result2.ease_factor >= MIN_EASE_FACTOR);
    }

    #[test]
    fn test_ui_rating_out_of_range() {
        assert_eq!(ui_rating_to_quality(0), None);
        assert_eq!(ui_rating_to_quality(5), None);
        assert_eq!(ui_rating_to_quality(3), Some(4));
    }

    #[test]
    fn test_preview_intervals_for_new_card() {
        let state = new_card_state();
        assert_eq!(preview_intervals(&state), [1, 1, 1, 1]);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(5), "5d");
        assert_eq!(format_interval(7), "1w");
        assert_eq!(format_interval(14), "2w");
        assert_eq!(format_interval(30), "1mo");
        assert_eq!(format_interval(90), "3mo");
        assert_eq!(format_interval(365), "1y");
        assert_eq!(format_interval(730), "2y");
    }
}
