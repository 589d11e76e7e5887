use anyhow::{Context, Result};

use quizdeck_lib::quiz::{grade, QuizSubmission};

use crate::app::App;
use crate::render::terminal::{paint, score_color, truncate, Color};
use crate::OutputFormat;

/// Grade a submission read from JSON and store the result
pub fn run(
    app: &App,
    deck_name: &str,
    submission_json: &str,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let user = app.user()?;
    let deck = app.find_deck(deck_name)?;
    let submission: QuizSubmission =
        serde_json::from_str(submission_json).context("Answers are not a valid quiz submission")?;

    let cards = app
        .flashcards
        .list_cards(user, deck.id)
        .context("Failed to list cards")?;
    let graded = grade(&cards, &submission.answers, submission.match_mode)?;
    let missed = graded.missed();
    let result = graded.into_result(user, &deck, submission.match_mode);

    app.quizzes
        .save_result(&result)
        .context("Failed to save quiz result")?;

    if submission.update_schedule {
        app.flashcards
            .apply_quiz_outcome(user, &result.correct, &missed)
            .context("Failed to update review schedule")?;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Plain => {
            let headline = format!(
                "{}: {}/{} ({:.2}%)",
                deck.name, result.score, result.total, result.percentage
            );
            println!("{}", paint(&headline, score_color(result.percentage), use_color));

            for card in &cards {
                let (mark, color) = if result.correct.contains(&card.id) {
                    ("\u{2713}", Color::GREEN)
                } else if result.incorrect.contains(&card.id) {
                    ("\u{2717}", Color::RED)
                } else {
                    ("-", Color::DIM)
                };
                println!(
                    "  {} {}  {}",
                    paint(mark, color, use_color),
                    truncate(&card.front, 50),
                    paint(&card.back, Color::DIM, use_color)
                );
            }
        }
    }

    Ok(())
}
