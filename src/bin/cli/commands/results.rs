use anyhow::{Context, Result};

use quizdeck_lib::quiz::QuizResult;

use crate::app::App;
use crate::render::terminal::{paint, score_color, truncate};
use crate::OutputFormat;

pub fn run(app: &App, deck_name: Option<&str>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let user = app.user()?;
    let deck_id = match deck_name {
        Some(name) => Some(app.find_deck(name)?.id),
        None => None,
    };

    let results = app
        .quizzes
        .list_results(user, deck_id)
        .context("Failed to list quiz results")?;

    match format {
        OutputFormat::Json => {
            let summaries: Vec<_> = results.iter().map(QuizResult::summary).collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        OutputFormat::Plain => {
            if results.is_empty() {
                println!("No quiz results yet.");
                return Ok(());
            }

            for r in &results {
                let score = format!("{:>3}/{:<3} {:>6.2}%", r.score, r.total, r.percentage);
                println!(
                    "{}  {:<30} {}",
                    r.submitted_at.format("%Y-%m-%d %H:%M"),
                    truncate(&r.deck_name, 30),
                    paint(&score, score_color(r.percentage), use_color)
                );
            }

            if let Some(id) = deck_id {
                let history = app.quizzes.deck_history(user, id)?;
                if let (Some(best), Some(avg)) = (history.best_percentage, history.average_percentage) {
                    println!(
                        "\n{} attempts, best {:.2}%, average {:.2}%",
                        history.attempts, best, avg
                    );
                }
            } else {
                println!("\n{} results", results.len());
            }
        }
    }

    Ok(())
}
