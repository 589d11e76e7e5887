use anyhow::{Context, Result};

use quizdeck_lib::flashcards::algorithm::format_interval;
use quizdeck_lib::flashcards::CreateCardRequest;

use crate::app::App;
use crate::render::terminal::{paint, truncate, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, deck_name: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let user = app.user()?;
    let deck = app.find_deck(deck_name)?;
    let cards = app
        .flashcards
        .list_cards(user, deck.id)
        .context("Failed to list cards")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("Deck '{}' has no cards.", deck.name);
                return Ok(());
            }

            let front_w = 40;
            println!("{:<front_w$} {:<30} {}", "Question", "Answer", "Next", front_w = front_w);
            println!(
                "{} {} {}",
                "\u{2500}".repeat(front_w),
                "\u{2500}".repeat(30),
                "\u{2500}".repeat(6)
            );

            for card in &cards {
                let state = app.flashcards.get_card_state(user, card.id)?;
                let next = if state.is_due() {
                    paint("due", Color::YELLOW, use_color)
                } else {
                    format_interval((state.due_date - chrono::Utc::now()).num_days() as i32 + 1)
                };
                println!(
                    "{:<front_w$} {:<30} {}",
                    truncate(&card.front, front_w),
                    truncate(&card.back, 30),
                    next,
                    front_w = front_w
                );
            }

            println!("\n{} cards", cards.len());
        }
    }

    Ok(())
}

pub fn run_add(
    app: &App,
    deck_name: &str,
    front: &str,
    back: &str,
    tags: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let tags = tags
        .map(|t| t.split(',').map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let card = app
        .flashcards
        .create_card(
            app.user()?,
            deck.id,
            CreateCardRequest {
                front: front.to_string(),
                back: back.to_string(),
                tags,
            },
        )
        .context("Failed to create card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card)?),
        OutputFormat::Plain => println!("Added card {} to '{}'", card.id, deck.name),
    }

    Ok(())
}
