use anyhow::{Context, Result};

use quizdeck_lib::flashcards::CreateDeckRequest;

use crate::app::App;
use crate::render::terminal::{paint, truncate, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let user = app.user()?;
    let decks = app.flashcards.list_decks(user).context("Failed to list decks")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&decks)?);
        }
        OutputFormat::Plain => {
            if decks.is_empty() {
                println!("(no decks)");
                return Ok(());
            }

            for deck in &decks {
                let stats = app.flashcards.get_review_stats(user, Some(deck.id))?;
                let due = if stats.due_cards > 0 {
                    paint(&format!(" {} due", stats.due_cards), Color::YELLOW, use_color)
                } else {
                    String::new()
                };
                println!(
                    "{} ({} cards){}",
                    paint(&truncate(&deck.name, 40), Color::BOLD, use_color),
                    deck.card_count,
                    due
                );
                if let Some(description) = &deck.description {
                    println!("    {}", paint(description, Color::DIM, use_color));
                }
            }
        }
    }

    Ok(())
}

pub fn run_new(
    app: &App,
    name: &str,
    description: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let deck = app
        .flashcards
        .create_deck(
            app.user()?,
            CreateDeckRequest {
                name: name.to_string(),
                description,
                color: None,
            },
        )
        .context("Failed to create deck")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deck)?),
        OutputFormat::Plain => println!("Created deck '{}' ({})", deck.name, deck.id),
    }

    Ok(())
}
