mod app;
mod commands;
mod render {
    pub mod terminal;
}

use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use quizdeck_lib::Config;

#[derive(Parser)]
#[command(name = "quizdeck", about = "Flashcard decks, quizzes and reviews", version)]
struct Cli {
    /// Config file (default: <config dir>/quizdeck/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User id to act as
    #[arg(long, global = true, env = "QUIZDECK_USER")]
    user: Option<Uuid>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Address to bind, overriding the config file
        #[arg(long)]
        bind: Option<String>,
    },

    /// List decks
    Decks,

    /// Create a deck
    DeckNew {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// List the cards of a deck
    Cards {
        /// Deck name (case-insensitive prefix match)
        deck: String,
    },

    /// Add a card to a deck
    CardAdd {
        /// Deck name (case-insensitive prefix match)
        deck: String,
        /// Question
        front: String,
        /// Answer
        back: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// Grade a quiz submission and store the result
    Quiz {
        /// Deck name (case-insensitive prefix match)
        deck: String,
        /// JSON submission file, or "-" for stdin
        #[arg(long)]
        answers: String,
    },

    /// List quiz results
    Results {
        /// Only results for this deck
        #[arg(long)]
        deck: Option<String>,
    },
}

/// Read a file argument, treating "-" as stdin
fn read_input(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Serve { bind } => {
            let mut config = config;
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime.block_on(quizdeck_lib::server::run(config))?;
        }
        Command::Decks => {
            let app = app::App::new(config, cli.user)?;
            commands::decks::run_list(&app, &cli.format, use_color)?;
        }
        Command::DeckNew { name, description } => {
            let app = app::App::new(config, cli.user)?;
            commands::decks::run_new(&app, &name, description, &cli.format)?;
        }
        Command::Cards { deck } => {
            let app = app::App::new(config, cli.user)?;
            commands::cards::run_list(&app, &deck, &cli.format, use_color)?;
        }
        Command::CardAdd { deck, front, back, tags } => {
            let app = app::App::new(config, cli.user)?;
            commands::cards::run_add(&app, &deck, &front, &back, tags.as_deref(), &cli.format)?;
        }
        Command::Quiz { deck, answers } => {
            let app = app::App::new(config, cli.user)?;
            let submission = read_input(&answers)?;
            commands::quiz::run(&app, &deck, &submission, &cli.format, use_color)?;
        }
        Command::Results { deck } => {
            let app = app::App::new(config, cli.user)?;
            commands::results::run(&app, deck.as_deref(), &cli.format, use_color)?;
        }
    }

    Ok(())
}
