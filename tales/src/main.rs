//! Spooky Tales - a story-card TUI.
//!
//! Draws from a shuffled deck of spooky story cards, conjures card
//! images and story starters with Gemini, and lets you add cards of
//! your own. The deck persists to a local JSON file between runs.
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run -p tales -- --deck my_deck.json
//! ```

mod app;
mod events;
mod ui;
mod worker;

use crossterm::{
    event::{self},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::time::Duration;
use tales_core::{DeckFile, HttpFetcher, Storyteller};
use tokio::sync::mpsc;

use app::App;
use events::{handle_event, EventResult};
use ui::render;

const DEFAULT_DECK_PATH: &str = "spooky_tales_deck.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    if std::env::var("GEMINI_API_KEY").is_err() {
        eprintln!("Error: GEMINI_API_KEY environment variable not set.");
        eprintln!("Please set it in .env file or with: export GEMINI_API_KEY=your_key_here");
        std::process::exit(1);
    }

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let deck_path = args
        .iter()
        .position(|a| a == "--deck")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
        .unwrap_or(DEFAULT_DECK_PATH)
        .to_string();

    let ai = Storyteller::from_env()?;
    let fetcher = HttpFetcher::new();

    let (intent_tx, intent_rx) = mpsc::channel(32);
    let (update_tx, update_rx) = mpsc::channel(32);

    let worker_handle = tokio::spawn(worker::run(
        DeckFile::new(deck_path),
        ai,
        fetcher,
        intent_rx,
        update_tx,
    ));

    // Terminal setup
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(intent_tx, update_rx)).await;

    // Terminal teardown
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    worker_handle.abort();

    result.map_err(Into::into)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> io::Result<()> {
    loop {
        if app.pump_updates() {
            app.status = None;
        }
        app.tick();
        terminal.draw(|frame| render(frame, &app))?;

        if event::poll(Duration::from_millis(100))? {
            match handle_event(&mut app, event::read()?) {
                EventResult::Quit => return Ok(()),
                EventResult::Continue | EventResult::NeedsRedraw => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn print_help() {
    println!("Spooky Tales - a story-card TUI");
    println!();
    println!("Usage: tales [--deck <path>]");
    println!();
    println!("Options:");
    println!("  --deck <path>   Deck file to load and save (default: {DEFAULT_DECK_PATH})");
    println!("  -h, --help      Show this help");
    println!();
    println!("Keys:");
    println!("  n / space    next card");
    println!("  s            shuffle the deck");
    println!("  g            conjure a story starter");
    println!("  a            add your own card");
    println!("  q            quit");
}
