//! Spooky story-card deck engine.
//!
//! This crate provides:
//! - The story-card deck with shuffle / advance / add-card operations
//! - Versioned deck persistence with a storage-quota fallback
//! - Lazy, at-most-once card image generation via Gemini
//! - Story-starter generation from the current card's image and phrase
//!
//! # Quick Start
//!
//! ```ignore
//! use tales_core::{run_image_job, DeckFile, Session, Storyteller};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ai = Storyteller::from_env()?;
//!     let (mut session, job) = Session::init(DeckFile::new("deck.json")).await;
//!
//!     if let Some(job) = job {
//!         let result = run_image_job(&job, &ai).await;
//!         session.complete_image(&job.card_id, result).await;
//!     }
//!
//!     println!("{:?}", session.current_card());
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod card;
pub mod deck;
pub mod fetch;
pub mod persist;
pub mod session;
pub mod testing;

// Primary public API
pub use ai::{AiError, Storyteller, TaleAi};
pub use card::{CardDraft, CardError, CardOrigin, ImageState, StoryCard};
pub use deck::Deck;
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use persist::{DeckFile, LoadOutcome, PersistError};
pub use session::{
    run_image_job, run_story_job, ImageJob, Notice, Session, Severity, Snapshot, StoryError,
    StoryJob,
};
