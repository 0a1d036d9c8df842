//! Deck persistence: a single versioned JSON slot on disk.
//!
//! Stands in for the original deployment's key-value storage slot. The
//! schema carries an explicit version field; state written under any
//! other version is never adopted. Seed cards are shrunk back to their
//! canonical placeholder before writing so that regenerated images for
//! the fixed seed slots cannot grow the file without bound.

use crate::card::{seed_placeholder_for, CardOrigin, ImageState, StoryCard};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;

/// Current deck file schema version.
const SAVE_VERSION: u32 = 1;

/// Default storage budget, matching the usual local-storage quota.
const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Deck snapshot is {bytes} bytes, over the {max} byte storage budget")]
    QuotaExceeded { bytes: usize, max: usize },
}

/// Result of reading the deck slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No stored state; first run.
    Absent,
    /// Stored state exists but is unusable; regenerate from seed data.
    UseSeed,
    /// A valid, non-empty deck.
    Deck(Vec<StoryCard>),
}

/// The on-disk deck document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SavedDeck {
    version: u32,
    saved_at: String,
    cards: Vec<StoryCard>,
}

/// The durable slot the deck is mirrored into.
#[derive(Debug, Clone)]
pub struct DeckFile {
    path: PathBuf,
    max_bytes: usize,
}

impl DeckFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    /// Override the storage budget.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Write the deck to the slot.
    ///
    /// Seed cards holding a generated image are stored as their
    /// canonical placeholder; the in-memory deck is not touched. A
    /// payload over the storage budget fails with
    /// [`PersistError::QuotaExceeded`] and leaves the slot unchanged.
    pub async fn save(&self, cards: &[StoryCard]) -> Result<(), PersistError> {
        let saved = SavedDeck {
            version: SAVE_VERSION,
            saved_at: unix_now(),
            cards: shrink_for_storage(cards),
        };

        let content = serde_json::to_string_pretty(&saved)?;
        if content.len() > self.max_bytes {
            return Err(PersistError::QuotaExceeded {
                bytes: content.len(),
                max: self.max_bytes,
            });
        }

        fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Read the slot.
    ///
    /// A missing file is [`LoadOutcome::Absent`]; anything unreadable,
    /// unparsable, empty, or written under a different schema version
    /// is [`LoadOutcome::UseSeed`].
    pub async fn load(&self) -> LoadOutcome {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::Absent,
            Err(_) => return LoadOutcome::UseSeed,
        };

        match serde_json::from_str::<SavedDeck>(&content) {
            Ok(saved) if saved.version == SAVE_VERSION && !saved.cards.is_empty() => {
                LoadOutcome::Deck(saved.cards)
            }
            _ => LoadOutcome::UseSeed,
        }
    }
}

/// Storage copy of the deck: seed cards with generated images revert to
/// their canonical placeholder, everything else passes through.
fn shrink_for_storage(cards: &[StoryCard]) -> Vec<StoryCard> {
    cards
        .iter()
        .map(|card| {
            if card.origin == CardOrigin::Seed
                && matches!(card.image, ImageState::Generated { .. })
            {
                let mut shrunk = card.clone();
                shrunk.image = ImageState::Placeholder {
                    url: seed_placeholder_for(&card.id),
                };
                shrunk
            } else {
                card.clone()
            }
        })
        .collect()
}

/// Current timestamp as seconds since the epoch.
fn unix_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", now.as_secs())
}
