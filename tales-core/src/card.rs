//! Story card data model and validation.
//!
//! Cards carry an explicit origin (seed vs. user-added) and an explicit
//! image state (placeholder vs. generated vs. uploaded) rather than
//! encoding either in the shape of a string.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum display length of a card phrase, in characters.
pub const MAX_PHRASE_CHARS: usize = 100;

/// Maximum number of whitespace-separated words in an image hint.
pub const MAX_HINT_WORDS: usize = 2;

/// Maximum decoded size of an uploaded card image, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Number of cards in a freshly generated seed deck.
pub const SEED_DECK_SIZE: usize = 50;

/// Errors from card validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("Card phrase is empty")]
    EmptyPhrase,

    #[error("Card phrase is longer than {MAX_PHRASE_CHARS} characters")]
    PhraseTooLong,

    #[error("Image hint is empty")]
    EmptyHint,

    #[error("Card has no image")]
    MissingImage,

    #[error("Card image is not an inline data URI")]
    InvalidImage,

    #[error("Card image is larger than {MAX_UPLOAD_BYTES} bytes")]
    ImageTooLarge,
}

/// Where a card came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardOrigin {
    /// Built-in starter card generated at first run.
    Seed,
    /// Card added by the user through the add-card flow.
    User,
}

/// The image attached to a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageState {
    /// Remote filler image; no real image has been generated yet.
    Placeholder { url: String },
    /// Inline data URI produced by the image-generation service.
    Generated { data_uri: String },
    /// Inline data URI supplied by the user.
    Uploaded { data_uri: String },
}

impl ImageState {
    /// True if no real image has been attached yet.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ImageState::Placeholder { .. })
    }

    /// The inline data URI, if the image is already materialized.
    pub fn data_uri(&self) -> Option<&str> {
        match self {
            ImageState::Placeholder { .. } => None,
            ImageState::Generated { data_uri } | ImageState::Uploaded { data_uri } => {
                Some(data_uri)
            }
        }
    }
}

/// A single story card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryCard {
    /// Unique within the deck. Seed cards use small sequential ids,
    /// user cards a timestamp plus random suffix.
    pub id: String,

    /// Explicit origin discriminant.
    pub origin: CardOrigin,

    /// Current image state.
    pub image: ImageState,

    /// Short display phrase.
    pub phrase: String,

    /// One- or two-word descriptor; prompt seed for image generation
    /// and alt text.
    pub image_hint: String,
}

/// Raw add-card input, validated into a [`StoryCard`].
#[derive(Debug, Clone, Default)]
pub struct CardDraft {
    pub phrase: String,
    pub image_hint: String,
    pub image_data_uri: String,
}

impl CardDraft {
    /// Validate and build a user card.
    ///
    /// Rejects an empty phrase, a missing or non-inline image, and an
    /// empty hint. The hint is truncated to [`MAX_HINT_WORDS`] words.
    pub fn build(self) -> Result<StoryCard, CardError> {
        let phrase = self.phrase.trim().to_string();
        if phrase.is_empty() {
            return Err(CardError::EmptyPhrase);
        }
        if phrase.chars().count() > MAX_PHRASE_CHARS {
            return Err(CardError::PhraseTooLong);
        }

        let hint = normalize_hint(&self.image_hint);
        if hint.is_empty() {
            return Err(CardError::EmptyHint);
        }

        let data_uri = self.image_data_uri.trim().to_string();
        if data_uri.is_empty() {
            return Err(CardError::MissingImage);
        }
        if !data_uri.starts_with("data:") {
            return Err(CardError::InvalidImage);
        }
        // Base64 expands bytes 4:3; compare against the encoded budget.
        if data_uri.len() > MAX_UPLOAD_BYTES / 3 * 4 + "data:image/png;base64,".len() {
            return Err(CardError::ImageTooLarge);
        }

        Ok(StoryCard {
            id: user_card_id(),
            origin: CardOrigin::User,
            image: ImageState::Uploaded { data_uri },
            phrase,
            image_hint: hint,
        })
    }
}

/// Truncate a hint to at most [`MAX_HINT_WORDS`] whitespace-separated words.
pub fn normalize_hint(raw: &str) -> String {
    raw.split_whitespace()
        .take(MAX_HINT_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate an id for a user-added card.
///
/// Millisecond timestamp plus a random hex suffix; never collides with
/// the small sequential seed ids.
fn user_card_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let suffix: u16 = rand::thread_rng().gen();
    format!("{millis}-{suffix:04x}")
}

const SEED_PHRASES: [&str; 10] = [
    "Whispering Shadows",
    "The Attic Door Creaks",
    "Eyes in the Dark Mirror",
    "Forgotten Lullaby",
    "The Scarecrow Smiles",
    "Footsteps Overhead",
    "The Last Candle Gutters",
    "Something Knocks Twice",
    "The Portrait Blinks",
    "Cold Breath on Glass",
];

const SEED_HINTS: [&str; 9] = [
    "dark forest",
    "attic door",
    "glowing eyes",
    "music box",
    "eerie scarecrow",
    "empty hallway",
    "melted candle",
    "locked cellar",
    "fogged window",
];

const PLACEHOLDER_VARIANTS: [&str; 5] = [
    "101218/e0e0e0",
    "121015/d0d0d0",
    "0f1412/f0f0f0",
    "181010/e5e5e5",
    "131313/cccccc",
];

/// Canonical placeholder URL for seed slot `n` (zero-based).
pub fn placeholder_url(n: usize) -> String {
    let variant = PLACEHOLDER_VARIANTS[n % PLACEHOLDER_VARIANTS.len()];
    format!("https://placehold.co/400x600/{variant}.png")
}

/// Canonical placeholder for a seed card, looked up by its id.
pub fn seed_placeholder_for(id: &str) -> String {
    let slot = id.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
    placeholder_url(slot.unwrap_or(0))
}

/// Generate the built-in starter deck.
///
/// Phrases and hints are drawn round-robin from two fixed lists with
/// coprime lengths, so no exact pairing repeats before the lists are
/// exhausted.
pub fn seed_deck() -> Vec<StoryCard> {
    (0..SEED_DECK_SIZE)
        .map(|i| StoryCard {
            id: (i + 1).to_string(),
            origin: CardOrigin::Seed,
            image: ImageState::Placeholder {
                url: placeholder_url(i),
            },
            phrase: SEED_PHRASES[i % SEED_PHRASES.len()].to_string(),
            image_hint: SEED_HINTS[i % SEED_HINTS.len()].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn draft(phrase: &str, hint: &str, image: &str) -> CardDraft {
        CardDraft {
            phrase: phrase.to_string(),
            image_hint: hint.to_string(),
            image_data_uri: image.to_string(),
        }
    }

    #[test]
    fn test_valid_draft() {
        let card = draft("The walls whispered", "abandoned house", "data:image/png;base64,AAA")
            .build()
            .unwrap();

        assert_eq!(card.origin, CardOrigin::User);
        assert_eq!(card.phrase, "The walls whispered");
        assert_eq!(card.image_hint, "abandoned house");
        assert_eq!(
            card.image.data_uri(),
            Some("data:image/png;base64,AAA")
        );
    }

    #[test]
    fn test_empty_phrase_rejected() {
        let result = draft("   ", "house", "data:image/png;base64,AAA").build();
        assert_eq!(result.unwrap_err(), CardError::EmptyPhrase);
    }

    #[test]
    fn test_long_phrase_rejected() {
        let phrase = "a".repeat(MAX_PHRASE_CHARS + 1);
        let result = draft(&phrase, "house", "data:image/png;base64,AAA").build();
        assert_eq!(result.unwrap_err(), CardError::PhraseTooLong);
    }

    #[test]
    fn test_missing_image_rejected() {
        let result = draft("Phrase", "house", "").build();
        assert_eq!(result.unwrap_err(), CardError::MissingImage);
    }

    #[test]
    fn test_remote_url_rejected_as_upload() {
        let result = draft("Phrase", "house", "https://example.com/a.png").build();
        assert_eq!(result.unwrap_err(), CardError::InvalidImage);
    }

    #[test]
    fn test_empty_hint_rejected() {
        let result = draft("Phrase", "  ", "data:image/png;base64,AAA").build();
        assert_eq!(result.unwrap_err(), CardError::EmptyHint);
    }

    #[test]
    fn test_hint_truncated_to_two_words() {
        let card = draft(
            "Phrase",
            "very old abandoned house",
            "data:image/png;base64,AAA",
        )
        .build()
        .unwrap();
        assert_eq!(card.image_hint, "very old");
    }

    #[test]
    fn test_oversized_upload_rejected() {
        let payload = "A".repeat(MAX_UPLOAD_BYTES / 3 * 4 + 100);
        let result = draft("Phrase", "house", &format!("data:image/png;base64,{payload}")).build();
        assert_eq!(result.unwrap_err(), CardError::ImageTooLarge);
    }

    #[test]
    fn test_user_ids_distinct_from_seed_ids() {
        let seed_ids: HashSet<String> = seed_deck().into_iter().map(|c| c.id).collect();
        for _ in 0..20 {
            let card = draft("Phrase", "house", "data:image/png;base64,AAA")
                .build()
                .unwrap();
            assert!(!seed_ids.contains(&card.id));
            assert!(card.id.contains('-'));
        }
    }

    #[test]
    fn test_seed_deck_shape() {
        let deck = seed_deck();
        assert_eq!(deck.len(), SEED_DECK_SIZE);

        let ids: HashSet<&str> = deck.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), SEED_DECK_SIZE);

        for card in &deck {
            assert_eq!(card.origin, CardOrigin::Seed);
            assert!(card.image.is_placeholder());
            assert!(!card.phrase.is_empty());
            assert!(card.image_hint.split_whitespace().count() <= MAX_HINT_WORDS);
        }
    }

    #[test]
    fn test_seed_deck_pairings_do_not_repeat() {
        let deck = seed_deck();
        let pairs: HashSet<(String, String)> = deck
            .iter()
            .map(|c| (c.phrase.clone(), c.image_hint.clone()))
            .collect();
        assert_eq!(pairs.len(), deck.len());
    }

    #[test]
    fn test_seed_placeholder_lookup() {
        assert_eq!(seed_placeholder_for("1"), placeholder_url(0));
        assert_eq!(seed_placeholder_for("6"), placeholder_url(5));
    }

    #[test]
    fn test_card_serde_round_trip() {
        let card = StoryCard {
            id: "3".to_string(),
            origin: CardOrigin::Seed,
            image: ImageState::Placeholder {
                url: placeholder_url(2),
            },
            phrase: "Eyes in the Dark Mirror".to_string(),
            image_hint: "glowing eyes".to_string(),
        };

        let json = serde_json::to_string(&card).unwrap();
        let back: StoryCard = serde_json::from_str(&json).unwrap();
        assert_eq!(card, back);
    }
}
