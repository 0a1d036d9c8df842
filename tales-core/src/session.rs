//! Session - the primary public API for the story-card game.
//!
//! The session owns the deck, its storage slot, the in-flight job
//! state, the latest story starter, and the notice queue. It is a pure
//! state machine: the AI clients and the placeholder fetcher stay with
//! the caller, which runs the [`ImageJob`]s and [`StoryJob`]s the
//! session hands out and feeds the results back. That split is what
//! lets the event loop keep navigating while a generation is in
//! flight, and it is why a late image result still lands on the right
//! card: jobs complete by card id, never by cursor position.

use crate::ai::{AiError, TaleAi};
use crate::card::{CardDraft, CardError, ImageState, StoryCard};
use crate::deck::Deck;
use crate::fetch::{FetchError, Fetcher};
use crate::persist::{DeckFile, LoadOutcome};
use thiserror::Error;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A user-facing notice (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notice {
    fn info(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            severity: Severity::Info,
        }
    }

    fn error(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            severity: Severity::Error,
        }
    }
}

/// A claimed image-generation job for one card.
///
/// Handed out at most one at a time; the card stays marked as
/// generating until the job is fed back through
/// [`Session::complete_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub card_id: String,
    pub image_hint: String,
}

/// A claimed story-generation job for the current card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryJob {
    pub image: ImageState,
    pub phrase: String,
}

/// Failure modes of a story job.
#[derive(Debug, Error)]
pub enum StoryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Service(#[from] AiError),
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub deck_len: usize,
    pub current_index: usize,
    pub current_card: Option<StoryCard>,
    /// Id of the card whose image is being generated, if any.
    pub generating_card_id: Option<String>,
    pub story_in_flight: bool,
    pub story_starter: Option<String>,
}

/// A story-card game session.
pub struct Session {
    deck: Deck,
    store: DeckFile,
    /// Id of the card whose image job is outstanding, if any.
    generating: Option<String>,
    story_in_flight: bool,
    story_starter: Option<String>,
    notices: Vec<Notice>,
}

impl Session {
    /// Load the stored deck (or fall back to seed data), shuffle it,
    /// and mirror the result back to storage. Returns the session and
    /// the image job for the first card, if it needs one.
    pub async fn init(store: DeckFile) -> (Self, Option<ImageJob>) {
        let loaded = match store.load().await {
            LoadOutcome::Deck(cards) => Some(cards),
            LoadOutcome::Absent | LoadOutcome::UseSeed => None,
        };

        let deck = Deck::from_loaded(loaded, &mut rand::thread_rng());
        let mut session = Self {
            deck,
            store,
            generating: None,
            story_in_flight: false,
            story_starter: None,
            notices: Vec::new(),
        };

        session.persist().await;
        let job = session.claim_image_job();
        (session, job)
    }

    /// Adopt a deck as-is: no shuffle, cursor on the first card,
    /// nothing persisted yet. For tests and state restoration.
    pub fn with_cards(store: DeckFile, cards: Vec<StoryCard>) -> Self {
        Self {
            deck: Deck::from_cards(cards),
            store,
            generating: None,
            story_in_flight: false,
            story_starter: None,
            notices: Vec::new(),
        }
    }

    /// Show the next card. Returns an image job if the newly current
    /// card still needs its image.
    pub async fn advance(&mut self) -> Option<ImageJob> {
        if self.deck.is_empty() {
            return None;
        }
        self.deck.advance();
        self.story_starter = None;
        self.persist().await;
        self.claim_image_job()
    }

    /// Reshuffle the deck. Returns an image job if the newly current
    /// card still needs its image.
    pub async fn shuffle(&mut self) -> Option<ImageJob> {
        if self.deck.is_empty() {
            return None;
        }
        self.deck.shuffle(&mut rand::thread_rng());
        self.story_starter = None;
        self.notices.push(Notice::info(
            "Deck Shuffled",
            "The cards have been reordered.",
        ));
        self.persist().await;
        self.claim_image_job()
    }

    /// Validate and add a user card; it is prepended and becomes the
    /// current card. On a validation failure nothing is mutated and the
    /// error is also surfaced as a notice.
    pub async fn add_card(&mut self, draft: CardDraft) -> Result<Option<ImageJob>, CardError> {
        let card = match draft.build() {
            Ok(card) => card,
            Err(err) => {
                self.notices.push(validation_notice(&err));
                return Err(err);
            }
        };

        self.deck.insert(card);
        self.story_starter = None;
        self.notices.push(Notice::info(
            "Card Created!",
            "Your spooky new card has been added to the deck.",
        ));
        self.persist().await;
        Ok(self.claim_image_job())
    }

    /// Claim a story job for the current card.
    ///
    /// Returns `None` on an empty deck, while a story is already in
    /// flight, or while the current card's image is still being
    /// generated - a story cannot be told from an image that does not
    /// exist yet.
    pub fn begin_story(&mut self) -> Option<StoryJob> {
        if self.story_in_flight || self.generating.is_some() {
            return None;
        }
        let card = self.deck.current_card()?;
        let job = StoryJob {
            image: card.image.clone(),
            phrase: card.phrase.clone(),
        };
        self.story_in_flight = true;
        self.story_starter = None;
        Some(job)
    }

    /// Commit an image-generation result.
    ///
    /// The result is written to the card with the given id even if the
    /// user has advanced away in the meantime. A failure keeps the
    /// placeholder and surfaces a notice. If the current card is still
    /// on its placeholder, a follow-up job is claimed for it, so
    /// generation resumes immediately after a stale completion. A card
    /// whose generation just failed is not retried until the user
    /// navigates back onto it.
    pub async fn complete_image(
        &mut self,
        card_id: &str,
        result: Result<String, AiError>,
    ) -> Option<ImageJob> {
        self.generating = None;
        match result {
            Ok(data_uri) => {
                if self.deck.update_image(card_id, ImageState::Generated { data_uri }) {
                    self.persist().await;
                }
                self.claim_image_job()
            }
            Err(_) => {
                self.notices.push(Notice::error(
                    "Card Image Error",
                    "Could not generate an image for the card. The placeholder will be used.",
                ));
                if self.deck.current_card().map(|c| c.id.as_str()) == Some(card_id) {
                    None
                } else {
                    self.claim_image_job()
                }
            }
        }
    }

    /// Commit a story-generation result. The deck and cursor are never
    /// mutated by a story request.
    pub fn complete_story(&mut self, result: Result<String, StoryError>) {
        self.story_in_flight = false;
        match result {
            Ok(text) => self.story_starter = Some(text),
            Err(StoryError::Fetch(_)) => {
                self.notices.push(Notice::error(
                    "Card Image Unavailable",
                    "Could not load the card image for the story. Please try again.",
                ));
            }
            Err(StoryError::Service(_)) => {
                self.notices.push(Notice::error(
                    "AI Story Error",
                    "Could not generate a story starter. Please try again.",
                ));
            }
        }
    }

    /// If the current card still shows a placeholder and no generation
    /// is in flight, claim a job for it and set the in-flight flag.
    fn claim_image_job(&mut self) -> Option<ImageJob> {
        if self.generating.is_some() {
            return None;
        }
        let card = self.deck.current_card()?;
        if !card.image.is_placeholder() {
            return None;
        }
        let job = ImageJob {
            card_id: card.id.clone(),
            image_hint: card.image_hint.clone(),
        };
        self.generating = Some(card.id.clone());
        Some(job)
    }

    /// Mirror the deck to storage. Failure never rolls back the
    /// mutation; the in-memory deck stays the source of truth and the
    /// user is told the snapshot may not survive a reload.
    async fn persist(&mut self) {
        if self.store.save(self.deck.cards()).await.is_err() {
            self.notices.push(Notice::error(
                "Storage Warning",
                "Some generated images may not persist across sessions.",
            ));
        }
    }

    /// Take all pending notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Read-only view for rendering.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            deck_len: self.deck.len(),
            current_index: self.deck.current_index(),
            current_card: self.deck.current_card().cloned(),
            generating_card_id: self.generating.clone(),
            story_in_flight: self.story_in_flight,
            story_starter: self.story_starter.clone(),
        }
    }

    pub fn cards(&self) -> &[StoryCard] {
        self.deck.cards()
    }

    pub fn current_index(&self) -> usize {
        self.deck.current_index()
    }

    pub fn current_card(&self) -> Option<&StoryCard> {
        self.deck.current_card()
    }

    pub fn image_in_flight(&self) -> bool {
        self.generating.is_some()
    }

    /// Id of the card whose image job is outstanding, if any.
    pub fn generating_card_id(&self) -> Option<&str> {
        self.generating.as_deref()
    }

    pub fn story_in_flight(&self) -> bool {
        self.story_in_flight
    }

    pub fn story_starter(&self) -> Option<&str> {
        self.story_starter.as_deref()
    }
}

/// Run a claimed image job against the image service.
pub async fn run_image_job(job: &ImageJob, ai: &impl TaleAi) -> Result<String, AiError> {
    ai.generate_card_image(&job.image_hint).await
}

/// Run a claimed story job: inline images pass through, a placeholder
/// is fetched and re-encoded first, then the story service is called.
pub async fn run_story_job(
    job: &StoryJob,
    ai: &impl TaleAi,
    fetcher: &impl Fetcher,
) -> Result<String, StoryError> {
    let data_uri = match &job.image {
        ImageState::Placeholder { url } => fetcher.fetch_as_data_uri(url).await?,
        ImageState::Generated { data_uri } | ImageState::Uploaded { data_uri } => data_uri.clone(),
    };
    Ok(ai.generate_story_starter(&data_uri, &job.phrase).await?)
}

fn validation_notice(err: &CardError) -> Notice {
    match err {
        CardError::EmptyPhrase => {
            Notice::error("Missing Phrase", "Please provide a phrase for your card.")
        }
        CardError::PhraseTooLong => Notice::error(
            "Phrase Too Long",
            "Please keep the phrase to 100 characters or fewer.",
        ),
        CardError::EmptyHint => Notice::error(
            "Missing Image Hint",
            "Please provide an image hint (for AI & alt text).",
        ),
        CardError::MissingImage => {
            Notice::error("Missing Image", "Please upload an image for your card.")
        }
        CardError::InvalidImage => Notice::error(
            "Unreadable Image",
            "The selected image could not be read as an inline image.",
        ),
        CardError::ImageTooLarge => Notice::error(
            "Image Too Large",
            "Please select an image smaller than 2MB.",
        ),
    }
}
