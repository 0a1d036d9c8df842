//! Testing utilities for the deck engine.
//!
//! This module provides tools for integration testing:
//! - `MockAi` with scripted image/story results, no API calls
//! - `MockFetcher` with scripted placeholder fetches
//! - Card builders for placeholder test decks

use crate::ai::{AiError, TaleAi};
use crate::card::{placeholder_url, CardOrigin, ImageState, StoryCard};
use crate::fetch::{FetchError, Fetcher};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock generative service that returns scripted results.
///
/// Results are consumed in queue order; an unscripted call fails with
/// the service's empty-result error so it shows up in assertions.
#[derive(Default)]
pub struct MockAi {
    images: Mutex<VecDeque<Result<String, AiError>>>,
    stories: Mutex<VecDeque<Result<String, AiError>>>,
    image_requests: Mutex<Vec<String>>,
    story_requests: Mutex<Vec<(String, String)>>,
}

impl MockAi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful image generation returning the given data URI.
    pub fn queue_image(&self, data_uri: impl Into<String>) {
        self.images.lock().unwrap().push_back(Ok(data_uri.into()));
    }

    /// Queue a failed image generation.
    pub fn queue_image_failure(&self) {
        self.images.lock().unwrap().push_back(Err(AiError::EmptyImage));
    }

    /// Queue a successful story generation returning the given text.
    pub fn queue_story(&self, text: impl Into<String>) {
        self.stories.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue a failed story generation.
    pub fn queue_story_failure(&self) {
        self.stories.lock().unwrap().push_back(Err(AiError::EmptyStory));
    }

    /// Hints received by the image service, in call order.
    pub fn image_requests(&self) -> Vec<String> {
        self.image_requests.lock().unwrap().clone()
    }

    /// (image, phrase) pairs received by the story service, in call order.
    pub fn story_requests(&self) -> Vec<(String, String)> {
        self.story_requests.lock().unwrap().clone()
    }
}

impl TaleAi for MockAi {
    async fn generate_card_image(&self, hint: &str) -> Result<String, AiError> {
        self.image_requests.lock().unwrap().push(hint.to_string());
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AiError::EmptyImage))
    }

    async fn generate_story_starter(
        &self,
        image_data_uri: &str,
        phrase: &str,
    ) -> Result<String, AiError> {
        self.story_requests
            .lock()
            .unwrap()
            .push((image_data_uri.to_string(), phrase.to_string()));
        self.stories
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AiError::EmptyStory))
    }
}

/// A mock placeholder fetcher with scripted results.
#[derive(Default)]
pub struct MockFetcher {
    results: Mutex<VecDeque<Result<String, FetchError>>>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful fetch returning the given data URI.
    pub fn queue_ok(&self, data_uri: impl Into<String>) {
        self.results.lock().unwrap().push_back(Ok(data_uri.into()));
    }

    /// Queue a failed fetch.
    pub fn queue_failure(&self) {
        self.results
            .lock()
            .unwrap()
            .push_back(Err(FetchError::Status(404)));
    }

    /// URLs requested, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch_as_data_uri(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FetchError::Empty))
    }
}

/// A seed card still showing its placeholder.
pub fn placeholder_card(id: &str, phrase: &str, hint: &str) -> StoryCard {
    StoryCard {
        id: id.to_string(),
        origin: CardOrigin::Seed,
        image: ImageState::Placeholder {
            url: placeholder_url(0),
        },
        phrase: phrase.to_string(),
        image_hint: hint.to_string(),
    }
}

/// A user card with an uploaded inline image.
pub fn uploaded_card(id: &str, phrase: &str, hint: &str) -> StoryCard {
    StoryCard {
        id: id.to_string(),
        origin: CardOrigin::User,
        image: ImageState::Uploaded {
            data_uri: "data:image/png;base64,QkJC".to_string(),
        },
        phrase: phrase.to_string(),
        image_hint: hint.to_string(),
    }
}
