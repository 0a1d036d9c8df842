//! Generative AI seam: card image and story-starter generation.
//!
//! [`TaleAi`] is the trait the session's jobs run against; the real
//! implementation is [`Storyteller`], a thin wrapper over the Gemini
//! client. Tests use the scripted mock in [`crate::testing`].

use gemini::{Gemini, Modality, Request};
use std::future::Future;
use thiserror::Error;

const IMAGE_MODEL: &str = "gemini-2.0-flash-exp";
const STORY_MODEL: &str = "gemini-2.0-flash";

/// Errors from the generative services.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Gemini error: {0}")]
    Gemini(#[from] gemini::Error),

    #[error("Image generation returned no usable image")]
    EmptyImage,

    #[error("Story generation returned no text")]
    EmptyStory,

    #[error("Card image is not an inline data URI: {0}")]
    InvalidImage(String),
}

/// The two generative calls the deck engine makes.
pub trait TaleAi {
    /// Generate a card image from a one- or two-word hint, returned as
    /// an inline data URI.
    fn generate_card_image(
        &self,
        hint: &str,
    ) -> impl Future<Output = Result<String, AiError>> + Send;

    /// Generate a story opener from an inline card image and its phrase.
    fn generate_story_starter(
        &self,
        image_data_uri: &str,
        phrase: &str,
    ) -> impl Future<Output = Result<String, AiError>> + Send;
}

/// Gemini-backed implementation of [`TaleAi`].
#[derive(Clone)]
pub struct Storyteller {
    client: Gemini,
}

impl Storyteller {
    pub fn new(client: Gemini) -> Self {
        Self { client }
    }

    /// Create a storyteller from the GEMINI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, AiError> {
        Ok(Self::new(Gemini::from_env()?))
    }
}

impl TaleAi for Storyteller {
    async fn generate_card_image(&self, hint: &str) -> Result<String, AiError> {
        let prompt = format!(
            "Generate a very simple, minimalist, basic line drawing or sketch based on the \
             following hint: \"{hint}\". The style should be abstract and icon-like, suitable \
             for a spooky story card. Avoid complex details and colors; monochrome or duotone \
             with dark, muted colors is preferred. The drawing should be symbolic and \
             evocative, focusing on shapes and atmosphere rather than realism. Ensure the \
             output is just the image."
        );

        let request = Request::text(prompt)
            .with_model(IMAGE_MODEL)
            .with_response_modalities(vec![Modality::Text, Modality::Image]);

        let response = self.client.generate(request).await?;
        let (mime_type, data) = response.inline_data().ok_or(AiError::EmptyImage)?;
        if data.trim().is_empty() {
            return Err(AiError::EmptyImage);
        }
        Ok(format!("data:{mime_type};base64,{data}"))
    }

    async fn generate_story_starter(
        &self,
        image_data_uri: &str,
        phrase: &str,
    ) -> Result<String, AiError> {
        let (mime_type, data) = split_data_uri(image_data_uri)
            .ok_or_else(|| AiError::InvalidImage(image_data_uri.chars().take(40).collect()))?;

        let prompt = format!(
            "You are a creative story writer, skilled at crafting compelling opening lines.\n\n\
             Based on the image and phrase provided, write a story starter that sparks \
             imagination.\n\nPhrase: {phrase}\n\nStory Starter:"
        );

        let request = Request::text(prompt)
            .with_model(STORY_MODEL)
            .with_inline_data(mime_type, data)
            .with_temperature(0.8);

        let response = self.client.generate(request).await?;
        let starter = response.text().ok_or(AiError::EmptyStory)?;
        let starter = starter.trim().to_string();
        if starter.is_empty() {
            return Err(AiError::EmptyStory);
        }
        Ok(starter)
    }
}

/// Split a `data:<mime>;base64,<payload>` URI into its MIME type and
/// base64 payload.
fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime_type, data) = rest.split_once(";base64,")?;
    if mime_type.is_empty() || data.is_empty() {
        return None;
    }
    Some((mime_type, data))
}
