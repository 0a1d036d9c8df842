//! Minimal Google Gemini API client.
//!
//! This crate provides a focused client for the `generateContent`
//! endpoint with:
//! - Text and inline-image (base64) request parts
//! - Image response modalities for image-capable models
//! - Typed error handling

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Errors that can occur when using the Gemini client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Gemini API client.
#[derive(Clone)]
pub struct Gemini {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl Gemini {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create a Gemini client from the GEMINI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send a generateContent request and return the full response.
    pub async fn generate(&self, request: Request) -> Result<Response, Error> {
        let model = request.model.as_deref().unwrap_or(&self.model).to_string();
        let api_request = build_api_request(&request);
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{API_BASE}/models/{model}:generateContent"))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        parse_response(api_response)
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

/// A generateContent request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Model override; falls back to the client default.
    pub model: Option<String>,

    /// Content parts of the single user turn.
    pub parts: Vec<Part>,

    /// Response modalities (e.g. TEXT + IMAGE for image models).
    pub response_modalities: Vec<Modality>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_output_tokens: Option<u32>,
}

impl Request {
    /// Create a request from a single text prompt.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Text(prompt.into())],
            ..Default::default()
        }
    }

    /// Add an inline base64-encoded data part.
    pub fn with_inline_data(
        mut self,
        mime_type: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        self.parts.push(Part::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        });
        self
    }

    /// Set the model for this request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Request the given response modalities.
    pub fn with_response_modalities(mut self, modalities: Vec<Modality>) -> Self {
        self.response_modalities = modalities;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A single content part, in a request or a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Plain text.
    Text(String),
    /// Base64-encoded inline bytes with a MIME type.
    InlineData { mime_type: String, data: String },
}

/// Response modality for models that can emit more than text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Image,
}

/// A parsed generateContent response.
#[derive(Debug, Clone)]
pub struct Response {
    /// Content parts of the first candidate.
    pub parts: Vec<Part>,
}

impl Response {
    /// Concatenated text of all text parts, if any.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// First inline-data part as (mime_type, base64 data), if any.
    pub fn inline_data(&self) -> Option<(&str, &str)> {
        self.parts.iter().find_map(|p| match p {
            Part::InlineData { mime_type, data } => Some((mime_type.as_str(), data.as_str())),
            _ => None,
        })
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Serialize)]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct ApiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ApiPart>,
}

#[derive(Serialize, Deserialize)]
struct ApiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<ApiInlineData>,
}

#[derive(Serialize, Deserialize)]
struct ApiInlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(
        rename = "responseModalities",
        skip_serializing_if = "Vec::is_empty"
    )]
    response_modalities: Vec<Modality>,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Deserialize)]
struct ApiCandidate {
    content: Option<ApiContent>,
}

fn build_api_request(request: &Request) -> ApiRequest {
    let parts = request
        .parts
        .iter()
        .map(|p| match p {
            Part::Text(t) => ApiPart {
                text: Some(t.clone()),
                inline_data: None,
            },
            Part::InlineData { mime_type, data } => ApiPart {
                text: None,
                inline_data: Some(ApiInlineData {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                }),
            },
        })
        .collect();

    let generation_config = if request.temperature.is_none()
        && request.max_output_tokens.is_none()
        && request.response_modalities.is_empty()
    {
        None
    } else {
        Some(ApiGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
            response_modalities: request.response_modalities.clone(),
        })
    };

    ApiRequest {
        contents: vec![ApiContent {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config,
    }
}

fn parse_response(api: ApiResponse) -> Result<Response, Error> {
    let candidate = api
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("response contained no candidates".to_string()))?;

    let content = candidate
        .content
        .ok_or_else(|| Error::Parse("candidate contained no content".to_string()))?;

    let parts = content
        .parts
        .into_iter()
        .filter_map(|p| {
            if let Some(text) = p.text {
                Some(Part::Text(text))
            } else {
                p.inline_data.map(|d| Part::InlineData {
                    mime_type: d.mime_type,
                    data: d.data,
                })
            }
        })
        .collect();

    Ok(Response { parts })
}
