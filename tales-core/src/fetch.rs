//! Fetching a remote placeholder image and re-encoding it inline.
//!
//! The story service only accepts inline images, so a card still on its
//! placeholder has the placeholder bytes fetched and wrapped in a data
//! URI before the story request goes out.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use thiserror::Error;

/// Errors from fetching a remote image.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Fetch failed with status {0}")]
    Status(u16),

    #[error("Fetched image was empty")]
    Empty,
}

/// Turns a remote image URL into an inline data URI.
pub trait Fetcher {
    fn fetch_as_data_uri(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// HTTP implementation of [`Fetcher`].
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch_as_data_uri(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if bytes.is_empty() {
            return Err(FetchError::Empty);
        }

        Ok(format!("data:{mime_type};base64,{}", BASE64.encode(&bytes)))
    }
}
