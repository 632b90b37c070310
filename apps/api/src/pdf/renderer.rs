//! Client for the external PDF rendering service.
//!
//! One request per letter, no retry: a failed render is reported to the
//! user, who can simply ask for the PDF again.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::errors::AppError;
use crate::pdf::document::LetterDocument;

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, document: &LetterDocument) -> Result<Bytes, AppError>;
}

#[derive(Clone)]
pub struct HttpPdfRenderer {
    client: Client,
    render_url: String,
}

impl HttpPdfRenderer {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .context("Failed to build HTTP client for the PDF renderer")?,
            render_url: format!("{}/render", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render(&self, document: &LetterDocument) -> Result<Bytes, AppError> {
        debug!("Rendering '{}' via {}", document.title, self.render_url);

        let response = self
            .client
            .post(&self.render_url)
            .json(document)
            .send()
            .await
            .map_err(|e| AppError::Renderer(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Renderer(format!(
                "renderer returned {status}: {body}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| AppError::Renderer(format!("failed to read PDF body: {e}")))
    }
}
