//! The external translation capability.
//!
//! Models are served by an inference server speaking the Hugging Face
//! protocol (`POST {base}/models/{id}` with `{"inputs": ...}`), which is how
//! pretrained OPUS-MT pipelines are hosted. The gateway treats it as a black
//! box: one call in, one translated string out.

use std::time::Duration;

use anyhow::Context as AnyhowContext;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Url};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::error::Result;

/// Input used by the registry's acquisition probe at startup.
const WARMUP_PROMPT: &str = "warmup";

/// Longest upstream body fragment echoed back in error messages.
const ERROR_SNIPPET_LEN: usize = 500;

/// Errors produced by the external translation capability.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference server returned status {status}: {snippet}")]
    Status { status: u16, snippet: String },

    #[error("inference server returned no translation segments")]
    EmptyResponse,
}

/// A loaded translation capability for exactly one language pair.
///
/// Every call performs one inference round-trip; nothing above this trait
/// caches, batches, deduplicates or retries.
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Translate `text`, returning the first produced segment.
    async fn translate(&self, text: &str) -> Result<String, EngineError>;
}

/// Outbound HTTP state shared by every per-model engine: one pooled client
/// and the normalized inference-server base URL.
#[derive(Debug, Clone)]
pub struct EngineClient {
    client: Client,
    base: Url,
}

impl EngineClient {
    /// Build the shared client. `token`, when present, is sent as a bearer
    /// `Authorization` header on every inference request.
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            default_headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }

        let client = ClientBuilder::new()
            .default_headers(default_headers)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        let mut base: Url = base_url
            .parse()
            .with_context(|| format!("parsing inference server url `{base_url}`"))?;
        // `Url::join` drops the last path segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { client, base })
    }

    /// Bind the shared client to one model's inference endpoint.
    pub fn engine_for(&self, model_id: &str) -> Result<HttpEngine> {
        let endpoint = self
            .base
            .join(&format!("models/{model_id}"))
            .with_context(|| format!("building inference url for `{model_id}`"))?;

        Ok(HttpEngine {
            client: self.client.clone(),
            endpoint,
            model_id: model_id.to_owned(),
        })
    }
}

/// HTTP-backed [`TranslationEngine`] for a single model.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: Client,
    endpoint: Url,
    model_id: String,
}

/// One element of the inference server's response array.
#[derive(Debug, Deserialize)]
struct TranslationSegment {
    translation_text: String,
}

impl HttpEngine {
    /// One minimal round-trip to confirm the upstream actually serves this
    /// model. Registry construction treats failure as "model unavailable".
    pub async fn warmup(&self) -> Result<(), EngineError> {
        self.translate(WARMUP_PROMPT).await.map(|_| ())
    }
}

#[async_trait]
impl TranslationEngine for HttpEngine {
    async fn translate(&self, text: &str) -> Result<String, EngineError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "inputs": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_SNIPPET_LEN).collect();
            tracing::warn!(
                "inference error from {}: status={} body_len={} snippet={}",
                self.model_id,
                status,
                body.len(),
                snippet
            );
            return Err(EngineError::Status {
                status: status.as_u16(),
                snippet,
            });
        }

        let segments: Vec<TranslationSegment> = response.json().await?;
        match segments.into_iter().next() {
            Some(segment) => Ok(segment.translation_text),
            None => Err(EngineError::EmptyResponse),
        }
    }
}
