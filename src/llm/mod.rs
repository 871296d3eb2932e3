mod gemini;
mod openai;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::{AppConfig, LlmConfig, Provider};

pub use gemini::GeminiClient;
pub use openai::OpenAIClient;

/// Single-shot text generation against a hosted language model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one prompt and wait for the complete reply text.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;
}

/// Upstream answered with a non-success HTTP status.
#[derive(Debug, Error)]
#[error("{provider} error: {status} - {body}")]
pub struct UpstreamStatusError {
    pub provider: &'static str,
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmErrorKind {
    RateLimited,
    Server,
    Network,
    Timeout,
    Client,
    Deserialize,
    Unknown,
}

/// Bucket an upstream failure for logging. Nothing is retried on the result.
pub fn classify_error(err: &anyhow::Error) -> LlmErrorKind {
    if let Some(upstream) = err.downcast_ref::<UpstreamStatusError>() {
        let st = upstream.status;
        if st == StatusCode::TOO_MANY_REQUESTS {
            return LlmErrorKind::RateLimited;
        }
        if st.is_server_error() {
            return LlmErrorKind::Server;
        }
        if st.is_client_error() {
            return LlmErrorKind::Client;
        }
    }
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
            if e.is_timeout() {
                return LlmErrorKind::Timeout;
            }
            if e.is_decode() {
                return LlmErrorKind::Deserialize;
            }
            if e.is_connect() || e.is_body() || e.is_request() {
                return LlmErrorKind::Network;
            }
        }
        if cause.is::<serde_json::Error>() {
            return LlmErrorKind::Deserialize;
        }
    }
    LlmErrorKind::Unknown
}

pub(crate) fn build_http_client(cfg: &LlmConfig) -> Result<reqwest::Client> {
    let mut builder =
        reqwest::Client::builder().connect_timeout(Duration::from_millis(cfg.connect_timeout_ms));
    if let Some(ms) = cfg.request_timeout_ms {
        builder = builder.timeout(Duration::from_millis(ms));
    }
    Ok(builder.build()?)
}

/// Build the generator selected by the resolved configuration.
///
/// Fails when no API key is configured.
pub fn client_from_config(cfg: &AppConfig) -> Result<Arc<dyn TextGenerator>> {
    let api_key = cfg.require_api_key()?;
    let client: Arc<dyn TextGenerator> = match cfg.provider {
        Provider::Gemini => Arc::new(
            GeminiClient::new(cfg.base_url.clone(), api_key, cfg.model.clone())?
                .with_llm_config(&cfg.llm)?,
        ),
        Provider::OpenAi => Arc::new(
            OpenAIClient::new(cfg.base_url.clone(), api_key, cfg.model.clone())?
                .with_llm_config(&cfg.llm)?,
        ),
    };
    Ok(client)
}
