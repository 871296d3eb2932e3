use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error, warn};

use super::types::{Content, GenerateContentRequest, GenerateContentResponse, Part};
use super::{TextGenerator, UpstreamStatusError, build_http_client};
use crate::config::LlmConfig;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-goog-api-key");

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    inner: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let inner = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            inner,
        })
    }

    pub fn with_llm_config(mut self, cfg: &LlmConfig) -> Result<Self> {
        self.inner = build_http_client(cfg)?;
        Ok(self)
    }

    fn endpoint(&self) -> String {
        let mut base = self.base_url.trim_end_matches('/').to_string();
        if let Some(pos) = base.rfind("/v1beta") {
            base.truncate(pos);
            base = base.trim_end_matches('/').to_string();
        }
        format!("{base}/v1beta/models/{}:generateContent", self.model)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            API_KEY_HEADER,
            self.api_key
                .parse()
                .context("api key is not a valid header value")?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        let req = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };
        debug!(endpoint=%url, model=%self.model, prompt_len = prompt.len(), "sending generateContent request");

        let resp = self
            .inner
            .post(&url)
            .headers(self.headers()?)
            .json(&req)
            .send()
            .await
            .context("send generateContent request")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(status=%status.as_u16(), body=%body, "generateContent non-success status");
            return Err(UpstreamStatusError {
                provider: "gemini",
                status,
                body,
            }
            .into());
        }
        let body: GenerateContentResponse = resp
            .json()
            .await
            .context("parse generateContent response")?;
        if let Some(usage) = &body.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                candidates_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                finish_reason = ?body.candidates.first().and_then(|c| c.finish_reason.as_deref()),
                "generateContent usage"
            );
        }
        if let Some(reason) = body
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            warn!(block_reason = reason, "prompt blocked by model");
            anyhow::bail!("prompt blocked: {reason}");
        }
        body.text().context("no candidates returned")
    }

    fn model(&self) -> &str {
        &self.model
    }
}
