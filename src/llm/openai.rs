use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, error};

use super::types::{ChatMessage, ChatRequest, ChatResponse};
use super::{TextGenerator, UpstreamStatusError, build_http_client};
use crate::config::LlmConfig;

/// Client for OpenAI-compatible `chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    inner: reqwest::Client,
}

impl OpenAIClient {
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
        if let Some(pos) = base.rfind("/v1") {
            base.truncate(pos);
            base = base.trim_end_matches('/').to_string();
        }
        format!("{base}/v1/chat/completions")
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", self.api_key)
                .parse()
                .context("api key is not a valid header value")?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl TextGenerator for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        let req = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
        };
        debug!(endpoint=%url, model=%self.model, prompt_len = prompt.len(), "sending chat.completions request");

        let resp = self
            .inner
            .post(&url)
            .headers(self.headers()?)
            .json(&req)
            .send()
            .await
            .context("send chat request")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(status=%status.as_u16(), body=%body, "chat.completions non-success status");
            return Err(UpstreamStatusError {
                provider: "openai",
                status,
                body,
            }
            .into());
        }
        let body: ChatResponse = resp.json().await.context("parse chat response")?;
        if let Some(usage) = &body.usage {
            debug!(
                id = ?body.id,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "chat.completions usage"
            );
        }
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("no choices returned")
    }

    fn model(&self) -> &str {
        &self.model
    }
}
