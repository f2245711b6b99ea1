//! GeminiService - generateContent エンドポイントへの HTTP 実装
//!
//! - 認証は `x-goog-api-key` ヘッダ
//! - 2xx 以外とネットワーク障害はすべて `CompletionError::Unreachable`
//! - ボディの解釈はしない（`completion::CompletionClient` の仕事）

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::completion::wire::GenerateContentRequest;
use crate::domain::CompletionError;
use crate::ports::CompletionService;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

pub struct GeminiService {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiService {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout.max(Duration::from_millis(1)))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionService for GeminiService {
    async fn post(&self, prompt: &str) -> Result<String, CompletionError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|err| CompletionError::Unreachable(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| CompletionError::Unreachable(err.to_string()))?;
        debug!(status = status.as_u16(), body_len = body.len(), "completion response");

        if !status.is_success() {
            return Err(CompletionError::Unreachable(format!(
                "status {status}: {}",
                truncate(&body, 200)
            )));
        }
        Ok(body)
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
