use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::repair::recover_json;
use super::wire::candidate_text;
use crate::domain::CompletionError;
use crate::ports::CompletionService;

/// Sends a prompt and recovers the JSON payload of the answer.
///
/// Every failure path is a [`CompletionError`]; callers decide how to
/// degrade.
#[derive(Clone)]
pub struct CompletionClient {
    service: Arc<dyn CompletionService>,
}

impl CompletionClient {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    pub async fn complete(&self, prompt: &str) -> Result<Value, CompletionError> {
        let body = self.service.post(prompt).await?;
        let text = candidate_text(&body)?;
        recover_json(&text).inspect_err(|err| {
            if let CompletionError::MalformedJson { raw } = err {
                warn!(raw_len = raw.len(), "model answer was not recoverable JSON");
                debug!(raw = %raw, "unrecoverable model answer");
            }
        })
    }
}
