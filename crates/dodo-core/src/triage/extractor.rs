//! Task extractor - fail-closed action extraction.

use tracing::{debug, warn};

use super::prompt::extraction_prompt;
use crate::completion::CompletionClient;
use crate::domain::extraction::actions_from;
use crate::domain::{CompletionError, ExtractedAction};

/// Derives the actions a message assigns to one user.
///
/// Garbage in means nothing out: a failed call or a payload without an
/// `actions` array yields no actions rather than guessed ones.
#[derive(Clone)]
pub struct TaskExtractor {
    client: CompletionClient,
}

impl TaskExtractor {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Completion failures are returned so the caller can tell "the model
    /// found nothing" from "the model could not be asked".
    pub async fn try_extract(
        &self,
        user_name: &str,
        subject: &str,
        body: &str,
    ) -> Result<Vec<ExtractedAction>, CompletionError> {
        let prompt = extraction_prompt(user_name, subject, body);
        let payload = self.client.complete(&prompt).await?;
        match actions_from(&payload) {
            Some(actions) => {
                debug!(count = actions.len(), "actions extracted");
                Ok(actions)
            }
            None => {
                warn!("model answer has no actions array");
                Ok(Vec::new())
            }
        }
    }

    /// Never fails: completion errors mean "no actions".
    pub async fn extract(&self, user_name: &str, subject: &str, body: &str) -> Vec<ExtractedAction> {
        self.try_extract(user_name, subject, body)
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "extraction failed");
                Vec::new()
            })
    }
}
