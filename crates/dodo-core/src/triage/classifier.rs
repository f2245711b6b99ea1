//! Classifier - closed-world label choice.

use tracing::{debug, warn};

use super::prompt::classification_prompt;
use crate::completion::CompletionClient;
use crate::domain::CompletionError;
use crate::domain::extraction::label_from;

/// Picks at most one label from a caller-supplied set.
///
/// The model's answer is only trusted when it names a member of the set;
/// the returned label always uses the set's casing.
#[derive(Clone)]
pub struct Classifier {
    client: CompletionClient,
}

impl Classifier {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Like [`classify`](Self::classify) but reports why no label came back
    /// when the completion call itself failed.
    ///
    /// An empty `allowed_labels` never reaches the completion service.
    pub async fn classify_detailed(
        &self,
        allowed_labels: &[String],
        subject: &str,
        body: &str,
    ) -> Result<Option<String>, CompletionError> {
        if allowed_labels.is_empty() {
            return Ok(None);
        }
        let prompt = classification_prompt(allowed_labels, subject, body);
        let payload = self.client.complete(&prompt).await?;

        let Some(answer) = label_from(&payload) else {
            debug!("model chose no label");
            return Ok(None);
        };
        let folded = answer.to_lowercase();
        let canonical = allowed_labels
            .iter()
            .find(|allowed| allowed.to_lowercase() == folded)
            .cloned();
        if canonical.is_none() {
            warn!(answer, "model answered with a label outside the allowed set");
        }
        Ok(canonical)
    }

    /// Never fails: completion errors mean "no label".
    pub async fn classify(&self, allowed_labels: &[String], subject: &str, body: &str) -> Option<String> {
        self.classify_detailed(allowed_labels, subject, body)
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "classification failed");
                None
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::scripted::{ScriptedCompletionService, envelope};
    use rstest::rstest;
    use std::sync::Arc;

    fn labels() -> Vec<String> {
        vec![
            "Finance".into(),
            "Travel".into(),
            "Work/Projects".into(),
            "Équipe".into(),
        ]
    }

    fn classifier(answer: Result<String, CompletionError>) -> (Classifier, Arc<ScriptedCompletionService>) {
        let service = Arc::new(ScriptedCompletionService::new().otherwise(answer));
        let classifier = Classifier::new(CompletionClient::new(service.clone()));
        (classifier, service)
    }

    #[rstest]
    #[case::exact(r#"{"label": "Finance"}"#, Some("Finance"))]
    #[case::lowercase(r#"{"label": "finance"}"#, Some("Finance"))]
    #[case::shouting(r#"{"label": "WORK/PROJECTS"}"#, Some("Work/Projects"))]
    #[case::accented_lowercase(r#"{"label": "équipe"}"#, Some("Équipe"))]
    #[case::accented_uppercase(r#"{"label": "ÉQUIPE"}"#, Some("Équipe"))]
    #[case::none(r#"{"label": "none"}"#, None)]
    #[case::invented(r#"{"label": "Receipts"}"#, None)]
    #[case::near_miss(r#"{"label": "Finances"}"#, None)]
    #[case::missing_field(r#"{"category": "Finance"}"#, None)]
    #[case::not_json("Finance, obviously.", None)]
    #[tokio::test]
    async fn closed_world(#[case] answer: &str, #[case] expected: Option<&str>) {
        let (classifier, _) = classifier(Ok(envelope(answer)));
        let got = classifier.classify(&labels(), "subject", "body").await;
        assert_eq!(got.as_deref(), expected);
    }

    #[tokio::test]
    async fn service_failure_is_no_label() {
        let (classifier, _) = classifier(Err(CompletionError::Unreachable("timeout".into())));
        assert_eq!(classifier.classify(&labels(), "s", "b").await, None);

        assert_eq!(
            classifier.classify_detailed(&labels(), "s", "b").await,
            Err(CompletionError::Unreachable("timeout".into()))
        );
    }

    #[tokio::test]
    async fn empty_label_set_skips_the_call() {
        let (classifier, service) = classifier(Ok(envelope(r#"{"label": "Finance"}"#)));
        assert_eq!(classifier.classify(&[], "s", "b").await, None);
        assert!(service.prompts().await.is_empty());
    }
}
