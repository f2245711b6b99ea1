//! Triage orchestrator - one run over the recent inbox.
//!
//! Per message: dedup, redact, classify, label, extract, record tasks,
//! mark processed. Model failures degrade to "no result" and are reported,
//! and the message still counts as processed. Store failures skip the
//! message (it stays unprocessed) and are reported. Only a failure to
//! persist the processed-id set aborts the run.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::Settings;
use crate::domain::{
    ExtractedAction, IssueKind, Message, RunId, Stage, StoreError, TaskDraft, TaskRecord,
    TriageReport, Urgency,
};
use crate::error::DodoError;
use crate::ports::{Clock, IdGenerator, MessageStore, PropertyStore, TaskStore};
use crate::seen::SeenStore;
use crate::triage::{Classifier, TaskExtractor, redact};

pub struct TriageOrchestrator {
    pub(crate) settings: Arc<Settings>,
    pub(crate) messages: Arc<dyn MessageStore>,
    pub(crate) tasks: Arc<dyn TaskStore>,
    pub(crate) properties: Arc<dyn PropertyStore>,
    pub(crate) classifier: Classifier,
    pub(crate) extractor: TaskExtractor,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Arc<dyn IdGenerator>,
}

impl TriageOrchestrator {
    pub async fn run(&self) -> Result<TriageReport, DodoError> {
        let run_id = self.ids.generate_run_id();
        self.run_inner(run_id)
            .instrument(info_span!("triage_run", run_id = %run_id))
            .await
    }

    async fn run_inner(&self, run_id: RunId) -> Result<TriageReport, DodoError> {
        let mut report = TriageReport::new(run_id);
        let seen = SeenStore::new(self.properties.as_ref(), self.settings.max_remembered_ids);
        let mut processed = seen.load().await?;

        let candidates = self.recent_threads(self.settings.batch_size).await?;
        if candidates.is_empty() {
            info!("inbox is empty, nothing to triage");
        }
        let allowed = self.allowed_labels().await;
        debug!(candidates = candidates.len(), allowed = allowed.len(), "triage batch loaded");

        for message in &candidates {
            if processed.contains(&message.id) {
                report.skipped_count += 1;
                continue;
            }
            match self.triage_message(message, &allowed, &mut report).await {
                Ok(tasks) => {
                    processed.insert(message.id.clone());
                    report.processed_count += 1;
                    report.tasks_created += tasks;
                    seen.save(&processed).await.map_err(DodoError::Persist)?;
                }
                Err(err) => {
                    warn!(message_id = %message.id, error = %err, "store failure, message left unprocessed");
                    report.record_issue(&message.id, IssueKind::from(&err));
                }
            }
        }

        seen.save(&processed).await.map_err(DodoError::Persist)?;
        info!(
            processed = report.processed_count,
            tasks_created = report.tasks_created,
            skipped = report.skipped_count,
            issues = report.errors.len(),
            "triage run finished"
        );
        Ok(report)
    }

    /// Returns the number of tasks recorded for `message`.
    async fn triage_message(
        &self,
        message: &Message,
        allowed: &[String],
        report: &mut TriageReport,
    ) -> Result<usize, StoreError> {
        let subject = redact(&message.subject);
        let body = redact(&message.plain_text());
        info!(message_id = %message.id, subject = %subject, "triaging message");

        let mut current = self.messages.get_labels(&message.id).await?;

        let label = self
            .classifier
            .classify_detailed(allowed, &subject, &body)
            .await
            .unwrap_or_else(|err| {
                warn!(message_id = %message.id, error = %err, "classification degraded to no label");
                report.record_issue(&message.id, IssueKind::from(&err));
                None
            });
        if let Some(label) = label {
            self.ensure_label(message, &mut current, &label).await?;
        }
        self.ensure_label(message, &mut current, &self.settings.labels.seen)
            .await?;

        let actions = self
            .extractor
            .try_extract(&self.settings.user_name, &subject, &body)
            .await
            .unwrap_or_else(|err| {
                warn!(message_id = %message.id, error = %err, "extraction degraded to no actions");
                report.record_issue(&message.id, IssueKind::from(&err));
                Vec::new()
            });
        if actions.is_empty() {
            return Ok(0);
        }

        self.ensure_label(message, &mut current, &self.settings.labels.action)
            .await?;
        for action in &actions {
            let record = self.pending_record(message, &subject, action);
            debug!(message_id = %message.id, task_id = %record.id, "appending pending task");
            self.tasks.append_record(Stage::Pending, record).await?;
        }
        info!(message_id = %message.id, tasks = actions.len(), "tasks created");
        Ok(actions.len())
    }

    /// Latest message of each of the `threads` most recent threads.
    ///
    /// The store pages by message, so the window is widened until enough
    /// distinct threads show up or the inbox runs out.
    async fn recent_threads(&self, threads: usize) -> Result<Vec<Message>, StoreError> {
        let mut limit = threads;
        loop {
            let batch = self.messages.list_recent_messages(limit).await?;
            let exhausted = batch.len() < limit;
            let mut candidates = latest_per_thread(batch);
            if candidates.len() >= threads || exhausted {
                candidates.truncate(threads);
                return Ok(candidates);
            }
            debug!(limit, threads = candidates.len(), "widening inbox window");
            limit = limit.saturating_mul(2);
        }
    }

    /// Applies `label` unless the message already carries it.
    async fn ensure_label(
        &self,
        message: &Message,
        current: &mut BTreeSet<String>,
        label: &str,
    ) -> Result<(), StoreError> {
        if current.contains(label) {
            return Ok(());
        }
        self.messages.apply_label(&message.id, label).await?;
        current.insert(label.to_string());
        debug!(message_id = %message.id, label, "label applied");
        Ok(())
    }

    fn pending_record(
        &self,
        message: &Message,
        redacted_subject: &str,
        action: &ExtractedAction,
    ) -> TaskRecord {
        let urgency = Urgency::parse(&action.urgency).unwrap_or_else(|| {
            if !action.urgency.is_empty() {
                warn!(
                    message_id = %message.id,
                    urgency = %action.urgency,
                    fallback = %self.settings.unknown_urgency,
                    "unknown urgency from model"
                );
            }
            self.settings.unknown_urgency
        });
        TaskRecord::pending(
            self.ids.generate_task_id(),
            self.clock.now(),
            TaskDraft {
                subject: redacted_subject.to_string(),
                description: action.task.clone(),
                urgency,
                due_date: action.due_date,
                source_link: message.link.clone(),
                message_id: message.id.clone(),
            },
        )
    }

    /// Labels the classifier may choose from: every label the mailbox knows,
    /// narrowed to the configured list when there is one. Configured labels
    /// the mailbox does not have are never created. Marker labels are never
    /// candidates.
    async fn allowed_labels(&self) -> Vec<String> {
        let known = match self.messages.list_all_label_names().await {
            Ok(labels) => labels,
            Err(err) => {
                warn!(error = %err, "could not list labels, classification disabled for this run");
                return Vec::new();
            }
        };
        let markers = self.settings.marker_labels();
        let candidate = |label: &str| !label.is_empty() && !markers.contains(&label);

        let mut allowed: Vec<String> = match &self.settings.allowed_labels {
            Some(configured) => configured
                .iter()
                .map(|label| label.trim())
                .filter(|label| candidate(*label))
                .filter(|label| {
                    let exists = known.contains(*label);
                    if !exists {
                        warn!(label = *label, "configured label does not exist in the mailbox, ignored");
                    }
                    exists
                })
                .map(str::to_string)
                .collect(),
            None => known
                .iter()
                .map(|label| label.trim())
                .filter(|label| candidate(*label))
                .map(str::to_string)
                .collect(),
        };
        allowed.sort();
        allowed.dedup();
        allowed
    }
}

/// Keeps the latest message of each thread, in order of first appearance.
fn latest_per_thread(messages: Vec<Message>) -> Vec<Message> {
    let mut order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, Message> = HashMap::new();
    for message in messages {
        match latest.entry(message.thread_id.clone()) {
            Entry::Vacant(slot) => {
                order.push(message.thread_id.clone());
                slot.insert(message);
            }
            Entry::Occupied(mut slot) => {
                if message.received_at > slot.get().received_at {
                    slot.insert(message);
                }
            }
        }
    }
    order
        .into_iter()
        .filter_map(|thread| latest.remove(&thread))
        .collect()
}
