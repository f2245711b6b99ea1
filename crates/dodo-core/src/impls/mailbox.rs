//! MessageStore の実装（メールボックス）
//!
//! # リンク
//! メッセージのリンクはテンプレートの `{id}` を置換して作る。
//! `archive_by_link` は完全一致で探し、見つからなければ末尾の
//! `#inbox/<id>` から ID を取り出して探す。

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::json_file;
use crate::domain::{Message, MessageId, StoreError};
use crate::ports::MessageStore;

pub const DEFAULT_LINK_TEMPLATE: &str = "https://mail.google.com/mail/u/0/#inbox/{id}";

/// One stored message. `link` may be omitted on disk; it is then derived
/// from the mailbox's link template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub thread_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    pub received_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub archived: bool,
}

impl From<Message> for StoredMessage {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            thread_id: m.thread_id,
            subject: m.subject,
            body: m.body,
            html_body: m.html_body,
            received_at: m.received_at,
            link: Some(m.link),
            labels: m.labels,
            archived: false,
        }
    }
}

/// Mailbox contents, also the on-disk layout of [`FileMailbox`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MailboxData {
    /// User-defined label names known to the mailbox.
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

impl MailboxData {
    fn link_for(template: &str, stored: &StoredMessage) -> String {
        stored
            .link
            .clone()
            .unwrap_or_else(|| template.replace("{id}", stored.id.as_str()))
    }

    fn recent(&self, template: &str, limit: usize) -> Vec<Message> {
        let mut live: Vec<&StoredMessage> = self.messages.iter().filter(|m| !m.archived).collect();
        live.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        live.into_iter()
            .take(limit)
            .map(|m| Message {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
                subject: m.subject.clone(),
                body: m.body.clone(),
                html_body: m.html_body.clone(),
                received_at: m.received_at,
                link: Self::link_for(template, m),
                labels: m.labels.clone(),
            })
            .collect()
    }

    fn find_mut(&mut self, id: &MessageId) -> Result<&mut StoredMessage, StoreError> {
        self.messages
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("message {id}")))
    }

    fn labels_of(&self, id: &MessageId) -> Result<BTreeSet<String>, StoreError> {
        self.messages
            .iter()
            .find(|m| &m.id == id)
            .map(|m| m.labels.clone())
            .ok_or_else(|| StoreError::NotFound(format!("message {id}")))
    }

    /// Applying a label the mailbox does not know yet creates it.
    fn apply_label(&mut self, id: &MessageId, label: &str) -> Result<(), StoreError> {
        self.find_mut(id)?.labels.insert(label.to_string());
        self.labels.insert(label.to_string());
        Ok(())
    }

    /// Archives the whole thread of the linked message, so that an older
    /// message of the same thread cannot resurface as the thread's latest.
    fn archive(&mut self, template: &str, link: &str) -> Result<(), StoreError> {
        let by_link = self
            .messages
            .iter()
            .position(|m| Self::link_for(template, m) == link);
        let index = by_link
            .or_else(|| {
                let id = id_from_link(link)?;
                self.messages.iter().position(|m| m.id.as_str() == id)
            })
            .ok_or_else(|| StoreError::NotFound(format!("no message behind link {link}")))?;
        let thread_id = self.messages[index].thread_id.clone();
        let mut archived = 0;
        for message in self.messages.iter_mut().filter(|m| m.thread_id == thread_id) {
            if !message.archived {
                message.archived = true;
                archived += 1;
            }
        }
        if archived == 0 {
            debug!(thread_id, "thread already archived");
        }
        Ok(())
    }
}

/// `.../#inbox/<id>` -> `<id>`
fn id_from_link(link: &str) -> Option<&str> {
    let (_, id) = link.rsplit_once("#inbox/")?;
    let id = id.trim_end_matches('/');
    (!id.is_empty()).then_some(id)
}

/// InMemoryMailbox はテスト用
///
/// - `archive_calls()` で `archive_by_link` の呼び出し履歴を確認できる
/// - `set_read_only(true)` で以降のラベル付与・アーカイブを `WriteFailed` にできる
pub struct InMemoryMailbox {
    data: Mutex<MailboxData>,
    link_template: String,
    archive_calls: Mutex<Vec<String>>,
    read_only: AtomicBool,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(MailboxData::default()),
            link_template: DEFAULT_LINK_TEMPLATE.to_string(),
            archive_calls: Mutex::new(Vec::new()),
            read_only: AtomicBool::new(false),
        }
    }

    pub fn with_labels<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data = MailboxData {
            labels: labels.into_iter().map(Into::into).collect(),
            messages: self.data.into_inner().messages,
        };
        Self {
            data: Mutex::new(data),
            ..self
        }
    }

    pub async fn deliver(&self, message: Message) {
        self.data.lock().await.messages.push(message.into());
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub async fn archive_calls(&self) -> Vec<String> {
        self.archive_calls.lock().await.clone()
    }

    pub async fn is_archived(&self, id: &MessageId) -> bool {
        self.data
            .lock()
            .await
            .messages
            .iter()
            .any(|m| &m.id == id && m.archived)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            Err(StoreError::WriteFailed("mailbox is read-only".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMailbox {
    async fn list_recent_messages(&self, limit: usize) -> Result<Vec<Message>, StoreError> {
        Ok(self.data.lock().await.recent(&self.link_template, limit))
    }

    async fn get_labels(&self, id: &MessageId) -> Result<BTreeSet<String>, StoreError> {
        self.data.lock().await.labels_of(id)
    }

    async fn apply_label(&self, id: &MessageId, label: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.data.lock().await.apply_label(id, label)
    }

    async fn list_all_label_names(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.data.lock().await.labels.clone())
    }

    async fn archive_by_link(&self, link: &str) -> Result<(), StoreError> {
        self.archive_calls.lock().await.push(link.to_string());
        self.check_writable()?;
        self.data.lock().await.archive(&self.link_template, link)
    }
}

/// FileMailbox は JSON ファイル 1 つ（`MailboxData`）
pub struct FileMailbox {
    path: PathBuf,
    link_template: String,
    lock: Mutex<()>,
}

impl FileMailbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_link_template(path, DEFAULT_LINK_TEMPLATE)
    }

    pub fn with_link_template(path: impl Into<PathBuf>, link_template: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            link_template: link_template.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<MailboxData, StoreError> {
        json_file::load(&self.path).await
    }

    async fn save(&self, data: &MailboxData) -> Result<(), StoreError> {
        json_file::save(&self.path, data).await
    }
}

#[async_trait]
impl MessageStore for FileMailbox {
    async fn list_recent_messages(&self, limit: usize) -> Result<Vec<Message>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.recent(&self.link_template, limit))
    }

    async fn get_labels(&self, id: &MessageId) -> Result<BTreeSet<String>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load().await?.labels_of(id)
    }

    async fn apply_label(&self, id: &MessageId, label: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;
        if data.labels_of(id)?.contains(label) && data.labels.contains(label) {
            return Ok(());
        }
        data.apply_label(id, label)?;
        self.save(&data).await
    }

    async fn list_all_label_names(&self) -> Result<BTreeSet<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.labels)
    }

    async fn archive_by_link(&self, link: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;
        data.archive(&self.link_template, link)?;
        self.save(&data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn message(id: &str, thread: &str, hour: u32) -> Message {
        Message {
            id: MessageId::new(id),
            thread_id: thread.into(),
            subject: format!("subject {id}"),
            body: "body".into(),
            html_body: None,
            received_at: Utc.with_ymd_and_hms(2025, 9, 8, hour, 0, 0).unwrap(),
            link: DEFAULT_LINK_TEMPLATE.replace("{id}", id),
            labels: BTreeSet::new(),
        }
    }

    #[rstest]
    #[case::gmail("https://mail.google.com/mail/u/0/#inbox/18c2f", Some("18c2f"))]
    #[case::trailing_slash("https://mail.example/#inbox/abc/", Some("abc"))]
    #[case::no_fragment("https://mail.example/abc", None)]
    #[case::empty_id("https://mail.example/#inbox/", None)]
    fn ids_from_links(#[case] link: &str, #[case] expected: Option<&str>) {
        assert_eq!(id_from_link(link), expected);
    }

    #[tokio::test]
    async fn recent_messages_are_newest_first_and_skip_archived() {
        let mailbox = InMemoryMailbox::new();
        mailbox.deliver(message("a", "t1", 8)).await;
        mailbox.deliver(message("b", "t2", 10)).await;
        mailbox.deliver(message("c", "t3", 9)).await;
        mailbox
            .archive_by_link(&DEFAULT_LINK_TEMPLATE.replace("{id}", "c"))
            .await
            .unwrap();

        let recent = mailbox.list_recent_messages(10).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert_eq!(mailbox.list_recent_messages(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn applying_a_label_twice_is_harmless() {
        let mailbox = InMemoryMailbox::new().with_labels(["Finance"]);
        mailbox.deliver(message("a", "t1", 8)).await;
        let id = MessageId::new("a");

        mailbox.apply_label(&id, "AI").await.unwrap();
        mailbox.apply_label(&id, "AI").await.unwrap();

        let labels = mailbox.get_labels(&id).await.unwrap();
        assert_eq!(labels.into_iter().collect::<Vec<_>>(), vec!["AI"]);
        assert!(mailbox.list_all_label_names().await.unwrap().contains("AI"));
    }

    #[tokio::test]
    async fn archiving_one_message_archives_its_thread() {
        let mailbox = InMemoryMailbox::new();
        mailbox.deliver(message("m1", "T", 8)).await;
        mailbox.deliver(message("m2", "T", 9)).await;
        mailbox.deliver(message("other", "U", 7)).await;

        mailbox
            .archive_by_link(&DEFAULT_LINK_TEMPLATE.replace("{id}", "m2"))
            .await
            .unwrap();

        assert!(mailbox.is_archived(&MessageId::new("m1")).await);
        assert!(mailbox.is_archived(&MessageId::new("m2")).await);
        let recent = mailbox.list_recent_messages(10).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["other"]);
    }

    #[tokio::test]
    async fn unknown_message_is_not_found() {
        let mailbox = InMemoryMailbox::new();
        let id = MessageId::new("ghost");
        assert!(matches!(mailbox.get_labels(&id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            mailbox.archive_by_link("https://mail.example/#inbox/ghost").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn file_mailbox_derives_links_and_archives_by_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mailbox.json");
        std::fs::write(
            &path,
            r#"{
                "labels": ["Finance"],
                "messages": [
                    {"id": "m1", "thread_id": "t1", "subject": "Invoice",
                     "received_at": "2025-09-08T09:00:00Z"}
                ]
            }"#,
        )
        .unwrap();

        let mailbox = FileMailbox::with_link_template(&path, "https://mail.example/u/1/#inbox/{id}");
        let recent = mailbox.list_recent_messages(5).await.unwrap();
        assert_eq!(recent[0].link, "https://mail.example/u/1/#inbox/m1");

        mailbox
            .archive_by_link("https://mail.google.com/mail/u/0/#inbox/m1")
            .await
            .unwrap();
        assert!(mailbox.list_recent_messages(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_mailbox_persists_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mailbox.json");
        let data = MailboxData {
            labels: BTreeSet::new(),
            messages: vec![message("m1", "t1", 9).into()],
        };
        json_file::save(&path, &data).await.unwrap();

        let mailbox = FileMailbox::new(&path);
        mailbox.apply_label(&MessageId::new("m1"), "AI").await.unwrap();

        let reopened = FileMailbox::new(&path);
        assert!(reopened.get_labels(&MessageId::new("m1")).await.unwrap().contains("AI"));
        assert!(reopened.list_all_label_names().await.unwrap().contains("AI"));
    }
}
