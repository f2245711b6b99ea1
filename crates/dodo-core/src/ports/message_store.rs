//! MessageStore port - 外部メールボックス
//!
//! コアはメッセージを所有しない。読み取りとラベル付与・アーカイブの依頼のみ。
//!
//! # 実装
//! - **InMemoryMailbox**: テスト用
//! - **FileMailbox**: JSON ファイル（CLI 用）

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::{Message, MessageId, StoreError};

/// MessageStore は受信メッセージとラベルを管理する外部ストア
///
/// # 設計原則
/// - `apply_label` は冪等（既に付いていれば no-op）
/// - `archive_by_link` はリンク先メッセージのスレッド全体をアーカイブする。
///   リンクが解決できなければ `StoreError::NotFound`
///   （呼び出し側がログに残して握りつぶす）
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// 最近のメッセージを新しい順に最大 `limit` 件
    async fn list_recent_messages(&self, limit: usize) -> Result<Vec<Message>, StoreError>;

    async fn get_labels(&self, id: &MessageId) -> Result<BTreeSet<String>, StoreError>;

    async fn apply_label(&self, id: &MessageId, label: &str) -> Result<(), StoreError>;

    async fn list_all_label_names(&self) -> Result<BTreeSet<String>, StoreError>;

    async fn archive_by_link(&self, link: &str) -> Result<(), StoreError>;
}
