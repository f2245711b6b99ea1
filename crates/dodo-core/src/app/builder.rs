//! DodoBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use crate::app::lifecycle::{Advanced, TaskLifecycle};
use crate::app::orchestrator::TriageOrchestrator;
use crate::app::status::BoardView;
use crate::completion::CompletionClient;
use crate::config::Settings;
use crate::domain::{RowRef, Stage, StoreError, TransitionError, TriageReport};
use crate::error::DodoError;
use crate::ports::{
    Clock, CompletionService, IdGenerator, MessageStore, PropertyStore, SystemClock, TaskStore,
    UlidGenerator,
};
use crate::triage::{Classifier, TaskExtractor};

/// DodoBuilder は ports を受け取って Dodo を構築
///
/// # 使用例
/// ```ignore
/// let dodo = DodoBuilder::new(settings)
///     .message_store(Arc::new(FileMailbox::new("mailbox.json")))
///     .task_store(Arc::new(FileTaskBoard::new("board.json")))
///     .property_store(Arc::new(FileProperties::new("properties.json")))
///     .completion_service(Arc::new(gemini))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - 必須の port（MessageStore, TaskStore, PropertyStore, CompletionService）が
///   揃っていなければ BuildError::MissingPorts
/// - Settings の検証に失敗すれば BuildError::InvalidSettings
/// - Clock / IdGenerator は省略可（SystemClock / UlidGenerator）
pub struct DodoBuilder {
    settings: Settings,
    messages: Option<Arc<dyn MessageStore>>,
    tasks: Option<Arc<dyn TaskStore>>,
    properties: Option<Arc<dyn PropertyStore>>,
    completion: Option<Arc<dyn CompletionService>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These ports must be provided before build().")]
    MissingPorts(Vec<&'static str>),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl DodoBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            messages: None,
            tasks: None,
            properties: None,
            completion: None,
            clock: None,
            ids: None,
        }
    }

    pub fn message_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.messages = Some(store);
        self
    }

    pub fn task_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.tasks = Some(store);
        self
    }

    pub fn property_store(mut self, store: Arc<dyn PropertyStore>) -> Self {
        self.properties = Some(store);
        self
    }

    pub fn completion_service(mut self, service: Arc<dyn CompletionService>) -> Self {
        self.completion = Some(service);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// DodoBuilder を検証して Dodo を生成
    ///
    /// # 検証
    /// - 不足している port をすべて列挙して BuildError::MissingPorts を返す
    /// - Settings::validate() が失敗すれば BuildError::InvalidSettings
    pub fn build(self) -> Result<Dodo, BuildError> {
        let (Some(messages), Some(tasks), Some(properties), Some(completion)) = (
            self.messages.clone(),
            self.tasks.clone(),
            self.properties.clone(),
            self.completion.clone(),
        ) else {
            return Err(BuildError::MissingPorts(self.missing_ports()));
        };
        self.settings
            .validate()
            .map_err(|err| BuildError::InvalidSettings(err.to_string()))?;

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids: Arc<dyn IdGenerator> = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let settings = Arc::new(self.settings);
        let client = CompletionClient::new(completion);

        let orchestrator = TriageOrchestrator {
            settings: settings.clone(),
            messages: messages.clone(),
            tasks: tasks.clone(),
            properties,
            classifier: Classifier::new(client.clone()),
            extractor: TaskExtractor::new(client),
            clock: clock.clone(),
            ids,
        };
        let lifecycle = TaskLifecycle {
            tasks: tasks.clone(),
            messages,
            clock,
            auto_archive: settings.auto_archive,
        };
        Ok(Dodo {
            settings,
            tasks,
            orchestrator,
            lifecycle,
        })
    }

    fn missing_ports(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.messages.is_none() {
            missing.push("MessageStore");
        }
        if self.tasks.is_none() {
            missing.push("TaskStore");
        }
        if self.properties.is_none() {
            missing.push("PropertyStore");
        }
        if self.completion.is_none() {
            missing.push("CompletionService");
        }
        missing
    }
}

/// Dodo は呼び出し側（CLI・スケジューラ）に公開する表面
///
/// - `run_triage`: 受信箱を 1 回トリアージ
/// - `advance_task`: タスクを 1 つ次のステージへ
/// - `board`: ボードのスナップショット
pub struct Dodo {
    settings: Arc<Settings>,
    tasks: Arc<dyn TaskStore>,
    orchestrator: TriageOrchestrator,
    lifecycle: TaskLifecycle,
}

impl Dodo {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn run_triage(&self) -> Result<TriageReport, DodoError> {
        self.orchestrator.run().await
    }

    pub async fn advance_task(&self, stage: Stage, row: RowRef) -> Result<Advanced, TransitionError> {
        self.lifecycle.advance(stage, row).await
    }

    pub async fn board(&self) -> Result<BoardView, StoreError> {
        BoardView::load(self.tasks.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{
        InMemoryMailbox, InMemoryProperties, InMemoryTaskBoard, ScriptedCompletionService,
    };

    fn complete_builder() -> DodoBuilder {
        DodoBuilder::new(Settings::new("Ada"))
            .message_store(Arc::new(InMemoryMailbox::new()))
            .task_store(Arc::new(InMemoryTaskBoard::new()))
            .property_store(Arc::new(InMemoryProperties::new()))
            .completion_service(Arc::new(ScriptedCompletionService::offline()))
    }

    #[test]
    fn test_build_success() {
        assert!(complete_builder().build().is_ok());
    }

    #[test]
    fn test_build_missing_ports() {
        let result = DodoBuilder::new(Settings::new("Ada"))
            .task_store(Arc::new(InMemoryTaskBoard::new()))
            .build();
        assert!(matches!(
            result,
            Err(BuildError::MissingPorts(missing))
                if missing == vec!["MessageStore", "PropertyStore", "CompletionService"]
        ));
    }

    #[test]
    fn test_build_invalid_settings() {
        let mut settings = Settings::new("Ada");
        settings.batch_size = 0;
        let result = DodoBuilder::new(settings)
            .message_store(Arc::new(InMemoryMailbox::new()))
            .task_store(Arc::new(InMemoryTaskBoard::new()))
            .property_store(Arc::new(InMemoryProperties::new()))
            .completion_service(Arc::new(ScriptedCompletionService::offline()))
            .build();
        assert!(matches!(result, Err(BuildError::InvalidSettings(_))));
    }
}
