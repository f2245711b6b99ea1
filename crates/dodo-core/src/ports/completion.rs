//! CompletionService port - テキスト生成エンドポイント
//!
//! HTTP 呼び出し 1 回分だけを抽象化する。レスポンスの解釈
//! （candidate の取り出し、JSON 修復）は `completion::CompletionClient` 側。
//!
//! # 実装
//! - **GeminiService**: reqwest による HTTP 実装
//! - **ScriptedCompletionService**: オフライン実行・テスト用

use async_trait::async_trait;

use crate::domain::CompletionError;

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// プロンプトを送り、生のレスポンスボディを返す
    ///
    /// ネットワーク障害と 2xx 以外は `CompletionError::Unreachable`。
    async fn post(&self, prompt: &str) -> Result<String, CompletionError>;
}
