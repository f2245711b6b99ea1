//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryMailbox / FileMailbox**: MessageStore
//! - **InMemoryTaskBoard / FileTaskBoard**: TaskStore
//! - **InMemoryProperties / FileProperties**: PropertyStore
//! - **GeminiService**: HTTP の CompletionService
//! - **ScriptedCompletionService**: オフライン実行・テスト用の CompletionService
//!
//! File 系はすべて JSON ファイル 1 つを丸ごと読み書きする（`json_file`）。

pub mod board;
pub mod gemini;
mod json_file;
pub mod mailbox;
pub mod properties;
pub mod scripted;

// 主要な型を再エクスポート
pub use self::board::{FileTaskBoard, InMemoryTaskBoard};
pub use self::gemini::{GeminiConfig, GeminiService};
pub use self::mailbox::{FileMailbox, InMemoryMailbox};
pub use self::properties::{FileProperties, InMemoryProperties};
pub use self::scripted::ScriptedCompletionService;
