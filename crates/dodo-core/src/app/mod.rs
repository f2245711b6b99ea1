//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **DodoBuilder / Dodo**: 構築とワイヤリング、呼び出し側に公開する表面
//! - **TriageOrchestrator**: 受信箱のトリアージ（dedup → redact → classify → extract → record）
//! - **TaskLifecycle**: タスクのステージ遷移とアーカイブ
//! - **BoardView**: ボードの状態表示

pub mod builder;
pub mod lifecycle;
pub mod orchestrator;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, Dodo, DodoBuilder};
pub use self::lifecycle::{Advanced, TaskLifecycle};
pub use self::orchestrator::TriageOrchestrator;
pub use self::status::{BoardStatus, BoardView};
