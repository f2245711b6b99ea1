//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部の協調者（メールボックス、タスクボード、プロパティストア、
//! 生成 AI の completion エンドポイント）へのインターフェースを提供し、
//! 実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - コアはメッセージを読み、ラベル変更とアーカイブを「依頼」するだけ
//! - タスクレコードの正本は TaskStore
//! - 処理済み ID の集合は PropertyStore に文字列として永続化

pub mod clock;
pub mod completion;
pub mod id_generator;
pub mod message_store;
pub mod property_store;
pub mod task_store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::completion::CompletionService;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::message_store::MessageStore;
pub use self::property_store::PropertyStore;
pub use self::task_store::{RecordTransform, TaskStore};
