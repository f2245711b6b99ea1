//! dodo-core
//!
//! Core building blocks for the Dodo inbox triage.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（message, task, state, extraction, report, ids, errors）
//! - **ports**: 抽象化レイヤー（MessageStore, TaskStore, PropertyStore, CompletionService, Clock, IdGenerator）
//! - **completion**: completion クライアント（wire 形式、JSON 修復）
//! - **triage**: redaction、プロンプト、Classifier、TaskExtractor
//! - **seen**: 処理済みメッセージ ID の集合
//! - **app**: アプリケーションロジック（builder, orchestrator, lifecycle, status）
//! - **impls**: 実装（InMemory / JSON ファイル / HTTP）
//! - **config**: TOML 設定

pub mod app;
pub mod completion;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod seen;
pub mod triage;

pub use app::{Advanced, BoardStatus, BoardView, BuildError, Dodo, DodoBuilder};
pub use config::Settings;
pub use error::DodoError;
