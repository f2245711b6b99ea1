//! Completion client: one prompt in, one JSON value out.
//!
//! - `wire`: the generateContent request/response envelope
//! - `repair`: tolerant recovery of JSON from model text
//! - `client`: ties both to a [`CompletionService`](crate::ports::CompletionService)

mod client;
pub mod repair;
pub mod wire;

pub use client::CompletionClient;
pub use repair::recover_json;
