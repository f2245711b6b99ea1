//! Per-message analysis: redaction, prompts, classification, extraction.

pub mod classifier;
pub mod extractor;
pub mod prompt;
pub mod redact;

pub use classifier::Classifier;
pub use extractor::TaskExtractor;
pub use redact::redact;
