//! ScriptedCompletionService - 台本どおりに答える CompletionService
//!
//! # 用途
//! - `--offline` 実行（常に「ラベルなし・アクションなし」）
//! - テスト（プロンプトに含まれる文字列で答えを切り替え、送られたプロンプトを記録）

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use crate::domain::CompletionError;
use crate::ports::CompletionService;

/// Answer used by `--offline`: parses as both "no label" and "no actions".
pub const OFFLINE_ANSWER: &str = r#"{"label": "none", "actions": []}"#;

/// Wraps model text in a generateContent response body.
pub fn envelope(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

struct Rule {
    needles: Vec<String>,
    answer: Result<String, CompletionError>,
}

/// 最初にマッチしたルールの答えを返す。どれにもマッチしなければ `otherwise`
pub struct ScriptedCompletionService {
    rules: Vec<Rule>,
    fallback: Result<String, CompletionError>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletionService {
    /// ルールなし。全呼び出しが `EmptyResponse`
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Err(CompletionError::EmptyResponse),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn offline() -> Self {
        Self::new().otherwise(Ok(envelope(OFFLINE_ANSWER)))
    }

    /// プロンプトが `needle` を含むときの答え（生のレスポンスボディ）
    pub fn when(self, needle: &str, answer: Result<String, CompletionError>) -> Self {
        self.when_all(&[needle], answer)
    }

    /// プロンプトが `needles` をすべて含むときの答え
    pub fn when_all(mut self, needles: &[&str], answer: Result<String, CompletionError>) -> Self {
        self.rules.push(Rule {
            needles: needles.iter().map(|s| s.to_string()).collect(),
            answer,
        });
        self
    }

    pub fn otherwise(mut self, answer: Result<String, CompletionError>) -> Self {
        self.fallback = answer;
        self
    }

    /// これまでに送られたプロンプト（送信順）
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

impl Default for ScriptedCompletionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletionService {
    async fn post(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().await.push(prompt.to_string());
        self.rules
            .iter()
            .find(|rule| rule.needles.iter().all(|n| prompt.contains(n.as_str())))
            .map(|rule| rule.answer.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::wire::candidate_text;

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let service = ScriptedCompletionService::new()
            .when_all(&["Invoice", "label"], Ok(envelope("a")))
            .when("Invoice", Ok(envelope("b")))
            .otherwise(Err(CompletionError::Unreachable("down".into())));

        let a = service.post("pick a label for Invoice 7").await.unwrap();
        let b = service.post("extract from Invoice 7").await.unwrap();
        assert_eq!(candidate_text(&a).unwrap(), "a");
        assert_eq!(candidate_text(&b).unwrap(), "b");
        assert!(service.post("other").await.is_err());
        assert_eq!(service.prompts().await.len(), 3);
    }
}
