//! generateContent envelope.
//!
//! Request: `{"contents":[{"parts":[{"text": prompt}]}]}`.
//! Response: the first candidate's first non-blank text part is the model
//! output; everything else in the envelope is ignored.

use serde::{Deserialize, Serialize};

use crate::domain::CompletionError;

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RequestContent<'a> {
    pub parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RequestPart<'a> {
    pub text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    pub fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Text of the first candidate.
///
/// A body that is not an envelope at all, an envelope without candidates,
/// and a candidate without text all mean the service produced nothing.
pub fn candidate_text(raw_body: &str) -> Result<String, CompletionError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(raw_body).map_err(|_| CompletionError::EmptyResponse)?;
    parsed
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .and_then(|parts| {
            parts
                .into_iter()
                .filter_map(|part| part.text)
                .find(|text| !text.trim().is_empty())
        })
        .ok_or(CompletionError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn request_wraps_prompt() {
        let body = serde_json::to_value(GenerateContentRequest::from_prompt("hi")).unwrap();
        assert_eq!(body, json!({"contents": [{"parts": [{"text": "hi"}]}]}));
    }

    #[test]
    fn takes_first_candidate_text() {
        let raw = r#"{"candidates":[
            {"content":{"parts":[{"text":"{\"label\":\"Finance\"}"}]},"finishReason":"STOP"},
            {"content":{"parts":[{"text":"second"}]}}
        ],"usageMetadata":{"promptTokenCount":5}}"#;
        assert_eq!(candidate_text(raw).unwrap(), r#"{"label":"Finance"}"#);
    }

    #[test]
    fn skips_parts_without_text() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"inlineData":{}},{"text":"  "},{"text":"ok"}]}}]}"#;
        assert_eq!(candidate_text(raw).unwrap(), "ok");
    }

    #[rstest]
    #[case::no_candidates(r#"{"candidates":[]}"#)]
    #[case::candidates_missing(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)]
    #[case::no_content(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#)]
    #[case::no_parts(r#"{"candidates":[{"content":{}}]}"#)]
    #[case::blank_text(r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#)]
    #[case::not_json("<html>bad gateway</html>")]
    fn empty_envelopes(#[case] raw: &str) {
        assert_eq!(candidate_text(raw), Err(CompletionError::EmptyResponse));
    }
}
