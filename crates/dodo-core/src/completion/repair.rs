//! Tolerant JSON recovery for model output.
//!
//! Accepted deviations from strict JSON:
//! - surrounding code fences (```` ```json ```` / ```` ``` ````) and whitespace
//! - commentary before or after the payload
//! - trailing commas before `]` or `}`
//! - raw line breaks, including inside string literals
//!
//! Anything else is [`CompletionError::MalformedJson`].

use serde_json::Value;

use crate::domain::CompletionError;

/// Recovers a JSON value from model text.
///
/// Candidates are tried in order: the whole text with outer fences removed,
/// the first json-tagged (or untagged) fenced block, then the span from the
/// first `{` to the last `}`. Each candidate goes through [`normalize`]
/// before parsing.
pub fn recover_json(text: &str) -> Result<Value, CompletionError> {
    let candidates = [
        Some(strip_outer_fences(text)),
        fenced_block(text),
        brace_span(text),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter(|candidate| !candidate.is_empty())
        .find_map(|candidate| serde_json::from_str(&normalize(candidate)).ok())
        .ok_or_else(|| CompletionError::MalformedJson {
            raw: text.to_string(),
        })
}

fn strip_outer_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

fn fenced_block(text: &str) -> Option<&str> {
    let mut cursor = 0usize;
    while let Some(open_rel) = text[cursor..].find("```") {
        let after_open = open_rel + cursor + 3;
        let header_len = text[after_open..].find('\n')?;
        let header = text[after_open..after_open + header_len].trim();
        let block_start = after_open + header_len + 1;
        let close = block_start + text[block_start..].find("```")?;
        cursor = close + 3;

        if header.is_empty() || header.eq_ignore_ascii_case("json") {
            let block = text[block_start..close].trim();
            if !block.is_empty() {
                return Some(block);
            }
        }
    }
    None
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Drops trailing commas and turns line breaks into spaces.
///
/// String literals are tracked so that commas and brackets inside them
/// are left alone.
pub fn normalize(candidate: &str) -> String {
    let chars: Vec<char> = candidate.chars().collect();
    let mut out = String::with_capacity(candidate.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' || c == '\r' {
            out.push(' ');
            escaped = false;
            continue;
        }
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if !matches!(next, Some(']') | Some('}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::plain(r#"{"label": "Finance"}"#)]
    #[case::fenced_json("```json\n{\"label\": \"Finance\"}\n```")]
    #[case::fenced_upper("```JSON\n{\"label\": \"Finance\"}\n```")]
    #[case::fenced_bare("```\n{\"label\": \"Finance\"}\n```")]
    #[case::padded("  \n{\"label\": \"Finance\"}\n\n")]
    #[case::commentary("Sure! Here is the result:\n```json\n{\"label\": \"Finance\"}\n```\nLet me know.")]
    #[case::prose_only_braces("The answer is {\"label\": \"Finance\"} as requested.")]
    #[case::trailing_comma("{\"label\": \"Finance\",}")]
    fn recovers_label(#[case] text: &str) {
        assert_eq!(recover_json(text).unwrap(), json!({"label": "Finance"}));
    }

    #[test]
    fn trailing_commas_in_nested_arrays() {
        let text = "```json\n{\"actions\": [\n  {\"task\": \"A\", \"urgency\": \"low\",},\n  {\"task\": \"B\"},\n],\n}\n```";
        assert_eq!(
            recover_json(text).unwrap(),
            json!({"actions": [{"task": "A", "urgency": "low"}, {"task": "B"}]})
        );
    }

    #[test]
    fn newline_inside_string_becomes_space() {
        let text = "{\"actions\": [{\"task\": \"Send the\nQ3 report\"}]}";
        assert_eq!(
            recover_json(text).unwrap(),
            json!({"actions": [{"task": "Send the Q3 report"}]})
        );
    }

    #[test]
    fn commas_inside_strings_survive() {
        let text = r#"{"task": "Reply, then file ,]", "n": [1, 2,]}"#;
        assert_eq!(
            recover_json(text).unwrap(),
            json!({"task": "Reply, then file ,]", "n": [1, 2]})
        );
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let text = r#"{"task": "say \"hi\", ok,}"}"#;
        assert_eq!(recover_json(text).unwrap(), json!({"task": "say \"hi\", ok,}"}));
    }

    #[rstest]
    #[case::prose("I could not find any actions in this email.")]
    #[case::truncated("{\"actions\": [{\"task\": \"Send")]
    #[case::single_quotes("{'label': 'Finance'}")]
    #[case::empty("")]
    fn malformed_keeps_raw_text(#[case] text: &str) {
        assert_eq!(
            recover_json(text),
            Err(CompletionError::MalformedJson {
                raw: text.to_string()
            })
        );
    }
}
