//! PII redaction applied to every piece of text before it leaves the process.
//!
//! Categories are replaced in this order:
//! email, URL, card number, phone number, street address, long digit run.
//! Cards go before phones so that 4x4 digit groups get their own sentinel
//! instead of being swallowed by the phone pattern. URLs go before the
//! digit-run pattern so that numeric path segments are not fragmented.
//! Calendar dates (`YYYY-MM-DD`) are never treated as phone numbers, so due
//! dates reach the model intact.
//!
//! A sentinel can open a word boundary that a later pattern needs (as in
//! `Street1234567`), so one pass is not always stable. Passes repeat until
//! the text stops changing; every changing pass consumes raw characters,
//! so this terminates.

use std::sync::LazyLock;

use regex::{Captures, Match, Regex};

use crate::domain::parse_due_date;

pub const EMAIL_SENTINEL: &str = "[REDACTED-EMAIL]";
pub const URL_SENTINEL: &str = "[REDACTED-URL]";
pub const CARD_SENTINEL: &str = "[REDACTED-CARD]";
pub const PHONE_SENTINEL: &str = "[REDACTED-PHONE]";
pub const ADDRESS_SENTINEL: &str = "[REDACTED-ADDRESS]";
pub const ID_SENTINEL: &str = "[REDACTED-ID]";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}").unwrap()
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:https?://|www\.)[^\s<>"'\[\]]+"#).unwrap());

static CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}(?:[ -]?\d{4}){3}\b").unwrap());

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d[\d \t().-]{5,}\d").unwrap());

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b\d{1,6}(?:-\d{1,6})?(?:\s+[A-Z][A-Za-z]*\.?){1,4}\s+(?:Street|St|Avenue|Ave|Road|Rd|Lane|Ln|Drive|Dr|Boulevard|Blvd|Way|Court|Ct|Place|Pl|Terrace|Parkway|Pkwy)\b\.?",
    )
    .unwrap()
});

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{6,}").unwrap());

static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// URL characters that usually end a sentence rather than the link.
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

/// Replaces PII-shaped substrings with category sentinels and collapses
/// repeated whitespace. Total, deterministic and idempotent.
pub fn redact(text: &str) -> String {
    let mut current = redact_once(text);
    loop {
        let next = redact_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn redact_once(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let text = SPACE_RUN.replace_all(text, " ");
    let text = EMAIL.replace_all(&text, EMAIL_SENTINEL);
    let text = URL.replace_all(&text, |caps: &Captures<'_>| {
        let url = &caps[0];
        let kept = url.trim_end_matches(URL_TRAILING);
        format!("{URL_SENTINEL}{}", &url[kept.len()..])
    });
    let text = CARD.replace_all(&text, CARD_SENTINEL);
    let text = PHONE.replace_all(&text, |caps: &Captures<'_>| redact_phone_span(&caps[0]));
    let text = ADDRESS.replace_all(&text, ADDRESS_SENTINEL);
    let text = DIGIT_RUN.replace_all(&text, ID_SENTINEL);
    SPACE_RUN.replace_all(&text, " ").trim().to_string()
}

/// Keeps the calendar dates inside a phone-shaped span and judges the
/// pieces around them on their own.
fn redact_phone_span(span: &str) -> String {
    let mut out = String::with_capacity(span.len());
    let mut piece_start = 0;
    for date in ISO_DATE.find_iter(span).filter(|m| is_calendar_date(span, m)) {
        out.push_str(&redact_phones_in(&span[piece_start..date.start()]));
        out.push_str(date.as_str());
        piece_start = date.end();
    }
    out.push_str(&redact_phones_in(&span[piece_start..]));
    out
}

fn redact_phones_in(piece: &str) -> String {
    PHONE
        .replace_all(piece, |caps: &Captures<'_>| {
            let candidate = &caps[0];
            if looks_like_phone(candidate) {
                PHONE_SENTINEL.to_string()
            } else {
                candidate.to_string()
            }
        })
        .into_owned()
}

/// A real `YYYY-MM-DD` date that is not part of a longer digit run.
fn is_calendar_date(span: &str, m: &Match<'_>) -> bool {
    let digit_before = span[..m.start()]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_digit());
    let digit_after = span[m.end()..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit());
    !digit_before && !digit_after && parse_due_date(m.as_str()).is_some()
}

/// 7+ digits broken up by at least one separator.
fn looks_like_phone(candidate: &str) -> bool {
    let digits = candidate.chars().filter(char::is_ascii_digit).count();
    let separated = candidate
        .trim_start_matches('+')
        .chars()
        .any(|c| !c.is_ascii_digit());
    digits >= 7 && separated
}
