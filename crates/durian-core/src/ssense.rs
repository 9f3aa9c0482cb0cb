//! Untuned conversion of AI-for-Thai SSense responses.
//!
//! When the domain tuner is bypassed, the primary classification is read
//! straight off the SSense payload:
//! - `sentiment.polarity` → polarity (missing or unknown → neutral)
//! - `sentiment.score` → score, string or number (missing → 50)
//! - `preprocess.{pos,neg,keyword}` → keyword buckets (missing → empty)
//!
//! This is the primary classifier's own vocabulary, so unknown polarity
//! strings are folded to neutral here. Judge labels are never treated this way.

use serde_json::Value as JsonValue;

use crate::types::{KeywordBuckets, Polarity, RawClassification};

const DEFAULT_SCORE: f64 = 50.0;

/// Build an untuned [`RawClassification`] from an SSense response.
pub fn classification_from_ssense(response: &JsonValue) -> RawClassification {
    let sentiment = &response["sentiment"];

    let polarity = sentiment["polarity"]
        .as_str()
        .and_then(|p| p.trim().to_lowercase().parse::<Polarity>().ok())
        .unwrap_or(Polarity::Neutral);

    let score = match &sentiment["score"] {
        JsonValue::Number(n) => n.as_f64().unwrap_or(DEFAULT_SCORE),
        JsonValue::String(s) => parse_leading_float(s).unwrap_or(DEFAULT_SCORE),
        _ => DEFAULT_SCORE,
    };

    let preprocess = &response["preprocess"];
    let keywords = KeywordBuckets {
        pos: string_list(&preprocess["pos"]),
        neg: string_list(&preprocess["neg"]),
        keyword: string_list(&preprocess["keyword"]),
    };

    RawClassification::new(polarity, score, keywords)
}

fn string_list(value: &JsonValue) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the longest numeric prefix of `s` ("71.43%" → 71.43).
fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse().ok()
}
