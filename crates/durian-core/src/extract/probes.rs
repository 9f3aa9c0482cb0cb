//! Access-path probes over generative response payloads.
//!
//! Each probe knows one place where a model has been observed to put its
//! answer text. The extractor tries them in order and stops at the first
//! non-empty hit. Adding a new upstream shape means adding a probe here.

use serde_json::Value as JsonValue;

/// One strategy for locating answer text inside a response payload.
pub trait TextProbe: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Return the trimmed, non-empty text at this probe's path, if any.
    fn probe<'a>(&self, response: &'a JsonValue) -> Option<&'a str>;
}

/// `candidates[0]`, the root of every known shape.
fn first_candidate(response: &JsonValue) -> Option<&JsonValue> {
    response.get("candidates")?.get(0)
}

fn non_empty(value: &JsonValue) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// `candidates[0].content.parts[0].text`
pub struct FirstPartText;

impl TextProbe for FirstPartText {
    fn name(&self) -> &'static str {
        "first_part_text"
    }

    fn probe<'a>(&self, response: &'a JsonValue) -> Option<&'a str> {
        let part = first_candidate(response)?.get("content")?.get("parts")?.get(0)?;
        non_empty(part.get("text")?)
    }
}

/// `candidates[0].content.text`
pub struct ContentText;

impl TextProbe for ContentText {
    fn name(&self) -> &'static str {
        "content_text"
    }

    fn probe<'a>(&self, response: &'a JsonValue) -> Option<&'a str> {
        non_empty(first_candidate(response)?.get("content")?.get("text")?)
    }
}

/// `candidates[0].text`
pub struct CandidateText;

impl TextProbe for CandidateText {
    fn name(&self) -> &'static str {
        "candidate_text"
    }

    fn probe<'a>(&self, response: &'a JsonValue) -> Option<&'a str> {
        non_empty(first_candidate(response)?.get("text")?)
    }
}

/// First non-empty `text` across all of `candidates[0].content.parts`.
pub struct AnyPartText;

impl TextProbe for AnyPartText {
    fn name(&self) -> &'static str {
        "any_part_text"
    }

    fn probe<'a>(&self, response: &'a JsonValue) -> Option<&'a str> {
        first_candidate(response)?
            .get("content")?
            .get("parts")?
            .as_array()?
            .iter()
            .find_map(|part| part.get("text").and_then(non_empty))
    }
}

/// First non-empty string field of `candidates[0].content`, skipping `role`.
///
/// Fields are visited in the order the payload lists them.
pub struct ContentStringField;

impl ContentStringField {
    const SKIPPED_FIELD: &'static str = "role";
}

impl TextProbe for ContentStringField {
    fn name(&self) -> &'static str {
        "content_string_field"
    }

    fn probe<'a>(&self, response: &'a JsonValue) -> Option<&'a str> {
        first_candidate(response)?
            .get("content")?
            .as_object()?
            .iter()
            .filter(|(key, _)| key.as_str() != Self::SKIPPED_FIELD)
            .find_map(|(_, value)| non_empty(value))
    }
}

/// The built-in probes in priority order.
pub fn default_probes() -> Vec<Box<dyn TextProbe>> {
    vec![
        Box::new(FirstPartText),
        Box::new(ContentText),
        Box::new(CandidateText),
        Box::new(AnyPartText),
        Box::new(ContentStringField),
    ]
}
