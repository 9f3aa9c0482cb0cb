//! Structured extraction from generative model output.
//!
//! A model asked to "answer in JSON only" still wraps its answer in code
//! fences, adds commentary, or moves the text to a different field. The
//! extractor locates the answer text with an ordered list of probes, strips
//! the wrapping, and strictly parses what is left. It never returns
//! partially parsed data.

mod probes;

pub use probes::{
    default_probes, AnyPartText, CandidateText, ContentStringField, ContentText, FirstPartText,
    TextProbe,
};

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;

lazy_static! {
    /// Opening fence with optional language tag: ```json
    static ref LEADING_FENCE: Regex = Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").unwrap();

    /// Closing fence at the very end.
    static ref TRAILING_FENCE: Regex = Regex::new(r"\r?\n?[ \t]*```\s*$").unwrap();

    /// Greedy first '{' to last '}' span.
    static ref JSON_OBJECT_SPAN: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Errors from structured extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("No text content found in response")]
    NoTextFound,

    #[error("Invalid JSON in response: {reason}")]
    InvalidJson {
        /// The cleaned string that failed to parse
        raw: String,
        reason: String,
    },
}

impl ExtractionError {
    /// The raw text that failed to parse, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ExtractionError::NoTextFound => None,
            ExtractionError::InvalidJson { raw, .. } => Some(raw),
        }
    }
}

/// Turns arbitrary response payloads into JSON values.
pub struct StructuredExtractor {
    probes: Vec<Box<dyn TextProbe>>,
}

impl StructuredExtractor {
    /// Extractor with the built-in probe chain.
    pub fn new() -> Self {
        Self {
            probes: default_probes(),
        }
    }

    /// Extractor with a custom probe chain, tried in the given order.
    pub fn with_probes(probes: Vec<Box<dyn TextProbe>>) -> Self {
        Self { probes }
    }

    /// Append a probe at the lowest priority.
    pub fn push_probe(mut self, probe: Box<dyn TextProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    /// Names of the probes, in priority order.
    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Locate the answer text. First non-empty probe wins.
    pub fn extract_text(&self, response: &JsonValue) -> Result<String, ExtractionError> {
        for probe in &self.probes {
            if let Some(text) = probe.probe(response) {
                tracing::debug!(probe = probe.name(), len = text.len(), "Extracted response text");
                return Ok(text.to_string());
            }
        }
        Err(ExtractionError::NoTextFound)
    }

    /// Locate, clean and strictly parse the answer.
    pub fn extract(&self, response: &JsonValue) -> Result<JsonValue, ExtractionError> {
        let text = self.extract_text(response)?;
        parse_payload(&text)
    }

    /// Like [`extract`](Self::extract), then deserialize into `T`.
    ///
    /// A payload that parses but does not fit `T` is reported as
    /// `InvalidJson` as well.
    pub fn extract_record<T: DeserializeOwned>(
        &self,
        response: &JsonValue,
    ) -> Result<T, ExtractionError> {
        let value = self.extract(response)?;
        serde_json::from_value(value.clone()).map_err(|e| ExtractionError::InvalidJson {
            raw: value.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for StructuredExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StructuredExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredExtractor")
            .field("probes", &self.probe_names())
            .finish()
    }
}

/// Strip code fences and any commentary around the outermost object.
pub fn clean_payload(text: &str) -> String {
    let mut working = text.trim();

    let unfenced;
    if working.starts_with("```") {
        let without_open = LEADING_FENCE.replace(working, "");
        unfenced = TRAILING_FENCE.replace(&without_open, "").trim().to_string();
        working = &unfenced;
    }

    match JSON_OBJECT_SPAN.find(working) {
        Some(span) => span.as_str().to_string(),
        None => working.to_string(),
    }
}

/// Clean and strictly parse a text payload.
pub fn parse_payload(text: &str) -> Result<JsonValue, ExtractionError> {
    let cleaned = clean_payload(text);
    serde_json::from_str(&cleaned).map_err(|e| {
        tracing::debug!(error = %e, raw = %cleaned, "Payload is not valid JSON");
        ExtractionError::InvalidJson {
            raw: cleaned,
            reason: e.to_string(),
        }
    })
}
