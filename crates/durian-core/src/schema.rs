//! JSON Schema validation for generative payloads.
//!
//! After extraction, a payload must still have the right shape before it is
//! turned into a typed record. Shape mismatches are treated by the adapters
//! exactly like unparseable output.

use std::sync::OnceLock;
use thiserror::Error;

const JUDGE_SCHEMA_JSON: &str = include_str!("../schemas/judge_response.schema.json");
const CAMPAIGN_SCHEMA_JSON: &str = include_str!("../schemas/campaign_response.schema.json");

static JUDGE_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static CAMPAIGN_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Which payload schema to validate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Judge,
    Campaign,
}

/// Errors from schema validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),

    #[error("Payload does not match {kind:?} schema: {}", .violations.join("; "))]
    Mismatch {
        kind: PayloadKind,
        violations: Vec<String>,
    },
}

fn compile(source: &str) -> Result<jsonschema::Validator, String> {
    let schema_value: serde_json::Value =
        serde_json::from_str(source).map_err(|e| format!("Invalid schema JSON: {}", e))?;
    jsonschema::options()
        .build(&schema_value)
        .map_err(|e| format!("Failed to compile schema: {}", e))
}

fn validator(kind: PayloadKind) -> Result<&'static jsonschema::Validator, SchemaError> {
    let cell = match kind {
        PayloadKind::Judge => JUDGE_SCHEMA.get_or_init(|| compile(JUDGE_SCHEMA_JSON)),
        PayloadKind::Campaign => CAMPAIGN_SCHEMA.get_or_init(|| compile(CAMPAIGN_SCHEMA_JSON)),
    };
    cell.as_ref().map_err(|e| SchemaError::LoadError(e.clone()))
}

/// Validate a payload, collecting every violation.
pub fn validate_payload(kind: PayloadKind, payload: &serde_json::Value) -> Result<(), SchemaError> {
    let validator = validator(kind)?;

    let violations: Vec<String> = validator
        .iter_errors(payload)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Mismatch { kind, violations })
    }
}
