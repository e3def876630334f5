//! JSON Schema validation for rule sets.
//!
//! Rule sets are validated against spec/ruleset.schema.json before they
//! are accepted from external storage. This module provides schema
//! loading and validation utilities.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded rule set schema (loaded at compile time).
const RULESET_SCHEMA_JSON: &str = include_str!("../../../../spec/ruleset.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

/// The embedded rule set schema as a JSON string.
pub fn ruleset_schema_json() -> &'static str {
    RULESET_SCHEMA_JSON
}

/// Get or initialize the compiled schema validator.
fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(RULESET_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a rule set JSON value against the schema.
///
/// Returns `Ok(())` if valid, or the list of validation error messages.
pub fn validate_ruleset_schema(ruleset_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(ruleset_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
