//! Rule set parsing and validation.
//!
//! Rule sets are the unit of persistence and transport: authored by the
//! visual builder, stored externally, and shipped to whatever runtime
//! evaluates them. This module handles parsing JSON/YAML rule sets and
//! validating them against the embedded JSON Schema.

mod parser;
mod schema;

pub use parser::{RuleSet, RuleSetError};
pub use schema::{ruleset_schema_json, validate_ruleset_schema};
