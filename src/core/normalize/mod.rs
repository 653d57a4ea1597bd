//! Pure mappings from each provider's raw JSON into a `ProviderRecord`.
//!
//! No network access and no side effects: every function here is a
//! deterministic function of its input. Untyped JSON stops at this boundary.

pub mod auto_dev;
pub mod carquery;
pub mod lenient;
pub mod nhtsa;

use crate::utils::error::ProviderFailure;
use serde_json::Value;

fn require_object(raw: Value) -> Result<Value, ProviderFailure> {
    match raw {
        Value::Object(_) => Ok(raw),
        other => Err(ProviderFailure::malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
