//! Decoding of the `/validate` response.
//!
//! The endpoint answers HTTP 200 whether or not the addresses are inside the
//! delivery zone. The only difference between the two bodies is an `errors`
//! list, so the body is read as a JSON value and split on that field before
//! anything else is typed. Addresses next to `errors` are best effort: one
//! that does not decode is dropped rather than hiding the error messages.

use serde_json::Value;

use crate::error::ApiError;
use crate::types::{AddressValidationErrorResponse, AddressValidationResponse, ValidatedAddress};

/// Which of the two `/validate` shapes a body turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(AddressValidationResponse),
    Invalid(AddressValidationErrorResponse),
}

/// Decode a `/validate` body. A present, non-empty `errors` value makes it
/// `Invalid`; anything else is returned as `Valid`.
pub fn disambiguate(body: &str) -> Result<ValidationOutcome, ApiError> {
    let mut body: Value =
        serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;

    let errors = body.as_object_mut().and_then(|fields| fields.remove("errors"));
    let errors = match errors {
        Some(Value::Array(errors)) if !errors.is_empty() => errors,
        None | Some(Value::Null) | Some(Value::Array(_)) => {
            let response = serde_json::from_value(body)
                .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
            return Ok(ValidationOutcome::Valid(response));
        }
        Some(single) => vec![single],
    };

    Ok(ValidationOutcome::Invalid(AddressValidationErrorResponse {
        pick_address: lenient_address(&mut body, "pick_address"),
        drop_address: lenient_address(&mut body, "drop_address"),
        errors,
    }))
}

fn lenient_address(body: &mut Value, key: &str) -> Option<ValidatedAddress> {
    let value = body.as_object_mut()?.remove(key)?;
    serde_json::from_value(value).ok()
}

impl AddressValidationErrorResponse {
    /// All reported problems as one line, e.g.
    /// `pick_address: Outside of available delivery area. other: Something else`.
    pub fn message(&self) -> String {
        aggregate_errors(&self.errors)
    }
}

/// Join `key: message` pairs, in order, with `". "` both within an entry and
/// between entries.
pub fn aggregate_errors(errors: &[Value]) -> String {
    errors
        .iter()
        .map(|entry| match entry {
            Value::Object(pairs) => pairs
                .iter()
                .map(|(key, message)| format!("{key}: {}", message_text(message)))
                .collect::<Vec<_>>()
                .join(". "),
            other => message_text(other),
        })
        .collect::<Vec<_>>()
        .join(". ")
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
