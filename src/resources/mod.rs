//! Per-resource API facades handed out by [`crate::Client`].

pub mod goals;
pub mod headlines;
pub mod issues;
pub mod meetings;
pub mod scorecard;
pub mod todos;
pub mod users;

pub use goals::GoalOperations;
pub use headlines::HeadlineOperations;
pub use issues::IssueOperations;
pub use meetings::MeetingOperations;
pub use scorecard::ScorecardOperations;
pub use todos::TodoOperations;
pub use users::UserOperations;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::{BloomyError, Result};
use crate::mapper::{self, FieldSpec};

/// The list filters `user_id` and `meeting_id` are mutually exclusive
/// everywhere they appear.
pub(crate) fn reject_both_filters(user_id: Option<u64>, meeting_id: Option<u64>) -> Result<()> {
    if user_id.is_some() && meeting_id.is_some() {
        return Err(BloomyError::Validation(
            "Please provide either user_id or meeting_id, not both.".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn from_mapped<T: DeserializeOwned>(raw: &Value, spec: &[FieldSpec]) -> Result<T> {
    Ok(serde_json::from_value(mapper::map_record(raw, spec))?)
}

pub(crate) fn from_mapped_list<T: DeserializeOwned>(
    raw: &Value,
    spec: &[FieldSpec],
) -> Result<Vec<T>> {
    mapper::map_list(raw, spec)
        .into_iter()
        .map(|mapped| serde_json::from_value(mapped).map_err(Into::into))
        .collect()
}

// Accessors for bulk work items: the validation gate guarantees presence
// of required fields, these enforce the expected JSON types.

pub(crate) fn string_field(item: &Value, field: &str) -> Result<String> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BloomyError::Validation(format!("{field} must be a string")))
}

pub(crate) fn u64_field(item: &Value, field: &str) -> Result<u64> {
    item.get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| BloomyError::Validation(format!("{field} must be a positive integer")))
}

pub(crate) fn optional_string(item: &Value, field: &str) -> Option<String> {
    item.get(field).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn optional_u64(item: &Value, field: &str) -> Option<u64> {
    item.get(field).and_then(Value::as_u64)
}
