use api_types::InferenceService;
use error_stack::Report;

use crate::error::ValidationError;

/// Checks the object name against `[a-z]([-a-z0-9]*[a-z0-9])?`.
pub fn validate_name(isvc: &InferenceService) -> Result<(), Report<ValidationError>> {
    let name = isvc.name();
    if is_valid_name(name) {
        return Ok(());
    }

    Err(Report::new(ValidationError::InvalidName {
        name: name.to_string(),
    }))
}

fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    first.is_ascii_lowercase()
        && (last.is_ascii_lowercase() || last.is_ascii_digit())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}
