// src/models/mod.rs

pub mod leaderboard;
pub mod question;
pub mod search;

/// Validates that a string is a correctly formatted URL.
pub(crate) fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if url::Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Filter values are backtick-quoted on the wire, so they cannot carry one.
pub(crate) fn validate_filter_value(value: &str) -> Result<(), validator::ValidationError> {
    if value.contains('`') {
        return Err(validator::ValidationError::new("backtick_in_filter_value"));
    }
    Ok(())
}
