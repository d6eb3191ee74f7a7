//! Input validation errors shared by every record type.

use thiserror::Error;

/// A request payload failed validation.
///
/// The display text is shown to shoppers as-is, so it stays short and
/// human-readable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was missing or blank.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A field was present but not acceptable.
    #[error("{field} {reason}")]
    Invalid {
        /// Field name as it appears in the payload.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ValidationError {
    /// Build an [`ValidationError::Invalid`].
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Trim a required text field, rejecting blank values.
///
/// # Errors
///
/// Returns [`ValidationError::Missing`] when the value is empty after trimming.
pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ValidationError::Missing("name").to_string(), "name is required");
        assert_eq!(
            ValidationError::invalid("price", "must not be negative").to_string(),
            "price must not be negative"
        );
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required("city", "  Pune ").as_deref(), Ok("Pune"));
        assert_eq!(required("city", " \t"), Err(ValidationError::Missing("city")));
    }
}
