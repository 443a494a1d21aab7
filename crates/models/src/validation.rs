use thiserror::Error;

/// A rejected field value, reported back to the client as-is
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Rejects negative values for fields that are stored as plain integers
pub fn non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    Ok(())
}

/// Rejects empty or whitespace-only strings
pub fn not_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_non_negative() {
        assert!(non_negative("price", 0).is_ok());
        assert!(non_negative("price", 1999).is_ok());

        let err = non_negative("order", -1).unwrap_err();
        assert_eq!(err.field, "order");
        assert_eq!(err.to_string(), "order: must not be negative");
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("title", "Rust 101").is_ok());
        assert!(not_blank("title", "").is_err());
        assert!(not_blank("title", "   ").is_err());
    }
}
