use std::fmt;
use thiserror::Error;

/// A single field that could not be decoded
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Why a raw country record was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("record has no usable name")]
    MissingName,

    #[error("{name}: {} invalid field(s): {}", .failures.len(), describe(.failures))]
    InvalidFields {
        name: String,
        failures: Vec<FieldError>,
    },
}

impl DecodeError {
    /// Fields that failed to decode, empty for a missing name
    pub fn failures(&self) -> &[FieldError] {
        match self {
            DecodeError::MissingName => &[],
            DecodeError::InvalidFields { failures, .. } => failures,
        }
    }
}

fn describe(failures: &[FieldError]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_fields_message_lists_every_field() {
        let err = DecodeError::InvalidFields {
            name: "Atlantis".to_string(),
            failures: vec![
                FieldError::new("population", "expected a number, got \"lots\""),
                FieldError::new("latlng", "expected an array"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Atlantis: 2 invalid field(s): population: expected a number, got \"lots\"; latlng: expected an array"
        );
    }
}
