//! Error types for StyleKeeper
//!
//! Every failure the engine can report is recoverable and local. Public
//! operations return one of these instead of panicking.

/// Error raised by a document or frame operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Frame is not same-origin")]
    CrossOrigin,
    #[error("Frame has no document")]
    NoDocument,
    #[error("{operation} failed: {message}")]
    Operation {
        operation: &'static str,
        message: String,
    },
}

impl DomError {
    /// Wrap a failed DOM call.
    pub fn op(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Operation {
            operation,
            message: message.into(),
        }
    }
}

/// Error raised by the key-value backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to read '{key}': {message}")]
    Read { key: String, message: String },
    #[error("Failed to write '{key}': {message}")]
    Write { key: String, message: String },
    #[error("Failed to encode '{key}': {message}")]
    Encode { key: String, message: String },
}

/// Error raised by the preset registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresetError {
    #[error("Preset name and CSS must not be empty")]
    EmptyField,
    #[error("Preset '{0}' does not exist")]
    NotFound(String),
}

/// Outcome taxonomy of the public controller operations.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("CSS validation failed: {0}")]
    Validation(String),
    #[error("Injection failed: {0}")]
    Injection(#[from] DomError),
    #[error(transparent)]
    Preset(#[from] PresetError),
    #[error("Malformed import: {0}")]
    MalformedImport(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = StyleError::from(DomError::op("appendChild", "HierarchyRequestError"));
        assert_eq!(
            err.to_string(),
            "Injection failed: appendChild failed: HierarchyRequestError"
        );

        let err = StyleError::from(PresetError::NotFound("Reading".into()));
        assert_eq!(err.to_string(), "Preset 'Reading' does not exist");
    }
}
