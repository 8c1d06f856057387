use thiserror::Error;

/// Errors from blob store operations.
///
/// A missing blob is not an error: reads return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request throttled")]
    Throttled,

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(StoreError::Throttled.to_string(), "request throttled");
        assert_eq!(
            StoreError::Backend("boom".into()).to_string(),
            "backend error: boom"
        );
    }
}
