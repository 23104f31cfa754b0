use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Timed out after {secs:.1}s waiting for {operation}")]
    Timeout { operation: String, secs: f64 },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error came from an external collaborator (provider or backend).
    ///
    /// Collaborator failures are recovered locally with a neutral substitute;
    /// everything else is surfaced to the caller.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, AppError::Collaborator(_) | AppError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_classification() {
        assert!(AppError::Collaborator("down".into()).is_collaborator_failure());
        assert!(AppError::Timeout {
            operation: "sentiment".into(),
            secs: 1.0
        }
        .is_collaborator_failure());
        assert!(!AppError::InvalidInput("negative amount".into()).is_collaborator_failure());
        assert!(!AppError::UnknownStrategy("yolo".into()).is_collaborator_failure());
    }

    #[test]
    fn test_timeout_message() {
        let err = AppError::Timeout {
            operation: "execution backend".into(),
            secs: 2.5,
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 2.5s waiting for execution backend"
        );
    }
}
