//! Common error types for the intake backend

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl CommonError {
    pub fn http_status_code(&self) -> u16 {
        match self {
            CommonError::ValidationFailed(_) => 400,
            CommonError::InvalidInput(_) => 400,
            CommonError::ExternalService(_) => 500,
        }
    }

    /// Whether the message is safe to show to an anonymous submitter as-is.
    pub fn is_client_error(&self) -> bool {
        self.http_status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_codes() {
        assert_eq!(CommonError::ValidationFailed("test".to_string()).http_status_code(), 400);
        assert_eq!(CommonError::InvalidInput("test".to_string()).http_status_code(), 400);
        assert_eq!(CommonError::ExternalService("test".to_string()).http_status_code(), 500);
    }

    #[test]
    fn test_client_errors() {
        assert!(CommonError::ValidationFailed("test".to_string()).is_client_error());
        assert!(!CommonError::ExternalService("test".to_string()).is_client_error());
    }
}
