use thiserror::Error;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Validation and configuration errors are caller mistakes; retrying the
    /// same payload cannot fix them. Transport and endpoint errors are
    /// transient from the dispatcher's point of view.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Http(_) | AppError::Endpoint { .. })
    }
}
