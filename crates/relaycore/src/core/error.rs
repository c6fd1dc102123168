use thiserror::Error;

/// Centralized error types for the core library
///
/// Storage, decoding and routing failures are converted to this enum so the
/// settings store and the route table can report them uniformly. Nothing of
/// this type crosses the dispatch or settings-store boundary: callers there
/// get a boolean or a default instead.
///
/// # Example
///
/// ```no_run
/// use relaycore::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     log::error!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Blocking storage task was cancelled or panicked
    #[error("Storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid route pattern
    #[error("Route pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// A stored value could not be decoded into its declared type
    #[error("Decode error: {0}")]
    Decode(String),

    /// A compare-and-set write lost against a concurrent writer
    #[error("Concurrent modification of '{0}'")]
    Conflict(String),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl From<Vec<String>> for AppError {
    fn from(errors: Vec<String>) -> Self {
        AppError::Validation(errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_list_is_joined() {
        let err = AppError::from(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(err.to_string(), "Validation error: first; second");
    }

    #[test]
    fn test_json_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse.into();
        assert!(matches!(err, AppError::Json(_)));
    }
}
