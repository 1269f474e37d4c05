use crate::config::ConfigError;

/// Application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Graph API error: {code} - {message}")]
    Graph { code: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// True when the error is Graph telling us the caller lacks consent for
    /// the queried resource (e.g. missing AuditLog.Read.All), as opposed to
    /// a transient or fatal failure.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            AppError::Graph { code, .. } => {
                code == "Authorization_RequestDenied" || code.starts_with("403")
            }
            AppError::Http(e) => e.status() == Some(reqwest::StatusCode::FORBIDDEN),
            _ => false,
        }
    }
}

/// Result type alias for the sync pipeline
pub type AppResult<T> = Result<T, AppError>;
