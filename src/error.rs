use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("Login rejected: {0}")]
    Login(String),

    #[error("Unexpected page structure: {0}")]
    PageStructure(String),

    #[error("Server response did not match the expected outcome")]
    UnexpectedResponse,

    #[error("Session context not loaded; call login() first")]
    SessionNotReady,

    #[error("No active profile selected")]
    NoActiveProfile,

    #[error("No profile named {0}")]
    UnknownProfile(String),
}

impl AppError {
    pub(crate) fn http_status(status: reqwest::StatusCode) -> Self {
        AppError::Http {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("").to_string(),
        }
    }
}
