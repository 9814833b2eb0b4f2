use thiserror::Error;

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum HivemindError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Lookup errors
    #[error("Session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    #[error("Hive not found: {0}")]
    HiveNotFound(uuid::Uuid),

    // State machine errors
    #[error("Invalid state: {0}")]
    State(String),

    #[error("Step conflict: another step is in flight for session {0}")]
    StepConflict(uuid::Uuid),

    // Oracle errors (never surfaced over the API; callers substitute baselines)
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),

    // Order queue errors
    #[error("Order queue error: {0}")]
    Queue(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for HivemindError
pub type Result<T> = std::result::Result<T, HivemindError>;

impl HivemindError {
    /// Whether this error maps to a caller mistake rather than an
    /// internal failure. Used by the API layer for status codes.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HivemindError::Auth(_)
                | HivemindError::Validation(_)
                | HivemindError::SessionNotFound(_)
                | HivemindError::HiveNotFound(_)
                | HivemindError::State(_)
                | HivemindError::StepConflict(_)
        )
    }
}
