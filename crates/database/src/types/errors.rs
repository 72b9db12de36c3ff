//! Error types for the database layer

use thiserror::Error;

/// Errors raised while bringing the database up
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),
}

/// Errors raised by the inbox store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Write conflict with a concurrent transaction or a uniqueness violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// SQLite result codes that mean "someone else holds the write lock".
const SQLITE_BUSY_CODES: &[&str] = &["5", "6", "261", "262", "517"];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err)
                if db_err
                    .code()
                    .map(|code| SQLITE_BUSY_CODES.contains(&code.as_ref()))
                    .unwrap_or(false) =>
            {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(format!("serialization failed: {err}"))
    }
}
