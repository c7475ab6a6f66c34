//! Repository Module
//!
//! Per-entity persistence operations as free `async fn`s over a
//! `&mut SqliteConnection`, so every operation composes under a
//! caller-owned transaction (the correction cascade runs dozens of these
//! inside a single one).

pub mod allocation;
pub mod calibration;
pub mod cash_movement;
pub mod dispenser;
pub mod hose;
pub mod meter_reading;
pub mod product;
pub mod register;
pub mod shift;
pub mod station;
pub mod vessel;

use thiserror::Error;

use shared::error::DomainError;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => DomainError::NotFound(msg),
            RepoError::Duplicate(msg) => DomainError::Conflict(msg),
            RepoError::Database(msg) => DomainError::Database(msg),
            RepoError::Validation(msg) => DomainError::Validation(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
