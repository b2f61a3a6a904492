//! Error types for the Groundwork core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroundworkError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),
}

pub type GroundworkResult<T> = Result<T, GroundworkError>;
