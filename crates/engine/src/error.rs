//! The module contains the errors the engine can throw.
//!
//! Validation errors are raised before any allocation pass runs:
//!
//! - [`InvalidInput`] for malformed names/descriptions.
//! - [`InvalidAmount`] for non-positive amounts or a target below the
//!   invested amount.
//! - [`ProjectClosed`] when editing a fully funded project.
//! - [`HasInvestments`] when deleting a project that already received money.
//! - [`ExistingKey`] for duplicate project names.
//!
//! [`InvariantViolation`] and [`Conflict`] come out of the allocator and mean
//! the candidate list or the store is inconsistent. They are never clamped.
//!
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`ProjectClosed`]: EngineError::ProjectClosed
//!  [`HasInvestments`]: EngineError::HasInvestments
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`InvariantViolation`]: EngineError::InvariantViolation
//!  [`Conflict`]: EngineError::Conflict
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Project closed: {0}")]
    ProjectClosed(String),
    #[error("Project has investments: {0}")]
    HasInvestments(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Concurrent modification: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::ProjectClosed(a), Self::ProjectClosed(b)) => a == b,
            (Self::HasInvestments(a), Self::HasInvestments(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvariantViolation(a), Self::InvariantViolation(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
