//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when a row is missing or belongs to another
//!   organization.
//! - [`InvalidReading`] thrown when a meter reading goes backwards without a
//!   rollover.
//! - [`InvalidState`] thrown when an operation does not fit the current
//!   status (e.g. closing an already closed shift).
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidReading`]: EngineError::InvalidReading
//!  [`InvalidState`]: EngineError::InvalidState
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid meter reading: {0}")]
    InvalidReading(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Credit limit exceeded: {0}")]
    CreditLimitExceeded(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidReading(a), Self::InvalidReading(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::CreditLimitExceeded(a), Self::CreditLimitExceeded(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
