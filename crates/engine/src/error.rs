//! The module contains the errors the engine can throw.
//!
//! The most relevant ones are:
//!
//! - [`MismatchedClassificationSystem`] thrown when a classification is used
//!   with a budget (or parent) of another classification system.
//! - [`NotFound`] thrown when an expected record does not exist.
//! - [`UnsupportedVariant`] thrown when a stored budget item is neither
//!   atomic nor mapped.
//! - [`CycleDetected`] thrown when a classification tree or a chain of mapped
//!   budgets loops back on itself.
//!
//!  [`MismatchedClassificationSystem`]: EngineError::MismatchedClassificationSystem
//!  [`NotFound`]: EngineError::NotFound
//!  [`UnsupportedVariant`]: EngineError::UnsupportedVariant
//!  [`CycleDetected`]: EngineError::CycleDetected
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Mismatched classification system: {0}")]
    MismatchedClassificationSystem(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Unsupported budget item variant: {0}")]
    UnsupportedVariant(String),
    #[error("Cycle detected: {0}")]
    CycleDetected(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::MismatchedClassificationSystem(a), Self::MismatchedClassificationSystem(b)) => {
                a == b
            }
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::UnsupportedVariant(a), Self::UnsupportedVariant(b)) => a == b,
            (Self::CycleDetected(a), Self::CycleDetected(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidChunkSize(a), Self::InvalidChunkSize(b)) => a == b,
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
