//! Plan error types

use thiserror::Error;

use super::PlanStatus;

/// Errors raised while parsing, validating or transitioning a plan document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The payload is not syntactically valid JSON
    #[error("Invalid JSON: {0}")]
    Malformed(String),

    /// The payload is JSON but does not have the plan shape
    #[error("Invalid plan at '{path}': {message}")]
    Schema { path: String, message: String },

    /// The plan is well-formed but not complete enough to publish
    #[error("Plan not ready at '{path}': {message}")]
    NotReady { path: String, message: String },

    /// The requested status change is not allowed
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: PlanStatus, to: PlanStatus },
}

impl PlanError {
    /// Field path the error points at, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            PlanError::Schema { path, .. } | PlanError::NotReady { path, .. } => Some(path),
            PlanError::Malformed(_) | PlanError::IllegalTransition { .. } => None,
        }
    }

    /// Check if this is a rejected status change
    pub fn is_illegal_transition(&self) -> bool {
        matches!(self, PlanError::IllegalTransition { .. })
    }
}
