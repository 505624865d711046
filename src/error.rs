//! Error types for the Payroll Liquidation Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the engine can surface: domain errors (not found,
//! duplicate period, invalid state, validation, batch failure), storage
//! faults, and configuration problems.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{BatchFailure, LiquidationStatus, Transition};

/// Stable, machine-readable classification of an [`EngineError`].
///
/// Callers match on the kind rather than on the message text. The
/// serialized form is used in batch failure lists and API error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// An employee or liquidation does not exist.
    NotFound,
    /// A liquidation already exists for the employee and period.
    DuplicatePeriod,
    /// A transition was attempted from a state that does not permit it.
    InvalidState,
    /// Caller input was missing or malformed.
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// Every item of a batch failed.
    BatchFailed,
    /// The persistence layer failed.
    #[serde(rename = "STORAGE_ERROR")]
    Storage,
    /// The configuration could not be loaded or is inconsistent.
    #[serde(rename = "CONFIG_ERROR")]
    Config,
}

impl ErrorKind {
    /// Returns the stable code for this kind (e.g. `"INVALID_STATE"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::DuplicatePeriod => "DUPLICATE_PERIOD",
            ErrorKind::InvalidState => "INVALID_STATE",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::BatchFailed => "BATCH_FAILED",
            ErrorKind::Storage => "STORAGE_ERROR",
            ErrorKind::Config => "CONFIG_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main error type for the Payroll Liquidation Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::{EngineError, ErrorKind};
///
/// let error = EngineError::validation("reason", "a rejection reason is required");
/// assert_eq!(error.kind(), ErrorKind::Validation);
/// assert_eq!(
///     error.to_string(),
///     "Invalid field 'reason': a rejection reason is required"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "employee", "liquidation").
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A non-voided liquidation already exists for the employee and period.
    #[error("Liquidation already exists for employee '{employee_id}' in period {period}")]
    DuplicatePeriod {
        /// The employee the liquidation belongs to.
        employee_id: String,
        /// The period label (e.g. "2026-01").
        period: String,
    },

    /// A state transition was attempted from a state that does not allow it.
    #[error("Cannot {attempted} liquidation {liquidation_id}: current state is {current}")]
    InvalidState {
        /// The liquidation whose transition was refused.
        liquidation_id: Uuid,
        /// The state the liquidation was in.
        current: LiquidationStatus,
        /// The transition that was attempted.
        attempted: Transition,
    },

    /// Caller supplied input was missing or malformed.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// A description of the problem.
        message: String,
    },

    /// Every item of a batch payment failed; nothing was committed.
    #[error("Batch payment failed: all {} item(s) failed", failures.len())]
    BatchFailed {
        /// Per-item failures, in request order.
        failures: Vec<BatchFailure>,
    },

    /// The persistence layer failed (connectivity, aborted transaction, poisoned lock).
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage fault.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but is semantically invalid.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// A description of the inconsistency.
        message: String,
    },
}

impl EngineError {
    /// Creates a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a `Validation` error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a `Storage` error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns the stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::DuplicatePeriod { .. } => ErrorKind::DuplicatePeriod,
            EngineError::InvalidState { .. } => ErrorKind::InvalidState,
            EngineError::Validation { .. } => ErrorKind::Validation,
            EngineError::BatchFailed { .. } => ErrorKind::BatchFailed,
            EngineError::Storage { .. } => ErrorKind::Storage,
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfig { .. } => ErrorKind::Config,
        }
    }

    /// Returns true for errors raised by the infrastructure rather than the domain.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Storage | ErrorKind::Config)
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
