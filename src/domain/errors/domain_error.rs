//! # Domain Errors
//!
//! Typed domain error definitions.
//!
//! This module provides the [`DomainError`] enum for representing
//! domain-level errors with numeric error codes.
//!
//! # Error Code Ranges
//!
//! - **1000-1999**: Validation errors
//! - **2000-2999**: State errors
//! - **4000-4999**: Arithmetic errors
//!
//! # Examples
//!
//! ```
//! use oracle_arbitration::domain::errors::DomainError;
//!
//! let error = DomainError::InvalidAmount("amount cannot be negative".to_string());
//! assert_eq!(error.code(), 1004);
//! ```

use crate::domain::value_objects::pipeline_phase::PipelinePhase;
use thiserror::Error;

/// Domain-level error with numeric error codes.
///
/// | Range | Category |
/// |-------|----------|
/// | 1000-1999 | Validation errors |
/// | 2000-2999 | State errors |
/// | 4000-4999 | Arithmetic errors |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (1000-1999)
    // ========================================================================
    /// Invalid chain identifier.
    #[error("invalid chain id: {0}")]
    InvalidChainId(String),

    /// Invalid account or contract address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid on-chain question identifier.
    #[error("invalid question id: {0}")]
    InvalidQuestionId(String),

    /// Invalid monetary amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid timestamp.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Generic validation error.
    #[error("validation error: {0}")]
    ValidationError(String),

    // ========================================================================
    // State Errors (2000-2999)
    // ========================================================================
    /// Invalid pipeline phase transition attempted.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// The current phase.
        from: PipelinePhase,
        /// The attempted target phase.
        to: PipelinePhase,
    },

    // ========================================================================
    // Arithmetic Errors (4000-4999)
    // ========================================================================
    /// Arithmetic overflow.
    #[error("arithmetic overflow")]
    Overflow,
}

impl DomainError {
    /// Creates an invalid state transition error.
    #[must_use]
    pub const fn invalid_transition(from: PipelinePhase, to: PipelinePhase) -> Self {
        Self::InvalidStateTransition { from, to }
    }

    /// Returns the numeric error code.
    ///
    /// # Examples
    ///
    /// ```
    /// use oracle_arbitration::domain::errors::DomainError;
    ///
    /// assert_eq!(DomainError::InvalidChainId("zz".to_string()).code(), 1001);
    /// assert_eq!(DomainError::Overflow.code(), 4001);
    /// ```
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            // Validation errors (1000-1999)
            Self::InvalidChainId(_) => 1001,
            Self::InvalidAddress(_) => 1002,
            Self::InvalidQuestionId(_) => 1003,
            Self::InvalidAmount(_) => 1004,
            Self::InvalidTimestamp(_) => 1005,
            Self::ValidationError(_) => 1099,

            // State errors (2000-2999)
            Self::InvalidStateTransition { .. } => 2001,

            // Arithmetic errors (4000-4999)
            Self::Overflow => 4001,
        }
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.code() {
            1000..=1999 => "validation",
            2000..=2999 => "state",
            4000..=4999 => "arithmetic",
            _ => "unknown",
        }
    }

    /// Returns true if this is a validation error.
    #[inline]
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self.code(), 1000..=1999)
    }

    /// Returns true if this is a state error.
    #[inline]
    #[must_use]
    pub const fn is_state_error(&self) -> bool {
        matches!(self.code(), 2000..=2999)
    }

    /// Returns true if this is an arithmetic error.
    #[inline]
    #[must_use]
    pub const fn is_arithmetic_error(&self) -> bool {
        matches!(self.code(), 4000..=4999)
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
