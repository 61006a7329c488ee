//! # Application Errors
//!
//! Error taxonomy of the transaction pipelines.
//!
//! Every [`PipelineError`] maps to a [`FailureKind`] and renders a stable,
//! human-readable message; [`PipelineError::failure`] produces the
//! [`PipelineFailure`] stored in the pipeline state.

use crate::domain::entities::{FailureKind, PipelineFailure};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::PipelinePhase;
use crate::infrastructure::blockchain::wallet::UNRECOGNIZED_CHAIN_CODE;
use crate::infrastructure::blockchain::{GatewayError, WalletError};
use thiserror::Error;

/// Pipeline error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The user declined a wallet prompt.
    #[error("transaction rejected by the user")]
    UserRejected,

    /// The account cannot pay value plus gas.
    #[error("insufficient funds to pay for the transaction")]
    InsufficientFunds,

    /// The wallet is on the wrong chain and could not be switched.
    #[error("wrong network: {0}")]
    WrongNetwork(String),

    /// No connected account could be obtained.
    #[error("wallet not connected: {0}")]
    WalletNotConnected(String),

    /// Bridge, oracle address or dispute fee is missing.
    #[error("missing contract data: {0}")]
    MissingContractData(String),

    /// Gas estimation failed.
    #[error("gas estimation failed: {0}")]
    SimulationFailed(String),

    /// Broadcast failed or the transaction reverted.
    #[error("transaction failed: {}", reason.as_deref().unwrap_or(message))]
    SubmissionFailed {
        /// Provider or pipeline message.
        message: String,
        /// Revert reason, when one was returned.
        reason: Option<String>,
    },

    /// The receipt was missing or lacked the expected event.
    #[error("confirmation failed: {0}")]
    ConfirmationFailed(String),

    /// A caller-supplied parameter is unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Another attempt is running or the previous one was not reset.
    #[error("pipeline is busy ({0})")]
    Busy(PipelinePhase),

    /// The attempt was reset before it broadcast.
    #[error("attempt cancelled by reset")]
    Cancelled,
}

impl PipelineError {
    /// Creates a wrong network error.
    #[must_use]
    pub fn wrong_network(message: impl Into<String>) -> Self {
        Self::WrongNetwork(message.into())
    }

    /// Creates a wallet not connected error.
    #[must_use]
    pub fn wallet_not_connected(message: impl Into<String>) -> Self {
        Self::WalletNotConnected(message.into())
    }

    /// Creates a missing contract data error.
    #[must_use]
    pub fn missing_contract_data(message: impl Into<String>) -> Self {
        Self::MissingContractData(message.into())
    }

    /// Creates a confirmation failed error.
    #[must_use]
    pub fn confirmation_failed(message: impl Into<String>) -> Self {
        Self::ConfirmationFailed(message.into())
    }

    /// Creates a submission failed error without a revert reason.
    #[must_use]
    pub fn submission_failed(message: impl Into<String>) -> Self {
        Self::SubmissionFailed {
            message: message.into(),
            reason: None,
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Classifies a broadcast failure.
    #[must_use]
    pub fn from_submission(err: GatewayError) -> Self {
        if err.is_user_rejected() {
            Self::UserRejected
        } else if err.is_insufficient_funds() {
            Self::InsufficientFunds
        } else {
            Self::SubmissionFailed {
                message: err.message,
                reason: err.reason,
            }
        }
    }

    /// Classifies a failed chain switch. Any failure, including a user
    /// decline, is a wrong network condition.
    #[must_use]
    pub fn from_switch(err: &WalletError, required: impl std::fmt::Display) -> Self {
        if err.is_user_rejected() {
            Self::WrongNetwork(format!("switch to chain {required} was rejected by the user"))
        } else if err.code == Some(UNRECOGNIZED_CHAIN_CODE) {
            Self::WrongNetwork(format!("chain {required} is not configured in the wallet"))
        } else {
            Self::WrongNetwork(format!("could not switch to chain {required}: {}", err.message))
        }
    }

    /// Returns the failure classification.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::UserRejected => FailureKind::UserRejected,
            Self::InsufficientFunds => FailureKind::InsufficientFunds,
            Self::WrongNetwork(_) => FailureKind::WrongNetwork,
            Self::WalletNotConnected(_) => FailureKind::WalletNotConnected,
            Self::MissingContractData(_) => FailureKind::MissingContractData,
            Self::SimulationFailed(_) => FailureKind::SimulationFailed,
            Self::SubmissionFailed { .. } => FailureKind::SubmissionFailed,
            Self::ConfirmationFailed(_) => FailureKind::ConfirmationFailed,
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::Busy(_) => FailureKind::Busy,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }

    /// Returns true if re-issuing the corrective wallet call may fix it.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        self.kind().is_recoverable()
    }

    /// Returns the failure record for the pipeline state.
    #[must_use]
    pub fn failure(&self) -> PipelineFailure {
        PipelineFailure::new(self.kind(), self.to_string())
    }
}

impl From<DomainError> for PipelineError {
    fn from(err: DomainError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
