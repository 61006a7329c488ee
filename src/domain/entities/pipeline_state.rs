//! # Pipeline State
//!
//! The status surface of one transaction pipeline instance.
//!
//! [`PipelineState`] is what a UI observes: the current
//! [`PipelinePhase`], the last failure, the transaction hash once a
//! broadcast succeeded, the confirmed outcome, and the latest gas estimate.
//! Phase changes go through [`PipelineState::transition`], which enforces
//! the phase state machine.
//!
//! # Examples
//!
//! ```
//! use oracle_arbitration::domain::entities::pipeline_state::PipelineState;
//! use oracle_arbitration::domain::value_objects::PipelinePhase;
//!
//! let mut state = PipelineState::new();
//! state.transition(PipelinePhase::Submitting).unwrap();
//! assert!(state.is_loading());
//! assert!(state.transition(PipelinePhase::Succeeded).is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{NativeAmount, PipelinePhase, QuestionId, TransactionHash};
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// The user explicitly declined a wallet prompt.
    UserRejected,
    /// The account cannot pay value plus gas.
    InsufficientFunds,
    /// The wallet is on another chain and could not be switched.
    WrongNetwork,
    /// No connected account could be obtained.
    WalletNotConnected,
    /// A bridge, oracle address or dispute fee is not available.
    MissingContractData,
    /// Gas estimation failed (warning only).
    SimulationFailed,
    /// Broadcast failed or the transaction reverted.
    SubmissionFailed,
    /// The receipt was missing or lacked the expected event.
    ConfirmationFailed,
    /// Caller supplied an unusable parameter.
    InvalidInput,
    /// Another attempt is already running.
    Busy,
    /// The attempt was reset before it broadcast.
    Cancelled,
}

impl FailureKind {
    /// Returns true if the condition can be fixed locally by re-issuing the
    /// corrective wallet call (connect, switch) and retrying.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::WrongNetwork | Self::WalletNotConnected)
    }

    /// Returns true if the failure is only a warning and does not end an
    /// attempt.
    #[inline]
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::SimulationFailed)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UserRejected => "USER_REJECTED",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::WrongNetwork => "WRONG_NETWORK",
            Self::WalletNotConnected => "WALLET_NOT_CONNECTED",
            Self::MissingContractData => "MISSING_CONTRACT_DATA",
            Self::SimulationFailed => "SIMULATION_FAILED",
            Self::SubmissionFailed => "SUBMISSION_FAILED",
            Self::ConfirmationFailed => "CONFIRMATION_FAILED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::Busy => "BUSY",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// A failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineFailure {
    /// Failure classification.
    pub kind: FailureKind,
    /// Stable human-readable message.
    pub message: String,
}

impl PipelineFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// The confirmed result of a successful attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionOutcome {
    /// A new oracle question was created.
    QuestionCreated {
        /// Identifier taken from the creation event.
        question_id: QuestionId,
        /// Block that included the transaction.
        block_number: Option<u64>,
    },
    /// Arbitration was requested for a question.
    ArbitrationRequested {
        /// The question under arbitration.
        question_id: QuestionId,
        /// Block that included the transaction.
        block_number: Option<u64>,
    },
}

impl TransactionOutcome {
    /// Returns the question the outcome refers to.
    #[inline]
    #[must_use]
    pub const fn question_id(&self) -> QuestionId {
        match self {
            Self::QuestionCreated { question_id, .. }
            | Self::ArbitrationRequested { question_id, .. } => *question_id,
        }
    }

    /// Returns the inclusion block, if known.
    #[inline]
    #[must_use]
    pub const fn block_number(&self) -> Option<u64> {
        match self {
            Self::QuestionCreated { block_number, .. }
            | Self::ArbitrationRequested { block_number, .. } => *block_number,
        }
    }
}

/// Gas cost estimate of a pending call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    /// Estimated gas units.
    pub gas_units: U256,
    /// Network gas price in base units per gas.
    pub gas_price: U256,
    /// `gas_units * gas_price` as a native amount.
    pub cost: NativeAmount,
}

impl GasEstimate {
    /// Builds an estimate from gas units and price.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Overflow` if the product does not fit.
    pub fn new(gas_units: U256, gas_price: U256) -> DomainResult<Self> {
        Ok(Self {
            gas_units,
            gas_price,
            cost: NativeAmount::from_gas(gas_units, gas_price)?,
        })
    }
}

/// Observable state of one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineState {
    /// Current phase.
    pub phase: PipelinePhase,
    /// Last failure or warning.
    pub error: Option<PipelineFailure>,
    /// Hash of the broadcast transaction.
    pub tx_hash: Option<TransactionHash>,
    /// Confirmed outcome.
    pub outcome: Option<TransactionOutcome>,
    /// Latest gas estimate.
    pub gas_estimate: Option<GasEstimate>,
}

impl PipelineState {
    /// Creates an idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to `to` if the phase state machine allows it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` otherwise; the state is
    /// left unchanged.
    pub fn transition(&mut self, to: PipelinePhase) -> DomainResult<()> {
        if !self.phase.can_transition_to(to) {
            return Err(DomainError::invalid_transition(self.phase, to));
        }
        self.phase = to;
        Ok(())
    }

    /// Records a broadcast transaction and moves to `Confirming`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless `Submitting`.
    pub fn record_broadcast(&mut self, hash: TransactionHash) -> DomainResult<()> {
        self.transition(PipelinePhase::Confirming)?;
        self.tx_hash = Some(hash);
        Ok(())
    }

    /// Records the confirmed outcome and moves to `Succeeded`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless `Confirming`.
    pub fn succeed(&mut self, outcome: TransactionOutcome) -> DomainResult<()> {
        self.transition(PipelinePhase::Succeeded)?;
        self.outcome = Some(outcome);
        Ok(())
    }

    /// Records a failure and moves to `Failed`. Any transaction hash
    /// already recorded is kept.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` from a terminal phase.
    pub fn fail(&mut self, failure: PipelineFailure) -> DomainResult<()> {
        self.transition(PipelinePhase::Failed)?;
        self.error = Some(failure);
        Ok(())
    }

    /// Returns true while estimating or broadcasting.
    #[inline]
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }

    /// Returns true while waiting for the receipt.
    #[inline]
    #[must_use]
    pub fn is_confirming(&self) -> bool {
        self.phase == PipelinePhase::Confirming
    }

    /// Returns true once the transaction is confirmed.
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.phase.is_success()
    }

    /// Returns the question id of the confirmed outcome.
    #[must_use]
    pub fn question_id(&self) -> Option<QuestionId> {
        self.outcome.as_ref().map(TransactionOutcome::question_id)
    }

    /// Returns the current error message.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}
