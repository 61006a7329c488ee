//! # Pipeline Phase
//!
//! Transaction pipeline lifecycle state machine.
//!
//! This module provides the [`PipelinePhase`] enum representing the lifecycle
//! of one transaction attempt with enforced phase transitions.
//!
//! # State Machine
//!
//! ```text
//! Idle ⇄ Estimating
//!  │
//!  └→ Submitting → Confirming → Succeeded
//!  ↓       ↓           ↓
//!  └───────┴───────────┴→ Failed
//! ```
//!
//! An explicit reset returns any phase to `Idle`; it bypasses the
//! transition table.
//!
//! # Examples
//!
//! ```
//! use oracle_arbitration::domain::value_objects::pipeline_phase::PipelinePhase;
//!
//! let phase = PipelinePhase::Idle;
//! assert!(phase.can_transition_to(PipelinePhase::Submitting));
//! assert!(!phase.can_transition_to(PipelinePhase::Succeeded));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction pipeline phase.
///
/// # Terminal Phases
///
/// - [`Succeeded`](PipelinePhase::Succeeded) - transaction confirmed
/// - [`Failed`](PipelinePhase::Failed) - attempt failed
///
/// Terminal phases are final for an attempt; the pipeline is re-armed
/// by resetting it to [`Idle`](PipelinePhase::Idle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum PipelinePhase {
    /// Ready for a new attempt.
    #[default]
    Idle = 0,

    /// Gas estimation is running (side branch, returns to Idle).
    Estimating = 1,

    /// Transaction is being broadcast.
    Submitting = 2,

    /// Transaction broadcast, waiting for the receipt.
    Confirming = 3,

    /// Transaction confirmed (terminal).
    Succeeded = 4,

    /// Attempt failed (terminal).
    Failed = 5,
}

impl PipelinePhase {
    /// Returns true if this is a terminal phase.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if this phase can transition to the target phase.
    ///
    /// - Idle → Estimating, Submitting, Failed
    /// - Estimating → Idle, Failed
    /// - Submitting → Confirming, Failed
    /// - Confirming → Succeeded, Failed
    /// - Terminal phases → (none)
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Estimating)
                | (Self::Idle, Self::Submitting)
                | (Self::Idle, Self::Failed)
                | (Self::Estimating, Self::Idle)
                | (Self::Estimating, Self::Failed)
                | (Self::Submitting, Self::Confirming)
                | (Self::Submitting, Self::Failed)
                | (Self::Confirming, Self::Succeeded)
                | (Self::Confirming, Self::Failed)
        )
    }

    /// Returns the valid next phases from this phase.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Idle => vec![Self::Estimating, Self::Submitting, Self::Failed],
            Self::Estimating => vec![Self::Idle, Self::Failed],
            Self::Submitting => vec![Self::Confirming, Self::Failed],
            Self::Confirming => vec![Self::Succeeded, Self::Failed],
            Self::Succeeded | Self::Failed => vec![],
        }
    }

    /// Returns true while an estimation, broadcast or confirmation is running.
    #[inline]
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::Estimating | Self::Submitting | Self::Confirming)
    }

    /// Returns true if the pipeline is busy with a read-only or broadcast call.
    #[inline]
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Estimating | Self::Submitting)
    }

    /// Returns true if this phase indicates a successful outcome.
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if this phase indicates a failure outcome.
    #[inline]
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns the numeric value of this phase.
    #[inline]
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Estimating => "ESTIMATING",
            Self::Submitting => "SUBMITTING",
            Self::Confirming => "CONFIRMING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

impl TryFrom<u8> for PipelinePhase {
    type Error = InvalidPipelinePhaseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Idle),
            1 => Ok(Self::Estimating),
            2 => Ok(Self::Submitting),
            3 => Ok(Self::Confirming),
            4 => Ok(Self::Succeeded),
            5 => Ok(Self::Failed),
            _ => Err(InvalidPipelinePhaseError(value)),
        }
    }
}

/// Error returned when converting an invalid u8 to [`PipelinePhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPipelinePhaseError(pub u8);

impl fmt::Display for InvalidPipelinePhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pipeline phase value: {}", self.0)
    }
}

impl std::error::Error for InvalidPipelinePhaseError {}
