//! # Domain Entities
//!
//! Records this crate reasons about.
//!
//! - [`BridgeRecord`]: Registered home ↔ foreign arbitration bridge
//! - [`ForeignProxyInfo`]: Foreign-chain routing derived from a bridge
//! - [`QuestionRecord`]: Oracle question from the data feed
//! - [`PipelineState`]: Observable state of a transaction pipeline

pub mod bridge;
pub mod pipeline_state;
pub mod question;

pub use bridge::{BridgeRecord, ForeignProxyInfo};
pub use pipeline_state::{
    FailureKind, GasEstimate, PipelineFailure, PipelineState, TransactionOutcome,
};
pub use question::{QuestionPhase, QuestionRecord};
