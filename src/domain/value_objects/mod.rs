//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`ChainId`]: Canonical hex chain identifier
//! - [`QuestionId`]: 32-byte oracle question identifier
//! - [`TransactionHash`]: 32-byte transaction hash
//!
//! ## Numeric Types
//!
//! - [`NativeAmount`]: Native-currency amount in base units
//!
//! ## State Types
//!
//! - [`PipelinePhase`]: Transaction pipeline state machine

pub mod amount;
pub mod chain;
pub mod ids;
pub mod pipeline_phase;

pub use amount::{NATIVE_DECIMALS, NativeAmount};
pub use chain::{ChainDescriptor, ChainId};
pub use ids::{QuestionId, TransactionHash};
pub use pipeline_phase::{InvalidPipelinePhaseError, PipelinePhase};
