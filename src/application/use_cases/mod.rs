//! # Use Cases
//!
//! Transaction workflows built on the shared [`TransactionPipeline`].
//!
//! Each flow owns its pipeline instance; independent flows never share
//! state.

pub mod create_question;
pub mod pipeline;
pub mod request_arbitration;

#[cfg(test)]
mod tests;

pub use create_question::{CreateQuestionParams, QuestionCreationPipeline};
pub use pipeline::{PreparedCall, TransactionPipeline};
pub use request_arbitration::{ArbitrationRequestParams, ArbitrationRequestPipeline};
