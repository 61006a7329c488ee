//! # Application Layer
//!
//! Transaction pipelines and the services they depend on.
//!
//! ## Use Cases
//!
//! - [`QuestionCreationPipeline`]: ask a question on a home chain oracle
//! - [`ArbitrationRequestPipeline`]: request arbitration on a foreign proxy
//!
//! ## Services
//!
//! - [`BridgeResolver`]: resolves bridges and foreign proxies

pub mod error;
pub mod services;
pub mod use_cases;

pub use error::{PipelineError, PipelineResult};
pub use services::{BridgeResolver, ChainContractInfo};
pub use use_cases::{
    ArbitrationRequestParams, ArbitrationRequestPipeline, CreateQuestionParams, PreparedCall,
    QuestionCreationPipeline, TransactionPipeline,
};
