//! # Domain Layer
//!
//! Core types of the oracle arbitration client.
//!
//! This layer contains:
//! - **Entities**: Bridge records, questions and pipeline state
//! - **Value Objects**: Immutable types with validation (chain ids, question ids, amounts)
//! - **Errors**: Domain-specific error types

pub mod entities;
pub mod errors;
pub mod value_objects;
