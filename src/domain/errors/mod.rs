//! # Domain Errors
//!
//! Typed error types for domain operations.
//!
//! Error codes are organized by category:
//! - 1000-1999: Validation errors
//! - 2000-2999: State errors
//! - 4000-4999: Arithmetic errors

pub mod domain_error;

pub use domain_error::{DomainError, DomainResult};
