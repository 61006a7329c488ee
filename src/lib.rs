//! # Oracle Arbitration
//!
//! Client-side transaction pipelines for an optimistic oracle with
//! cross-chain arbitration: asking questions on a home chain and requesting
//! arbitration through a home/foreign proxy bridge.
//!
//! ## Architecture
//!
//! This crate follows Domain-Driven Design with a layered architecture:
//!
//! - **Domain Layer** (`domain`): Bridge and question records, pipeline state, value objects
//! - **Application Layer** (`application`): Bridge resolution and the transaction pipelines
//! - **Infrastructure Layer** (`infrastructure`): Registries, contract ABI, wallet and RPC gateways
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oracle_arbitration::application::{ArbitrationRequestParams, ArbitrationRequestPipeline};
//!
//! let pipeline = ArbitrationRequestPipeline::new(Some(question), resolver, wallet, gateway);
//! pipeline.load_dispute_fee().await?;
//! let outcome = pipeline
//!     .request_arbitration(&ArbitrationRequestParams::new())
//!     .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
