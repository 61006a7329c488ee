//! # Infrastructure Layer
//!
//! External adapters and implementations of the ports the pipelines use.
//!
//! ## Blockchain
//!
//! - Chain registry and bridge registry feed loader
//! - Contract ABI encoding and event decoding
//! - Wallet and contract gateways over ethers-rs JSON-RPC providers

pub mod blockchain;
