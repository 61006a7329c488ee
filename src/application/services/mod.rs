//! # Application Services
//!
//! Read-only services shared by the use cases.
//!
//! - [`BridgeResolver`]: bridge lookup and foreign-chain routing

pub mod bridge_resolver;

pub use bridge_resolver::{BridgeResolver, ChainContractInfo};
