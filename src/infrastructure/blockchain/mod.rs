//! # Blockchain Clients
//!
//! Chain and bridge registries, contract ABI helpers, and the wallet and
//! contract gateways used by the transaction pipelines.

pub mod bridges;
pub mod chains;
pub mod contracts;
pub mod gateway;
pub mod wallet;

pub use bridges::{BridgeRegistry, RegistryError, RegistryResult};
pub use chains::{ChainInfo, ChainRegistry};
pub use gateway::{ContractCall, ContractGateway, EthersContractGateway, GatewayError, GatewayResult};
pub use wallet::{JsonRpcWallet, USER_REJECTED_CODE, WalletError, WalletGateway, WalletResult};
