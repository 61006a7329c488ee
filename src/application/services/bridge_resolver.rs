//! # Bridge Resolver
//!
//! Resolves a question's arbitration bridge and foreign-chain routing.
//!
//! Lookups match chain names and proxy addresses case-insensitively over the
//! full bridge record set, in feed order. A question without a bridge is an
//! expected condition: resolution returns `None` instead of an error.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use oracle_arbitration::application::services::BridgeResolver;
//! use oracle_arbitration::domain::entities::BridgeRecord;
//! use oracle_arbitration::infrastructure::blockchain::{BridgeRegistry, ChainRegistry};
//!
//! let bridge = BridgeRecord {
//!     name: "Gnosis to Ethereum".to_string(),
//!     home_chain: "Gnosis".to_string(),
//!     home_proxy: "0xAbC0000000000000000000000000000000000001".to_string(),
//!     foreign_chain: "Ethereum".to_string(),
//!     foreign_proxy: "0xdef0000000000000000000000000000000000002".to_string(),
//!     ..Default::default()
//! };
//! let resolver = BridgeResolver::new(
//!     Arc::new(BridgeRegistry::from_records(vec![bridge])),
//!     Arc::new(ChainRegistry::with_known_chains()),
//! );
//!
//! let found = resolver.find_bridge("GNOSIS", "0xabc0000000000000000000000000000000000001");
//! assert_eq!(found.map(|b| b.name.as_str()), Some("Gnosis to Ethereum"));
//! ```

use crate::domain::entities::{BridgeRecord, ForeignProxyInfo, QuestionRecord};
use crate::infrastructure::blockchain::{BridgeRegistry, ChainRegistry};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Contract overview for one home chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainContractInfo {
    /// Chain name as queried.
    pub chain_name: String,
    /// True if any bridge record exists for the chain.
    pub has_contracts: bool,
    /// Non-testnet records.
    pub mainnet_contracts: Vec<BridgeRecord>,
    /// Testnet records.
    pub testnet_contracts: Vec<BridgeRecord>,
    /// Primary oracle address, if resolvable.
    pub primary_oracle: Option<String>,
    /// Number of bridge records for the chain.
    pub total_bridges: usize,
}

/// Read-only resolver over the bridge and chain registries.
#[derive(Debug, Clone)]
pub struct BridgeResolver {
    bridges: Arc<BridgeRegistry>,
    chains: Arc<ChainRegistry>,
}

impl BridgeResolver {
    /// Creates a resolver over shared registries.
    #[must_use]
    pub fn new(bridges: Arc<BridgeRegistry>, chains: Arc<ChainRegistry>) -> Self {
        Self { bridges, chains }
    }

    /// Returns the chain registry.
    #[inline]
    #[must_use]
    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    /// Returns the bridge registry.
    #[inline]
    #[must_use]
    pub fn bridges(&self) -> &BridgeRegistry {
        &self.bridges
    }

    /// Finds the first bridge registered for (`home_chain`, `home_proxy`).
    #[must_use]
    pub fn find_bridge(&self, home_chain: &str, home_proxy: &str) -> Option<&BridgeRecord> {
        self.bridges
            .iter()
            .find(|record| record.matches(home_chain, home_proxy))
    }

    /// Derives the foreign-chain routing of `question`.
    ///
    /// Returns `None` when the question has no chain name or arbitrator, or
    /// when no bridge matches.
    #[must_use]
    pub fn resolve_foreign_proxy_info(&self, question: &QuestionRecord) -> Option<ForeignProxyInfo> {
        let (Some(chain_name), Some(arbitrator)) = (question.chain_name(), question.arbitrator())
        else {
            debug!(
                question_id = %question.id,
                chain = ?question.chain_name(),
                arbitrator = ?question.arbitrator(),
                "Missing question data for bridge lookup"
            );
            return None;
        };

        let Some(bridge) = self.find_bridge(chain_name, arbitrator) else {
            debug!(
                question_id = %question.id,
                chain = chain_name,
                arbitrator,
                "No bridge found for arbitrator"
            );
            return None;
        };

        let info = ForeignProxyInfo {
            foreign_proxy_address: bridge.foreign_proxy.clone(),
            foreign_chain: bridge.foreign_chain.clone(),
            foreign_chain_id: self.chains.chain_id_for_name(&bridge.foreign_chain),
            home_chain: bridge.home_chain.clone(),
            home_chain_id: self.chains.chain_id_for_name(&bridge.home_chain),
            bridge_name: bridge.name.clone(),
            is_testnet: bridge.is_testnet,
        };
        debug!(
            question_id = %question.id,
            bridge = %info.bridge_name,
            foreign_chain_id = %info.foreign_chain_id,
            "Resolved foreign proxy"
        );
        Some(info)
    }

    /// Returns every bridge whose home chain is `chain_name`.
    #[must_use]
    pub fn list_contracts_for_chain(&self, chain_name: &str) -> Vec<&BridgeRecord> {
        self.bridges
            .iter()
            .filter(|record| record.is_on_home_chain(chain_name))
            .collect()
    }

    /// Returns the oracle address of the first mainnet bridge on
    /// `chain_name`, falling back to the chain registry's known address.
    #[must_use]
    pub fn primary_oracle_address(&self, chain_name: &str) -> Option<String> {
        self.bridges
            .iter()
            .filter(|record| record.is_on_home_chain(chain_name) && record.is_mainnet())
            .map(|record| record.oracle_address.as_str())
            .next()
            .or_else(|| self.chains.known_oracle_address(chain_name))
            .filter(|address| !address.is_empty())
            .map(str::to_string)
    }

    /// Returns the registered home proxy matching `arbitrator` on
    /// `chain_name`, with the registry's spelling.
    #[must_use]
    pub fn arbitrator_proxy_address(&self, chain_name: &str, arbitrator: Option<&str>) -> Option<&str> {
        let arbitrator = arbitrator.map(str::trim).filter(|a| !a.is_empty())?;
        self.list_contracts_for_chain(chain_name)
            .into_iter()
            .find(|record| record.home_proxy.eq_ignore_ascii_case(arbitrator))
            .map(|record| record.home_proxy.as_str())
    }

    /// Summarizes the contracts available on `chain_name`.
    #[must_use]
    pub fn chain_contract_info(&self, chain_name: &str) -> ChainContractInfo {
        let contracts = self.list_contracts_for_chain(chain_name);
        let (testnet, mainnet): (Vec<&BridgeRecord>, Vec<&BridgeRecord>) =
            contracts.iter().copied().partition(|record| record.is_testnet);

        ChainContractInfo {
            chain_name: chain_name.to_string(),
            has_contracts: !contracts.is_empty(),
            mainnet_contracts: mainnet.into_iter().cloned().collect(),
            testnet_contracts: testnet.into_iter().cloned().collect(),
            primary_oracle: self.primary_oracle_address(chain_name),
            total_bridges: contracts.len(),
        }
    }

    /// Returns true if arbitration was already requested for `question`.
    #[must_use]
    pub fn is_arbitration_requested(&self, question: &QuestionRecord) -> bool {
        question.is_arbitration_requested()
    }

    /// Returns true if arbitration may be requested for `question`.
    #[must_use]
    pub fn can_request_arbitration(&self, question: &QuestionRecord) -> bool {
        question.can_request_arbitration()
    }
}
