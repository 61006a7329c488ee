//! # Chain Registry
//!
//! Static chain name ⇄ chain id mapping with per-chain contract defaults.
//!
//! Chain names come from the bridge feed and the question data feed in
//! varying case ("Gnosis", "gnosis", "Arbitrum Sepolia"), so every lookup
//! normalizes the name. Unknown names resolve to Ethereum mainnet.
//!
//! # Examples
//!
//! ```
//! use oracle_arbitration::infrastructure::blockchain::chains::ChainRegistry;
//! use oracle_arbitration::domain::value_objects::ChainId;
//!
//! let registry = ChainRegistry::with_known_chains();
//! assert_eq!(registry.chain_id_for_name("Polygon"), ChainId::POLYGON);
//! assert_eq!(registry.chain_id_for_name("unknown-l2"), ChainId::ETHEREUM);
//! ```

use crate::domain::value_objects::{ChainDescriptor, ChainId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Registry key for a chain name.
fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Static information about one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Display name.
    pub name: String,
    /// Chain id.
    pub id: ChainId,
    /// Native currency symbol.
    pub native_currency_symbol: String,
    /// Alternative names the chain is published under.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Oracle contract used when the bridge feed has no mainnet record.
    #[serde(default)]
    pub known_oracle: Option<String>,
    /// Arbitrator assigned to newly created questions.
    #[serde(default)]
    pub default_arbitrator: Option<String>,
}

impl ChainInfo {
    /// Creates chain info without contract defaults.
    #[must_use]
    pub fn new(name: impl Into<String>, id: ChainId, native_currency_symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id,
            native_currency_symbol: native_currency_symbol.into(),
            aliases: Vec::new(),
            known_oracle: None,
            default_arbitrator: None,
        }
    }

    /// Adds an alternative name.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets the fallback oracle address.
    #[must_use]
    pub fn with_known_oracle(mut self, address: impl Into<String>) -> Self {
        self.known_oracle = Some(address.into());
        self
    }

    /// Sets the default arbitrator address.
    #[must_use]
    pub fn with_default_arbitrator(mut self, address: impl Into<String>) -> Self {
        self.default_arbitrator = Some(address.into());
        self
    }

    /// Returns the descriptor of this chain.
    #[must_use]
    pub fn descriptor(&self) -> ChainDescriptor {
        ChainDescriptor::new(self.id, self.name.clone(), self.native_currency_symbol.clone())
    }
}

/// Registry of chains known to the client.
///
/// Immutable after construction and shared through `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: Vec<ChainInfo>,
    by_name: HashMap<String, usize>,
}

impl ChainRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the supported chains pre-populated.
    #[must_use]
    pub fn with_known_chains() -> Self {
        let mut registry = Self::new();

        registry.register(
            ChainInfo::new("Ethereum", ChainId::ETHEREUM, "ETH")
                .with_known_oracle("0x325a2e0F3CCA2ddbaeBB4DfC38Df8D19ca165b47")
                .with_default_arbitrator("0x988b3A538b618C7A603e1c11Ab82Cd16dbE28069"),
        );
        registry.register(
            ChainInfo::new("Sepolia", ChainId::new(11_155_111), "ETH")
                .with_known_oracle("0xB7982f20CC159a40eba4b0eA86fd6cbA6Ff810e1"),
        );
        registry.register(
            ChainInfo::new("Gnosis", ChainId::GNOSIS, "xDAI")
                .with_known_oracle("0xEb51d9d9717906c981C57af09C4a3449eF30705b")
                .with_default_arbitrator("0x68154EA682f95BF582b80Dd6453FA401737491Dc"),
        );
        registry.register(
            ChainInfo::new("Polygon", ChainId::POLYGON, "POL")
                .with_known_oracle("0x60573B8DcE539aE5bF9aD7932310668997ef0428")
                .with_default_arbitrator("0x5AFa42b30955f137e10f89dfb5EF1542a186F90e"),
        );
        registry.register(ChainInfo::new("Arbitrum", ChainId::new(42_161), "ETH"));
        registry.register(
            ChainInfo::new("Arbitrum Sepolia", ChainId::new(421_614), "ETH")
                .with_alias("arbitrum_sepolia"),
        );
        registry.register(ChainInfo::new("Optimism", ChainId::new(10), "ETH"));
        registry.register(ChainInfo::new("Base", ChainId::new(8_453), "ETH"));

        registry
    }

    /// Registers a chain. A later registration replaces earlier name or
    /// alias mappings.
    pub fn register(&mut self, chain: ChainInfo) {
        let index = self.chains.len();
        self.by_name.insert(normalize_name(&chain.name), index);
        for alias in &chain.aliases {
            self.by_name.insert(normalize_name(alias), index);
        }
        self.chains.push(chain);
    }

    /// Looks up a chain by name or alias, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ChainInfo> {
        self.by_name
            .get(&normalize_name(name))
            .and_then(|&index| self.chains.get(index))
    }

    /// Returns the chain id for `name`, or Ethereum mainnet when unknown.
    #[must_use]
    pub fn chain_id_for_name(&self, name: &str) -> ChainId {
        self.get(name).map_or(ChainId::ETHEREUM, |chain| chain.id)
    }

    /// Returns the fallback oracle address for `chain_name`.
    #[must_use]
    pub fn known_oracle_address(&self, chain_name: &str) -> Option<&str> {
        self.get(chain_name)?.known_oracle.as_deref()
    }

    /// Returns the default arbitrator for `chain_name`, falling back to the
    /// Ethereum arbitrator.
    #[must_use]
    pub fn default_arbitrator(&self, chain_name: &str) -> Option<&str> {
        self.get(chain_name)
            .and_then(|chain| chain.default_arbitrator.as_deref())
            .or_else(|| {
                self.chain_by_id(ChainId::ETHEREUM)
                    .and_then(|chain| chain.default_arbitrator.as_deref())
            })
    }

    /// Returns the descriptor for `name`.
    ///
    /// Unknown names get the Ethereum chain id and currency while keeping the
    /// given name.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> ChainDescriptor {
        match self.get(name) {
            Some(chain) => chain.descriptor(),
            None => ChainDescriptor::new(ChainId::ETHEREUM, name.trim(), "ETH"),
        }
    }

    /// Returns the first registered chain with the given id.
    #[must_use]
    pub fn chain_by_id(&self, id: ChainId) -> Option<&ChainInfo> {
        self.chains.iter().find(|chain| chain.id == id)
    }

    /// Returns the display name of the chain with the given id.
    #[must_use]
    pub fn name_for_chain_id(&self, id: ChainId) -> Option<&str> {
        self.chain_by_id(id).map(|chain| chain.name.as_str())
    }

    /// Returns all registered chains in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ChainInfo> {
        self.chains.iter()
    }

    /// Returns the number of registered chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns true if no chains are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
