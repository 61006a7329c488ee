//! # Bridge Entities
//!
//! Registered home-chain ↔ foreign-chain arbitration bridges.
//!
//! This module provides the [`BridgeRecord`] entity as published by the
//! bridge registry feed, and the derived [`ForeignProxyInfo`] routing value
//! used to target the foreign-chain arbitration proxy.
//!
//! # Feed Format
//!
//! Records are deserialized from the feed's own field names:
//!
//! ```
//! use oracle_arbitration::domain::entities::bridge::BridgeRecord;
//!
//! let record: BridgeRecord = serde_json::from_str(r#"{
//!     "Name": "Kleros Gnosis",
//!     "Home Chain": "Gnosis",
//!     "Home Proxy": "0xAbC0000000000000000000000000000000000001",
//!     "Foreign Chain": "Ethereum",
//!     "Foreign Proxy": "0xdef0000000000000000000000000000000000002",
//!     "Oracle": "0xEb51d9d9717906c981C57af09C4a3449eF30705b",
//!     "Testnet": "No"
//! }"#).unwrap();
//!
//! assert!(record.matches("gnosis", "0xabc0000000000000000000000000000000000001"));
//! assert!(!record.is_testnet);
//! ```

use crate::domain::value_objects::ChainId;
use serde::{Deserialize, Deserializer, Serialize};

/// A registered arbitration bridge.
///
/// Immutable once loaded. Chain names and proxy addresses are kept as
/// published; all comparisons ignore ASCII case.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BridgeRecord {
    /// Bridge display name.
    #[serde(rename = "Name", default)]
    pub name: String,

    /// Name of the chain the question lives on.
    #[serde(rename = "Home Chain", default)]
    pub home_chain: String,

    /// Arbitrator proxy address on the home chain.
    #[serde(rename = "Home Proxy", default)]
    pub home_proxy: String,

    /// Name of the chain that runs the dispute.
    #[serde(rename = "Foreign Chain", default)]
    pub foreign_chain: String,

    /// Arbitration proxy address on the foreign chain.
    #[serde(rename = "Foreign Proxy", default)]
    pub foreign_proxy: String,

    /// Oracle contract address on the home chain.
    #[serde(rename = "Oracle", default)]
    pub oracle_address: String,

    /// Appeals information; the feed publishes either text or a flag.
    #[serde(rename = "Appeals", default, deserialize_with = "text_or_flag")]
    pub appeals: String,

    /// True when the feed marks the bridge as testnet (`"Yes"`).
    #[serde(
        rename = "Testnet",
        default,
        deserialize_with = "yes_flag",
        serialize_with = "serialize_yes_flag"
    )]
    pub is_testnet: bool,
}

impl BridgeRecord {
    /// Returns true if this record belongs to `home_chain` and `home_proxy`.
    #[must_use]
    pub fn matches(&self, home_chain: &str, home_proxy: &str) -> bool {
        self.is_on_home_chain(home_chain) && self.home_proxy.eq_ignore_ascii_case(home_proxy.trim())
    }

    /// Returns true if the record's home chain is `chain_name`.
    #[must_use]
    pub fn is_on_home_chain(&self, chain_name: &str) -> bool {
        self.home_chain.eq_ignore_ascii_case(chain_name.trim())
    }

    /// Returns true if the record is a mainnet (non-testnet) bridge.
    #[inline]
    #[must_use]
    pub const fn is_mainnet(&self) -> bool {
        !self.is_testnet
    }
}

fn text_or_flag<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Flag(bool),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Flag(true) => "Yes".to_string(),
        Raw::Flag(false) | Raw::Missing(()) => String::new(),
    })
}

fn yes_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref() == Some("Yes"))
}

fn serialize_yes_flag<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(if *value { "Yes" } else { "No" })
}

/// Foreign-chain routing derived from a question's bridge.
///
/// Computed fresh from the current question on every request; it is never
/// cached or mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignProxyInfo {
    /// Arbitration proxy address on the foreign chain.
    pub foreign_proxy_address: String,
    /// Foreign chain name as published.
    pub foreign_chain: String,
    /// Foreign chain id.
    pub foreign_chain_id: ChainId,
    /// Home chain name as published.
    pub home_chain: String,
    /// Home chain id.
    pub home_chain_id: ChainId,
    /// Bridge display name.
    pub bridge_name: String,
    /// Whether the bridge is a testnet bridge.
    pub is_testnet: bool,
}
