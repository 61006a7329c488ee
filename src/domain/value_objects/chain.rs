//! # Chain Value Objects
//!
//! Canonical chain identifiers and chain descriptors.
//!
//! Wallets and the bridge registry exchange chain ids as hex strings
//! (`"0x1"`, `"0xa4b1"`). [`ChainId`] stores the numeric value and always
//! renders the canonical lower-case form, so ids from different sources
//! compare equal regardless of case or leading zeros.
//!
//! # Examples
//!
//! ```
//! use oracle_arbitration::domain::value_objects::chain::ChainId;
//!
//! let id: ChainId = "0x0A4B1".parse().unwrap();
//! assert_eq!(id.to_string(), "0xa4b1");
//! assert_eq!(id.as_u64(), 42161);
//! ```

use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical EVM chain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(u64);

impl ChainId {
    /// Ethereum mainnet, the fallback for unknown chain names.
    pub const ETHEREUM: Self = Self(1);
    /// Gnosis chain.
    pub const GNOSIS: Self = Self(100);
    /// Polygon PoS.
    pub const POLYGON: Self = Self(137);

    /// Creates a chain id from its numeric value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric chain id.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the canonical hex representation (`0x` + lower-case hex).
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = DomainError;

    /// Parses a `0x`-prefixed hex id (any case) or a plain decimal id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        };

        parsed
            .map(Self)
            .map_err(|_| DomainError::InvalidChainId(s.to_string()))
    }
}

impl TryFrom<String> for ChainId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> Self {
        id.to_hex()
    }
}

impl From<u64> for ChainId {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A chain as seen by the client: id, display name and native currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    /// Chain identifier.
    pub id: ChainId,
    /// Human readable chain name (e.g. "Ethereum", "Gnosis").
    pub name: String,
    /// Symbol of the native currency (e.g. "ETH", "xDAI").
    pub native_currency_symbol: String,
}

impl ChainDescriptor {
    /// Creates a new chain descriptor.
    #[must_use]
    pub fn new(
        id: ChainId,
        name: impl Into<String>,
        native_currency_symbol: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            native_currency_symbol: native_currency_symbol.into(),
        }
    }

    /// Returns true if `name` refers to this chain, ignoring case.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}
