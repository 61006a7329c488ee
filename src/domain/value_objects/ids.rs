//! # Identity Value Objects
//!
//! Type-safe wrappers for on-chain identifiers.
//!
//! - [`QuestionId`] - 32-byte oracle question identifier
//! - [`TransactionHash`] - 32-byte transaction hash
//!
//! Both wrap the raw 32 bytes. A question id is the canonical identifier
//! assigned by the oracle contract; it is carried byte-for-byte into every
//! contract call and never re-hashed.

use crate::domain::errors::{DomainError, DomainResult};
use ethers::types::H256;
use ethers::utils::hex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn parse_bytes32(value: &str) -> Option<H256> {
    let digits = value.trim().strip_prefix("0x")?;
    if digits.len() != 64 {
        return None;
    }
    let bytes = hex::decode(digits).ok()?;
    Some(H256::from_slice(&bytes))
}

fn bytes32_hex(value: &H256) -> String {
    format!("0x{}", hex::encode(value.as_bytes()))
}

/// Oracle question identifier.
///
/// # Examples
///
/// ```
/// use oracle_arbitration::domain::value_objects::ids::QuestionId;
///
/// let raw = format!("0x{}", "ab".repeat(32));
/// let id: QuestionId = raw.parse().unwrap();
/// assert_eq!(id.to_string(), raw);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuestionId(H256);

impl QuestionId {
    /// Creates a question id from raw bytes.
    #[inline]
    #[must_use]
    pub const fn new(hash: H256) -> Self {
        Self(hash)
    }

    /// Returns the raw 32-byte value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> H256 {
        self.0
    }

    /// Returns the id as a byte slice.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bytes32_hex(&self.0))
    }
}

impl FromStr for QuestionId {
    type Err = DomainError;

    /// Parses a `0x`-prefixed, 64 hex digit string.
    fn from_str(s: &str) -> DomainResult<Self> {
        parse_bytes32(s)
            .map(Self)
            .ok_or_else(|| DomainError::InvalidQuestionId(s.to_string()))
    }
}

impl TryFrom<String> for QuestionId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QuestionId> for String {
    fn from(id: QuestionId) -> Self {
        id.to_string()
    }
}

impl From<H256> for QuestionId {
    #[inline]
    fn from(hash: H256) -> Self {
        Self(hash)
    }
}

/// Transaction hash returned by a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionHash(H256);

impl TransactionHash {
    /// Creates a transaction hash from raw bytes.
    #[inline]
    #[must_use]
    pub const fn new(hash: H256) -> Self {
        Self(hash)
    }

    /// Returns the raw 32-byte value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> H256 {
        self.0
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bytes32_hex(&self.0))
    }
}

impl FromStr for TransactionHash {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        parse_bytes32(s)
            .map(Self)
            .ok_or_else(|| DomainError::ValidationError(format!("invalid transaction hash: {s}")))
    }
}

impl TryFrom<String> for TransactionHash {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionHash> for String {
    fn from(hash: TransactionHash) -> Self {
        hash.to_string()
    }
}

impl From<H256> for TransactionHash {
    #[inline]
    fn from(hash: H256) -> Self {
        Self(hash)
    }
}

impl From<TransactionHash> for H256 {
    #[inline]
    fn from(hash: TransactionHash) -> Self {
        hash.0
    }
}
