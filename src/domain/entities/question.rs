//! # Question Entity
//!
//! Oracle questions as delivered by the question data feed.
//!
//! A [`QuestionRecord`] is read-only to this crate. Its [`QuestionId`] is
//! the canonical on-chain identifier and is forwarded byte-for-byte into
//! contract calls.
//!
//! # Examples
//!
//! ```
//! use oracle_arbitration::domain::entities::question::{QuestionPhase, QuestionRecord};
//! use oracle_arbitration::domain::value_objects::{ChainDescriptor, ChainId, QuestionId};
//!
//! let id: QuestionId = format!("0x{}", "11".repeat(32)).parse().unwrap();
//! let question = QuestionRecord::new(id)
//!     .with_chain(ChainDescriptor::new(ChainId::GNOSIS, "Gnosis", "xDAI"))
//!     .with_arbitrator("0x68154EA682f95BF582b80Dd6453FA401737491Dc")
//!     .with_phase(QuestionPhase::Open);
//!
//! assert!(question.can_request_arbitration());
//! ```

use crate::domain::value_objects::amount::wei_string;
use crate::domain::value_objects::{ChainDescriptor, NativeAmount, QuestionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle phase of an oracle question as reported by the data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum QuestionPhase {
    /// Accepting answers.
    Open,
    /// Opening time not reached yet.
    Upcoming,
    /// Arbitration has been requested and is pending.
    PendingArbitration,
    /// Answer is final.
    Finalized,
    /// Finalized before the opening time.
    SettledTooSoon,
    /// Phase string not recognized.
    #[default]
    Unknown,
}

impl QuestionPhase {
    /// Returns true if the question has reached a final answer.
    #[inline]
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized | Self::SettledTooSoon)
    }
}

impl fmt::Display for QuestionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "OPEN",
            Self::Upcoming => "UPCOMING",
            Self::PendingArbitration => "PENDING_ARBITRATION",
            Self::Finalized => "FINALIZED",
            Self::SettledTooSoon => "SETTLED_TOO_SOON",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for QuestionPhase {
    type Err = std::convert::Infallible;

    /// Parses the feed's phase string, ignoring case; unknown values map to
    /// [`QuestionPhase::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Ok(match normalized.as_str() {
            "OPEN" => Self::Open,
            "UPCOMING" => Self::Upcoming,
            "PENDING_ARBITRATION" => Self::PendingArbitration,
            "FINALIZED" => Self::Finalized,
            "SETTLED_TOO_SOON" => Self::SettledTooSoon,
            _ => Self::Unknown,
        })
    }
}

impl From<String> for QuestionPhase {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

/// An oracle question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    /// Canonical on-chain question identifier.
    pub id: QuestionId,
    /// Question title, if the feed decoded one.
    #[serde(default)]
    pub title: Option<String>,
    /// Home chain of the question.
    #[serde(default)]
    pub chain: Option<ChainDescriptor>,
    /// Arbitrator (home proxy) address.
    #[serde(default)]
    pub arbitrator: Option<String>,
    /// Current bond in base units.
    #[serde(default, with = "wei_string")]
    pub current_bond: NativeAmount,
    /// Minimum bond in base units.
    #[serde(default, rename = "minimumBond", alias = "minBond", with = "wei_string")]
    pub min_bond: NativeAmount,
    /// Lifecycle phase.
    #[serde(default)]
    pub phase: QuestionPhase,
    /// Account that requested arbitration, if any.
    #[serde(default)]
    pub arbitration_requested_by: Option<String>,
}

impl QuestionRecord {
    /// Creates a question with only its identifier set.
    #[must_use]
    pub fn new(id: QuestionId) -> Self {
        Self {
            id,
            title: None,
            chain: None,
            arbitrator: None,
            current_bond: NativeAmount::ZERO,
            min_bond: NativeAmount::ZERO,
            phase: QuestionPhase::Unknown,
            arbitration_requested_by: None,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the home chain.
    #[must_use]
    pub fn with_chain(mut self, chain: ChainDescriptor) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Sets the arbitrator address.
    #[must_use]
    pub fn with_arbitrator(mut self, arbitrator: impl Into<String>) -> Self {
        self.arbitrator = Some(arbitrator.into());
        self
    }

    /// Sets the current bond.
    #[must_use]
    pub fn with_current_bond(mut self, bond: NativeAmount) -> Self {
        self.current_bond = bond;
        self
    }

    /// Sets the minimum bond.
    #[must_use]
    pub fn with_min_bond(mut self, bond: NativeAmount) -> Self {
        self.min_bond = bond;
        self
    }

    /// Sets the phase.
    #[must_use]
    pub fn with_phase(mut self, phase: QuestionPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Records the account that requested arbitration.
    #[must_use]
    pub fn with_arbitration_requested_by(mut self, account: impl Into<String>) -> Self {
        self.arbitration_requested_by = Some(account.into());
        self
    }

    /// Returns the home chain name, if present and non-blank.
    #[must_use]
    pub fn chain_name(&self) -> Option<&str> {
        self.chain
            .as_ref()
            .map(|c| c.name.trim())
            .filter(|name| !name.is_empty())
    }

    /// Returns the arbitrator address, if present and non-blank.
    #[must_use]
    pub fn arbitrator(&self) -> Option<&str> {
        self.arbitrator
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Returns true if some account already requested arbitration.
    #[must_use]
    pub fn is_arbitration_requested(&self) -> bool {
        self.arbitration_requested_by
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty())
    }

    /// Returns true if arbitration may be requested for this question.
    ///
    /// Requires that arbitration was not requested yet, the question is not
    /// finalized, and both arbitrator and chain name are known.
    #[must_use]
    pub fn can_request_arbitration(&self) -> bool {
        !self.is_arbitration_requested()
            && !self.phase.is_finalized()
            && self.arbitrator().is_some()
            && self.chain_name().is_some()
    }
}
