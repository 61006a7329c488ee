//! # Native Amount Value Object
//!
//! Native-currency amounts in integer base units.
//!
//! Every monetary value that enters a contract call (bounty, dispute fee,
//! max previous bond) is held as an integer number of base units (wei)
//! using an 18-decimal fixed-point convention. Human input such as `"0.01"`
//! is split into whole and fractional digits and combined in `U256`, so
//! excess precision is rejected instead of silently rounded.
//!
//! # Examples
//!
//! ```
//! use oracle_arbitration::domain::value_objects::amount::NativeAmount;
//!
//! let bounty = NativeAmount::parse("0.01").unwrap();
//! assert_eq!(bounty.wei().to_string(), "10000000000000000");
//! assert_eq!(bounty.to_string(), "0.01");
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use ethers::types::U256;
use ethers::utils::format_ether;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits in the native-currency convention.
pub const NATIVE_DECIMALS: u32 = 18;

/// A non-negative amount of native currency in base units.
///
/// # Invariants
///
/// - Always >= 0 (base units are unsigned)
/// - Parsed inputs carry at most 18 fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NativeAmount(U256);

impl NativeAmount {
    /// Zero amount.
    pub const ZERO: Self = Self(U256::zero());

    /// Creates an amount from base units.
    #[inline]
    #[must_use]
    pub const fn from_wei(wei: U256) -> Self {
        Self(wei)
    }

    /// Parses a human decimal string (e.g. `"0.01"`) into base units.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` if the string is empty, not a
    /// decimal number, negative, or has more than 18 fractional digits, and
    /// `DomainError::Overflow` if the value does not fit.
    pub fn parse(value: &str) -> DomainResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidAmount("amount is empty".to_string()));
        }
        let invalid = |reason: &str| DomainError::InvalidAmount(format!("'{trimmed}': {reason}"));

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty()) || !is_digits(int_part) || !is_digits(frac_part) {
            return Err(invalid("not a decimal number"));
        }

        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.len() > NATIVE_DECIMALS as usize {
            return Err(invalid(&format!(
                "at most {NATIVE_DECIMALS} decimal places are allowed"
            )));
        }

        let whole = if int_part.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(int_part).map_err(|_| DomainError::Overflow)?
        };
        let fraction = if frac_part.is_empty() {
            U256::zero()
        } else {
            let scale = NATIVE_DECIMALS as usize - frac_part.len();
            U256::from_dec_str(frac_part).map_err(|_| DomainError::Overflow)? * U256::exp10(scale)
        };
        let wei = whole
            .checked_mul(U256::exp10(NATIVE_DECIMALS as usize))
            .and_then(|w| w.checked_add(fraction))
            .ok_or(DomainError::Overflow)?;

        if negative && !wei.is_zero() {
            return Err(invalid("amount cannot be negative"));
        }
        Ok(Self(wei))
    }

    /// Parses an optional amount, treating `None` or blank input as zero.
    ///
    /// # Errors
    ///
    /// Same as [`NativeAmount::parse`] for non-blank input.
    pub fn parse_or_zero(value: Option<&str>) -> DomainResult<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::ZERO),
            Some(v) => Self::parse(v),
        }
    }

    /// Returns the amount in base units.
    #[inline]
    #[must_use]
    pub const fn wei(self) -> U256 {
        self.0
    }

    /// Returns true if the amount is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Multiplies a gas amount by a gas price.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Overflow` if the product does not fit.
    pub fn from_gas(gas_units: U256, gas_price: U256) -> DomainResult<Self> {
        gas_units
            .checked_mul(gas_price)
            .map(Self)
            .ok_or(DomainError::Overflow)
    }

    /// Renders the shortest decimal string in whole currency units.
    #[must_use]
    pub fn to_decimal_string(self) -> String {
        let formatted = format_ether(self.0);
        match formatted.split_once('.') {
            Some((int, frac)) => {
                let frac = frac.trim_end_matches('0');
                if frac.is_empty() {
                    int.to_string()
                } else {
                    format!("{int}.{frac}")
                }
            }
            None => formatted,
        }
    }
}

impl fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl FromStr for NativeAmount {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NativeAmount {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NativeAmount> for String {
    fn from(amount: NativeAmount) -> Self {
        amount.to_decimal_string()
    }
}

impl From<U256> for NativeAmount {
    #[inline]
    fn from(wei: U256) -> Self {
        Self(wei)
    }
}

/// Serde adapter for amounts published as integer wei strings.
///
/// Feeds report bonds in base units (`"10000000000000000"`), not in whole
/// currency. Use with `#[serde(with = "wei_string")]`.
pub mod wei_string {
    use super::NativeAmount;
    use ethers::types::U256;
    use serde::{Deserialize, Deserializer, Serializer, de};

    /// Serializes the amount as a decimal wei string.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(amount: &NativeAmount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.wei().to_string())
    }

    /// Deserializes a decimal wei string; null or blank input is zero.
    ///
    /// # Errors
    ///
    /// Fails on non-digit input or values above `U256::MAX`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NativeAmount, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(NativeAmount::ZERO);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(de::Error::custom(format!("invalid wei amount '{trimmed}'")));
        }
        U256::from_dec_str(trimmed)
            .map(NativeAmount::from_wei)
            .map_err(|e| de::Error::custom(format!("invalid wei amount '{trimmed}': {e}")))
    }
}
