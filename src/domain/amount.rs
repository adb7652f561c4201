//! Token amounts in the token's smallest unit, backed by a 256-bit integer.
//!
//! Serializes to a decimal JSON string so values above 2^53 survive any
//! JSON consumer. Deserialization also accepts plain JSON integers.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount: {0}")]
pub struct AmountParseError(pub String);

/// Non-negative token amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256::ZERO);

    pub fn new(value: U256) -> Self {
        Amount(value)
    }

    pub fn from_u64(value: u64) -> Self {
        Amount(U256::from(value))
    }

    /// Parse a base-10 string.
    pub fn parse(s: &str) -> Result<Self, AmountParseError> {
        U256::from_str_radix(s.trim(), 10)
            .map(Amount)
            .map_err(|_| AmountParseError(s.to_string()))
    }

    /// Decode a big-endian 32-byte word from hex log data (`0x` optional).
    ///
    /// Only the first word is read; trailing words are ignored.
    pub fn from_hex_word(data: &str) -> Option<Self> {
        let digits = data.strip_prefix("0x").unwrap_or(data);
        if digits.len() < 64 {
            return None;
        }
        let bytes = hex::decode(&digits[..64]).ok()?;
        U256::try_from_be_slice(&bytes).map(Amount)
    }

    pub fn inner(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Narrow to `u64`, or `None` if the value does not fit.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0 > U256::from(u64::MAX) {
            return None;
        }
        Some(self.0.as_limbs()[0])
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }

    pub fn min(self, rhs: Amount) -> Amount {
        if self <= rhs {
            self
        } else {
            rhs
        }
    }

    /// `floor(self * mul / div)` without intermediate overflow.
    ///
    /// Returns `None` if `div` is zero or the result does not fit.
    pub fn mul_div_floor(self, mul: u64, div: u64) -> Option<Amount> {
        if div == 0 {
            return None;
        }
        let mul = U256::from(mul);
        let div = U256::from(div);
        let quotient = self.0 / div;
        let remainder = self.0 % div;
        let high = quotient.checked_mul(mul)?;
        let low = remainder.checked_mul(mul)? / div;
        high.checked_add(low).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::from_u64(value)
    }
}

impl std::iter::Sum for Amount {
    /// Saturates at `U256::MAX`.
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        Amount(iter.fold(U256::ZERO, |acc, a| acc.saturating_add(a.0)))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Text(String),
    Number(u64),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match AmountRepr::deserialize(deserializer)? {
            AmountRepr::Text(s) => Amount::parse(&s).map_err(serde::de::Error::custom),
            AmountRepr::Number(n) => Ok(Amount::from_u64(n)),
        }
    }
}
