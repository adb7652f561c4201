//! Domain primitives: Address, TxHash, Timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
const ONE_ADDRESS: &str = "0x0000000000000000000000000000000000000001";

/// Block timestamp in seconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn new(secs: i64) -> Self {
        Timestamp(secs)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Convert to a UTC datetime, if the value is in chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address must have 40 hex digits: {0}")]
    InvalidLength(String),
    #[error("address contains non-hex characters: {0}")]
    InvalidHex(String),
}

/// Account or contract address, stored as lowercase `0x`-prefixed hex.
///
/// The zero address doubles as the native-currency token and the mint/burn
/// counterparty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create an Address without validation. Input is lowercased.
    pub fn new(addr: impl Into<String>) -> Self {
        Address(addr.into().to_ascii_lowercase())
    }

    /// Parse and validate a `0x`-prefixed 20-byte hex address.
    pub fn parse(addr: &str) -> Result<Self, AddressParseError> {
        let digits = addr
            .strip_prefix("0x")
            .or_else(|| addr.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError::MissingPrefix(addr.to_string()))?;
        if digits.len() != 40 {
            return Err(AddressParseError::InvalidLength(addr.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError::InvalidHex(addr.to_string()));
        }
        Ok(Address::new(addr))
    }

    /// Extract the address packed into the low 20 bytes of a 32-byte log topic.
    pub fn from_topic(topic: &str) -> Option<Self> {
        let digits = topic.strip_prefix("0x").unwrap_or(topic);
        if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Address::new(format!("0x{}", &digits[24..])))
    }

    /// The zero address: native currency, mint and burn sentinel.
    pub fn zero() -> Self {
        Address(ZERO_ADDRESS.to_string())
    }

    /// Address `0x…01`, used by liquid splits as a placeholder payout recipient.
    pub fn one() -> Self {
        Address(ONE_ADDRESS.to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_ADDRESS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction hash (lowercase hex string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        TxHash(hash.into().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TxHash {
    fn from(value: String) -> Self {
        TxHash::new(value)
    }
}

impl From<TxHash> for String {
    fn from(hash: TxHash) -> Self {
        hash.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_lowercases() {
        let addr = Address::parse("0xFE7800f67b3e42ddb004057169603FEAdEeD31B0").unwrap();
        assert_eq!(addr.as_str(), "0xfe7800f67b3e42ddb004057169603feadeed31b0");
    }

    #[test]
    fn test_address_parse_errors() {
        assert!(matches!(
            Address::parse("fe7800f67b3e42ddb004057169603feadeed31b0"),
            Err(AddressParseError::MissingPrefix(_))
        ));
        assert!(matches!(
            Address::parse("0x1234"),
            Err(AddressParseError::InvalidLength(_))
        ));
        assert!(matches!(
            Address::parse("0xzz7800f67b3e42ddb004057169603feadeed31b0"),
            Err(AddressParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_address_from_topic() {
        let topic = "0x000000000000000000000000fe7800f67b3e42ddb004057169603feadeed31b0";
        let addr = Address::from_topic(topic).unwrap();
        assert_eq!(addr.as_str(), "0xfe7800f67b3e42ddb004057169603feadeed31b0");
        assert!(Address::from_topic("0x1234").is_none());
    }

    #[test]
    fn test_sentinels() {
        assert!(Address::zero().is_zero());
        assert!(!Address::one().is_zero());
        assert_eq!(Address::parse(ZERO_ADDRESS).unwrap(), Address::zero());
    }

    #[test]
    fn test_address_serde_validates() {
        let ok: Address =
            serde_json::from_str("\"0x0000000000000000000000000000000000000001\"").unwrap();
        assert_eq!(ok, Address::one());
        assert!(serde_json::from_str::<Address>("\"0x12\"").is_err());
    }

    #[test]
    fn test_timestamp_datetime() {
        let ts = Timestamp::new(1_700_000_000);
        assert_eq!(ts.to_datetime().unwrap().timestamp(), 1_700_000_000);
    }
}
