//! Raw transaction logs and the few event shapes the swap tracer reads.

use crate::domain::{Address, Amount};
use serde::{Deserialize, Serialize};

/// `Transfer(address,address,uint256)`
pub const TRANSFER_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
/// Wrapped-native `Deposit(address,uint256)`
pub const DEPOSIT_TOPIC: &str =
    "0xe1fffcc4923d04b559f4d29a8bfc6cda04eb5b0d3c460751c2402c5c5cc9109c";
/// Wrapped-native `Withdrawal(address,uint256)`
pub const WITHDRAWAL_TOPIC: &str =
    "0x7fcf532c15f0a6db0bd6d0e038bea71d30d808c7d98cb3bf7268a95bf5081b65";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

/// A log classified for swap tracing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TracedLog {
    Transfer {
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    },
    /// Native currency wrapped by `depositor`.
    Wrap {
        token: Address,
        depositor: Address,
        amount: Amount,
    },
    /// Wrapped token unwrapped by `withdrawer`.
    Unwrap {
        token: Address,
        withdrawer: Address,
        amount: Amount,
    },
    Unrecognized,
}

impl RawLog {
    pub fn decode(&self) -> TracedLog {
        let Some(topic0) = self.topics.first() else {
            return TracedLog::Unrecognized;
        };
        let topic0 = topic0.to_ascii_lowercase();
        let amount = Amount::from_hex_word(&self.data);
        let topic_address = |i: usize| self.topics.get(i).and_then(|t| Address::from_topic(t));

        match topic0.as_str() {
            // ERC-721 transfers carry a fourth topic and no data; skip them.
            TRANSFER_TOPIC if self.topics.len() == 3 => {
                match (topic_address(1), topic_address(2), amount) {
                    (Some(from), Some(to), Some(amount)) => TracedLog::Transfer {
                        token: self.address.clone(),
                        from,
                        to,
                        amount,
                    },
                    _ => TracedLog::Unrecognized,
                }
            }
            DEPOSIT_TOPIC => match (topic_address(1), amount) {
                (Some(depositor), Some(amount)) => TracedLog::Wrap {
                    token: self.address.clone(),
                    depositor,
                    amount,
                },
                _ => TracedLog::Unrecognized,
            },
            WITHDRAWAL_TOPIC => match (topic_address(1), amount) {
                (Some(withdrawer), Some(amount)) => TracedLog::Unwrap {
                    token: self.address.clone(),
                    withdrawer,
                    amount,
                },
                _ => TracedLog::Unrecognized,
            },
            _ => TracedLog::Unrecognized,
        }
    }

    /// Build a `Transfer` log.
    pub fn transfer(token: &Address, from: &Address, to: &Address, amount: Amount) -> Self {
        RawLog {
            address: token.clone(),
            topics: vec![
                TRANSFER_TOPIC.to_string(),
                address_topic(from),
                address_topic(to),
            ],
            data: amount_word(amount),
        }
    }

    /// Build a wrapped-native `Deposit` log.
    pub fn deposit(token: &Address, depositor: &Address, amount: Amount) -> Self {
        RawLog {
            address: token.clone(),
            topics: vec![DEPOSIT_TOPIC.to_string(), address_topic(depositor)],
            data: amount_word(amount),
        }
    }

    /// Build a wrapped-native `Withdrawal` log.
    pub fn withdrawal(token: &Address, withdrawer: &Address, amount: Amount) -> Self {
        RawLog {
            address: token.clone(),
            topics: vec![WITHDRAWAL_TOPIC.to_string(), address_topic(withdrawer)],
            data: amount_word(amount),
        }
    }
}

fn address_topic(addr: &Address) -> String {
    let digits = addr.as_str().trim_start_matches("0x");
    format!("0x{:0>64}", digits)
}

fn amount_word(amount: Amount) -> String {
    format!("0x{}", hex::encode(amount.inner().to_be_bytes::<32>()))
}
