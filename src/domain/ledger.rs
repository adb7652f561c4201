//! Ledger rows.

use crate::domain::{Address, Amount};
use crate::store::{joint_id, Record};
use serde::{Deserialize, Serialize};

/// Running totals for one `(account, token)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub account: Address,
    pub token: Address,
    /// Ever distributed to the account.
    pub distributed: Amount,
    /// Ever withdrawn by the account.
    pub withdrawn: Amount,
}

impl LedgerEntry {
    pub fn new(account: Address, token: Address) -> Self {
        Self {
            account,
            token,
            distributed: Amount::ZERO,
            withdrawn: Amount::ZERO,
        }
    }

    pub fn key(account: &Address, token: &Address) -> String {
        joint_id(&[account.as_str(), token.as_str()])
    }

    /// `distributed - withdrawn`, or `None` if more was withdrawn than was
    /// ever distributed through the indexed history.
    pub fn active(&self) -> Option<Amount> {
        self.distributed.checked_sub(self.withdrawn)
    }
}

impl Record for LedgerEntry {
    const TABLE: &'static str = "ledger";

    fn id(&self) -> String {
        LedgerEntry::key(&self.account, &self.token)
    }
}

/// Cumulative swap volume for one `(account, input token, output token)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapBalance {
    pub account: Address,
    pub input_token: Address,
    pub output_token: Address,
    pub input_amount: Amount,
    pub output_amount: Amount,
}

impl SwapBalance {
    pub fn key(account: &Address, input_token: &Address, output_token: &Address) -> String {
        joint_id(&[account.as_str(), input_token.as_str(), output_token.as_str()])
    }
}

impl Record for SwapBalance {
    const TABLE: &'static str = "swap_balances";

    fn id(&self) -> String {
        SwapBalance::key(&self.account, &self.input_token, &self.output_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_balance() {
        let mut entry = LedgerEntry::new(Address::one(), Address::zero());
        entry.distributed = Amount::from_u64(10);
        entry.withdrawn = Amount::from_u64(4);
        assert_eq!(entry.active(), Some(Amount::from_u64(6)));

        entry.withdrawn = Amount::from_u64(11);
        assert_eq!(entry.active(), None);
    }
}
