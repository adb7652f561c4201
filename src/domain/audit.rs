//! Append-only audit facts, one row per completed protocol action.

use crate::domain::{
    Address, Amount, EventMeta, Ownership, SwapperChange, Timestamp, TokenAmount, TxHash,
};
use crate::store::Record;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFact {
    pub id: String,
    /// Account the fact is about.
    pub account: Address,
    pub block_number: u64,
    pub timestamp: Timestamp,
    pub transaction_hash: TxHash,
    pub log_index: u64,
    pub payload: FactPayload,
}

impl AuditFact {
    pub fn new(meta: &EventMeta, id: String, account: &Address, payload: FactPayload) -> Self {
        Self {
            id,
            account: account.clone(),
            block_number: meta.block_number,
            timestamp: meta.timestamp,
            transaction_hash: meta.transaction_hash.clone(),
            log_index: meta.log_index,
            payload,
        }
    }
}

impl Record for AuditFact {
    const TABLE: &'static str = "audit_facts";

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetAction {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlAction {
    Initiate,
    Cancel,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferType {
    Mint,
    Burn,
    Transfer,
}

impl TransferType {
    pub fn classify(from: &Address, to: &Address) -> Self {
        if from.is_zero() {
            TransferType::Mint
        } else if to.is_zero() {
            TransferType::Burn
        } else {
            TransferType::Transfer
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VestingAction {
    ModuleCreated,
    StreamCreated,
    FundsReleased,
}

/// Amount paid into one waterfall tranche by a single funding call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrancheFill {
    pub index: usize,
    pub recipient: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FactPayload {
    #[serde(rename_all = "camelCase")]
    Distribution {
        token: Address,
        amount: Amount,
        distributor: Option<Address>,
        distributor_fee: Amount,
        dust: Amount,
    },
    #[serde(rename_all = "camelCase")]
    Withdrawal { tokens: Vec<TokenAmount> },
    #[serde(rename_all = "camelCase")]
    SplitSet {
        action: SetAction,
        distributor_fee: Ownership,
        added: Vec<Address>,
        removed: Vec<Address>,
    },
    #[serde(rename_all = "camelCase")]
    ControlTransfer {
        action: ControlAction,
        from: Option<Address>,
        to: Option<Address>,
    },
    #[serde(rename_all = "camelCase")]
    WaterfallFunds {
        token: Address,
        amount: Amount,
        fills: Vec<TrancheFill>,
    },
    #[serde(rename_all = "camelCase")]
    HolderTransfer {
        transfer_type: TransferType,
        from: Address,
        to: Address,
        amount: Amount,
    },
    #[serde(rename_all = "camelCase")]
    Vesting {
        action: VestingAction,
        stream_id: Option<u64>,
        token: Option<Address>,
        amount: Option<Amount>,
    },
    #[serde(rename_all = "camelCase")]
    SwapperUpdate { change: SwapperChange },
    #[serde(rename_all = "camelCase")]
    Swap {
        input_token: Address,
        input_amount: Amount,
        output_token: Address,
        output_amount: Amount,
    },
    #[serde(rename_all = "camelCase")]
    SwapReceipt {
        swap: String,
        beneficiary: Address,
        output_token: Address,
        output_amount: Amount,
    },
    #[serde(rename_all = "camelCase")]
    PassThroughFunds {
        pass_through: Address,
        tokens: Vec<TokenAmount>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_type_classify() {
        let a = Address::new(format!("0x{:040x}", 1));
        let b = Address::new(format!("0x{:040x}", 2));
        assert_eq!(TransferType::classify(&Address::zero(), &a), TransferType::Mint);
        assert_eq!(TransferType::classify(&a, &Address::zero()), TransferType::Burn);
        assert_eq!(TransferType::classify(&a, &b), TransferType::Transfer);
    }

    #[test]
    fn test_payload_is_tagged() {
        let payload = FactPayload::Withdrawal { tokens: Vec::new() };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "withdrawal");
        let back: FactPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }
}
