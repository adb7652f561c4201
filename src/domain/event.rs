//! Decoded protocol events as delivered by the upstream decoder.
//!
//! JSON shape: `{"meta": {...}, "event": {"type": "fundsDistributed", ...}}`.

use crate::domain::{
    Address, Amount, EventOrderingKey, Ownership, PairOverride, RawLog, RecipientShare, Timestamp,
    TxHash,
};
use crate::store::joint_id;
use serde::{Deserialize, Serialize};

/// Whether the event came from a log or from a traced call.
///
/// Calls of a transaction are ordered after all of its logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Log,
    Call,
}

impl Origin {
    pub fn rank(&self) -> u8 {
        match self {
            Origin::Log => 0,
            Origin::Call => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    pub block_number: u64,
    pub timestamp: Timestamp,
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub transaction_index: u64,
    pub log_index: u64,
    #[serde(default)]
    pub origin: Origin,
}

impl EventMeta {
    pub fn ordering_key(&self) -> EventOrderingKey {
        EventOrderingKey {
            block_number: self.block_number,
            transaction_index: self.transaction_index,
            origin_rank: self.origin.rank(),
            log_index: self.log_index,
        }
    }

    /// Audit record id: `<prefix>-<txHash>-<logIndex>`.
    pub fn record_id(&self, prefix: &str) -> String {
        joint_id(&[
            prefix,
            self.transaction_hash.as_str(),
            &self.log_index.to_string(),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub meta: EventMeta,
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(meta: EventMeta, event: DomainEvent) -> Self {
        Self { meta, event }
    }

    pub fn ordering_key(&self) -> EventOrderingKey {
        self.meta.ordering_key()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    SplitCreated(SplitCreated),
    SplitUpdated(SplitUpdated),
    ControlTransferInitiated(ControlTransferInitiated),
    ControlTransferCancelled(ControlTransferCancelled),
    ControlTransferred(ControlTransferred),
    FundsDistributed(FundsDistributed),
    Withdrawal(Withdrawal),
    WaterfallCreated(WaterfallCreated),
    WaterfallFunded(WaterfallFunded),
    RecoupCreated(RecoupCreated),
    VestingModuleCreated(VestingModuleCreated),
    VestingStreamCreated(VestingStreamCreated),
    VestingFundsReleased(VestingFundsReleased),
    LiquidSplitCreated(LiquidSplitCreated),
    LiquidSplitFactoryCreated(LiquidSplitFactoryCreated),
    LiquidSplitHolderTransfer(LiquidSplitHolderTransfer),
    SwapperCreated(SwapperCreated),
    SwapperUpdated(SwapperUpdated),
    SwapperFlash(SwapperFlash),
    PassThroughWalletCreated(PassThroughWalletCreated),
    PassThroughWalletUpdated(PassThroughWalletUpdated),
    PassThroughFunds(PassThroughFunds),
    OwnerExecCalls(OwnerExecCalls),
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::SplitCreated(_) => "splitCreated",
            DomainEvent::SplitUpdated(_) => "splitUpdated",
            DomainEvent::ControlTransferInitiated(_) => "controlTransferInitiated",
            DomainEvent::ControlTransferCancelled(_) => "controlTransferCancelled",
            DomainEvent::ControlTransferred(_) => "controlTransferred",
            DomainEvent::FundsDistributed(_) => "fundsDistributed",
            DomainEvent::Withdrawal(_) => "withdrawal",
            DomainEvent::WaterfallCreated(_) => "waterfallCreated",
            DomainEvent::WaterfallFunded(_) => "waterfallFunded",
            DomainEvent::RecoupCreated(_) => "recoupCreated",
            DomainEvent::VestingModuleCreated(_) => "vestingModuleCreated",
            DomainEvent::VestingStreamCreated(_) => "vestingStreamCreated",
            DomainEvent::VestingFundsReleased(_) => "vestingFundsReleased",
            DomainEvent::LiquidSplitCreated(_) => "liquidSplitCreated",
            DomainEvent::LiquidSplitFactoryCreated(_) => "liquidSplitFactoryCreated",
            DomainEvent::LiquidSplitHolderTransfer(_) => "liquidSplitHolderTransfer",
            DomainEvent::SwapperCreated(_) => "swapperCreated",
            DomainEvent::SwapperUpdated(_) => "swapperUpdated",
            DomainEvent::SwapperFlash(_) => "swapperFlash",
            DomainEvent::PassThroughWalletCreated(_) => "passThroughWalletCreated",
            DomainEvent::PassThroughWalletUpdated(_) => "passThroughWalletUpdated",
            DomainEvent::PassThroughFunds(_) => "passThroughFunds",
            DomainEvent::OwnerExecCalls(_) => "ownerExecCalls",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    pub token: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitCreated {
    pub split: Address,
    pub recipients: Vec<RecipientShare>,
    pub distributor_fee: Ownership,
    #[serde(default)]
    pub controller: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitUpdated {
    pub split: Address,
    pub recipients: Vec<RecipientShare>,
    pub distributor_fee: Ownership,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlTransferInitiated {
    pub split: Address,
    pub new_potential_controller: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlTransferCancelled {
    pub split: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlTransferred {
    pub split: Address,
    pub new_controller: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundsDistributed {
    pub split: Address,
    pub token: Address,
    pub amount: Amount,
    /// Zero when the caller could not be identified.
    pub distributor: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub account: Address,
    #[serde(default)]
    pub native_amount: Amount,
    #[serde(default)]
    pub tokens: Vec<TokenAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallCreated {
    pub waterfall: Address,
    pub token: Address,
    /// One more recipient than thresholds; the last one is residual.
    pub recipients: Vec<Address>,
    /// Cumulative payout thresholds, strictly increasing.
    pub thresholds: Vec<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallFunded {
    pub waterfall: Address,
    pub payouts: Vec<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoupCreated {
    pub waterfall: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingModuleCreated {
    pub module: Address,
    pub beneficiary: Address,
    pub vesting_period: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingStreamCreated {
    pub module: Address,
    pub stream_id: u64,
    pub token: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingFundsReleased {
    pub module: Address,
    pub stream_id: u64,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidSplitCreated {
    pub liquid_split: Address,
    /// Read from chain when absent.
    #[serde(default)]
    pub payout_split: Option<Address>,
    #[serde(default)]
    pub distributor_fee: Option<Ownership>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidSplitFactoryCreated {
    pub liquid_split: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidSplitHolderTransfer {
    pub liquid_split: Address,
    pub from: Address,
    pub to: Address,
    /// One entry for a single transfer, several for a batch transfer.
    pub amounts: Vec<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapperCreated {
    pub swapper: Address,
    pub owner: Address,
    #[serde(default)]
    pub paused: bool,
    pub beneficiary: Address,
    pub token_to_beneficiary: Address,
    pub oracle: Address,
    pub default_scaled_offer_factor: u32,
    #[serde(default)]
    pub pair_overrides: Vec<PairOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapperChange {
    Beneficiary(Address),
    TokenToBeneficiary(Address),
    Oracle(Address),
    DefaultScaledOfferFactor(u32),
    PairOverrides(Vec<PairOverride>),
    Paused(bool),
    Owner(Address),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapperUpdated {
    pub swapper: Address,
    pub change: SwapperChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashQuote {
    pub base_token: Address,
    pub base_amount: Amount,
    pub amount_to_beneficiary: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapperFlash {
    pub swapper: Address,
    pub token_to_beneficiary: Address,
    pub quotes: Vec<FlashQuote>,
    #[serde(default)]
    pub excess_to_beneficiary: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassThroughWalletCreated {
    pub wallet: Address,
    pub owner: Address,
    #[serde(default)]
    pub paused: bool,
    pub pass_through: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletChange {
    PassThrough(Address),
    Paused(bool),
    Owner(Address),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassThroughWalletUpdated {
    pub wallet: Address,
    pub change: WalletChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassThroughFunds {
    pub wallet: Address,
    pub tokens: Vec<TokenAmount>,
}

/// A native-currency sub-call made by an owner batch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCall {
    pub to: Address,
    #[serde(default)]
    pub value: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerExecCalls {
    pub account: Address,
    #[serde(default)]
    pub calls: Vec<SubCall>,
    /// Every log of the transaction, in log-index order.
    #[serde(default)]
    pub logs: Vec<RawLog>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_envelope() {
        let json = r#"{
            "meta": {
                "blockNumber": 17000000,
                "timestamp": 1700000000,
                "transactionHash": "0xABC",
                "logIndex": 4
            },
            "event": {
                "type": "fundsDistributed",
                "split": "0x0000000000000000000000000000000000000001",
                "token": "0x0000000000000000000000000000000000000000",
                "amount": "1000",
                "distributor": "0x0000000000000000000000000000000000000002"
            }
        }"#;
        let envelope: EventEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.meta.origin, Origin::Log);
        assert_eq!(envelope.meta.transaction_index, 0);
        assert_eq!(envelope.meta.transaction_hash.as_str(), "0xabc");
        assert_eq!(envelope.event.name(), "fundsDistributed");
        match envelope.event {
            DomainEvent::FundsDistributed(ev) => assert_eq!(ev.amount, Amount::from_u64(1000)),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_swapper_change_shape() {
        let json = r#"{"swapper": "0x0000000000000000000000000000000000000001",
                       "change": {"defaultScaledOfferFactor": 990000}}"#;
        let ev: SwapperUpdated = serde_json::from_str(json).unwrap();
        assert_eq!(ev.change, SwapperChange::DefaultScaledOfferFactor(990_000));
    }

    #[test]
    fn test_record_id() {
        let meta = EventMeta {
            block_number: 1,
            timestamp: Timestamp::new(0),
            transaction_hash: TxHash::new("0xabc"),
            transaction_index: 0,
            log_index: 7,
            origin: Origin::Log,
        };
        assert_eq!(meta.record_id("de"), "de-0xabc-7");
    }

    #[test]
    fn test_call_orders_after_logs_of_same_tx() {
        let meta = |origin, log_index| EventMeta {
            block_number: 10,
            timestamp: Timestamp::new(0),
            transaction_hash: TxHash::new("0xabc"),
            transaction_index: 2,
            log_index,
            origin,
        };
        assert!(meta(Origin::Call, 0).ordering_key() > meta(Origin::Log, 99).ordering_key());
    }
}
