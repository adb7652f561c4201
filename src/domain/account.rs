//! Account entities.
//!
//! Every identifier has exactly one [`Account`] row naming its kind; the
//! kind-specific state lives in a separate table under the same id.

use crate::domain::{Address, Amount, Ownership, Timestamp};
use crate::store::{joint_id, Record};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountKind {
    Holder,
    Split,
    LiquidSplit,
    WaterfallModule,
    VestingModule,
    Swapper,
    PassThroughWallet,
}

impl AccountKind {
    /// Everything except a plain external wallet.
    pub fn is_structured(&self) -> bool {
        !matches!(self, AccountKind::Holder)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Holder => "holder",
            AccountKind::Split => "split",
            AccountKind::LiquidSplit => "liquidSplit",
            AccountKind::WaterfallModule => "waterfallModule",
            AccountKind::VestingModule => "vestingModule",
            AccountKind::Swapper => "swapper",
            AccountKind::PassThroughWallet => "passThroughWallet",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Product a module was deployed as part of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParentEntityType {
    Recoup,
    Diversifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Address,
    pub kind: AccountKind,
    pub created_block: u64,
    pub latest_block: u64,
    pub latest_activity: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_entity_type: Option<ParentEntityType>,
}

impl Record for Account {
    const TABLE: &'static str = "accounts";

    fn id(&self) -> String {
        self.id.to_string()
    }
}

/// `(account, share)` pair as carried by split events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientShare {
    pub account: Address,
    pub ownership: Ownership,
}

impl RecipientShare {
    pub fn new(account: Address, ownership: u32) -> Self {
        Self {
            account,
            ownership: Ownership::new(ownership),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    pub id: Address,
    pub controller: Option<Address>,
    pub pending_controller: Option<Address>,
    pub distributor_fee: Ownership,
    /// Recipient accounts in distribution order; shares live in [`Recipient`] rows.
    pub recipients: Vec<Address>,
}

impl Record for Split {
    const TABLE: &'static str = "splits";

    fn id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub split: Address,
    pub account: Address,
    pub ownership: Ownership,
}

impl Recipient {
    pub fn key(split: &Address, account: &Address) -> String {
        joint_id(&[split.as_str(), account.as_str()])
    }
}

impl Record for Recipient {
    const TABLE: &'static str = "recipients";

    fn id(&self) -> String {
        Recipient::key(&self.split, &self.account)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OwnershipModel {
    /// Ownership derived from a fixed token supply minted by the factory.
    FactoryLinear,
    /// Ownership read from the contract after every transfer.
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidSplit {
    pub id: Address,
    pub payout_split: Option<Address>,
    pub distributor_fee: Ownership,
    pub ownership_model: OwnershipModel,
}

impl Record for LiquidSplit {
    const TABLE: &'static str = "liquid_splits";

    fn id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidSplitHolder {
    pub liquid_split: Address,
    pub account: Address,
    pub ownership: Ownership,
}

impl LiquidSplitHolder {
    pub fn key(liquid_split: &Address, account: &Address) -> String {
        joint_id(&[liquid_split.as_str(), account.as_str()])
    }

    /// Prefix shared by every holder row of one liquid split.
    pub fn prefix(liquid_split: &Address) -> String {
        format!("{}-", liquid_split)
    }
}

impl Record for LiquidSplitHolder {
    const TABLE: &'static str = "liquid_split_holders";

    fn id(&self) -> String {
        LiquidSplitHolder::key(&self.liquid_split, &self.account)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallModule {
    pub id: Address,
    pub token: Address,
    pub tranche_count: usize,
    pub total_claimed: Amount,
}

impl Record for WaterfallModule {
    const TABLE: &'static str = "waterfall_modules";

    fn id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallTranche {
    pub waterfall: Address,
    pub index: usize,
    pub start_amount: Amount,
    /// `None` for the residual tranche.
    pub size: Option<Amount>,
    pub claimed_amount: Amount,
    pub recipient: Address,
}

impl WaterfallTranche {
    pub fn key(waterfall: &Address, index: usize) -> String {
        joint_id(&[waterfall.as_str(), &index.to_string()])
    }

    pub fn is_residual(&self) -> bool {
        self.size.is_none()
    }
}

impl Record for WaterfallTranche {
    const TABLE: &'static str = "waterfall_tranches";

    fn id(&self) -> String {
        WaterfallTranche::key(&self.waterfall, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingModule {
    pub id: Address,
    pub beneficiary: Address,
    pub vesting_period: u64,
}

impl Record for VestingModule {
    const TABLE: &'static str = "vesting_modules";

    fn id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingStream {
    pub module: Address,
    pub stream_id: u64,
    pub token: Address,
    pub total_amount: Amount,
    pub claimed_amount: Amount,
    pub start_time: Timestamp,
}

impl VestingStream {
    pub fn key(module: &Address, stream_id: u64) -> String {
        joint_id(&[module.as_str(), &stream_id.to_string()])
    }
}

impl Record for VestingStream {
    const TABLE: &'static str = "vesting_streams";

    fn id(&self) -> String {
        VestingStream::key(&self.module, self.stream_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairOverride {
    pub base: Address,
    pub quote: Address,
    pub scaled_offer_factor: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swapper {
    pub id: Address,
    pub owner: Address,
    pub paused: bool,
    pub beneficiary: Address,
    pub token_to_beneficiary: Address,
    pub oracle: Address,
    pub default_scaled_offer_factor: u32,
    #[serde(default)]
    pub pair_overrides: Vec<PairOverride>,
}

impl Swapper {
    /// Insert or replace the override for `(base, quote)`.
    pub fn set_pair_override(&mut self, pair: PairOverride) {
        match self
            .pair_overrides
            .iter_mut()
            .find(|p| p.base == pair.base && p.quote == pair.quote)
        {
            Some(existing) => existing.scaled_offer_factor = pair.scaled_offer_factor,
            None => self.pair_overrides.push(pair),
        }
    }
}

impl Record for Swapper {
    const TABLE: &'static str = "swappers";

    fn id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassThroughWallet {
    pub id: Address,
    pub owner: Address,
    pub paused: bool,
    pub pass_through: Address,
}

impl Record for PassThroughWallet {
    const TABLE: &'static str = "pass_through_wallets";

    fn id(&self) -> String {
        self.id.to_string()
    }
}

/// Running total of one token released by a pass-through wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRelease {
    pub wallet: Address,
    pub token: Address,
    pub amount: Amount,
}

impl TokenRelease {
    pub fn key(wallet: &Address, token: &Address) -> String {
        joint_id(&[wallet.as_str(), token.as_str()])
    }
}

impl Record for TokenRelease {
    const TABLE: &'static str = "token_releases";

    fn id(&self) -> String {
        TokenRelease::key(&self.wallet, &self.token)
    }
}
