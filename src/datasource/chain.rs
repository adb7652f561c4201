//! Point-in-time chain reads.
//!
//! Reads are synchronous and never retried; callers fall back to defaults on
//! failure.

use crate::domain::{Address, Ownership};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainReadError {
    #[error("chain reads are unavailable")]
    Unavailable,
    #[error("call to {contract} reverted: {reason}")]
    Reverted { contract: Address, reason: String },
}

/// Configuration read from a liquid split contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidSplitConfig {
    pub payout_split: Address,
    pub distributor_fee: Ownership,
}

pub trait ChainReader: Send + Sync {
    /// `scaledPercentBalanceOf(account)` on a liquid split contract.
    fn scaled_percent_balance_of(
        &self,
        liquid_split: &Address,
        account: &Address,
    ) -> Result<Ownership, ChainReadError>;

    /// `payoutSplit()` and `distributorFee()` on a liquid split contract.
    fn liquid_split_config(&self, liquid_split: &Address)
        -> Result<LiquidSplitConfig, ChainReadError>;
}

/// Reader for offline replay: every call fails so callers use their defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableChainReader;

impl ChainReader for UnavailableChainReader {
    fn scaled_percent_balance_of(
        &self,
        _liquid_split: &Address,
        _account: &Address,
    ) -> Result<Ownership, ChainReadError> {
        Err(ChainReadError::Unavailable)
    }

    fn liquid_split_config(
        &self,
        _liquid_split: &Address,
    ) -> Result<LiquidSplitConfig, ChainReadError> {
        Err(ChainReadError::Unavailable)
    }
}

/// Reader backed by fixed answers.
///
/// Balances not set explicitly read as zero for liquid splits that have at
/// least one balance configured, and revert otherwise.
#[derive(Debug, Clone, Default)]
pub struct StaticChainReader {
    balances: HashMap<(Address, Address), Ownership>,
    configs: HashMap<Address, LiquidSplitConfig>,
}

impl StaticChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, liquid_split: &Address, account: &Address, ppm: u32) -> Self {
        self.balances
            .insert((liquid_split.clone(), account.clone()), Ownership::new(ppm));
        self
    }

    pub fn with_config(
        mut self,
        liquid_split: &Address,
        payout_split: &Address,
        distributor_fee: u32,
    ) -> Self {
        self.configs.insert(
            liquid_split.clone(),
            LiquidSplitConfig {
                payout_split: payout_split.clone(),
                distributor_fee: Ownership::new(distributor_fee),
            },
        );
        self
    }

    /// Replace one balance, e.g. between events in a test.
    pub fn set_balance(&mut self, liquid_split: &Address, account: &Address, ppm: u32) {
        self.balances
            .insert((liquid_split.clone(), account.clone()), Ownership::new(ppm));
    }
}

impl ChainReader for StaticChainReader {
    fn scaled_percent_balance_of(
        &self,
        liquid_split: &Address,
        account: &Address,
    ) -> Result<Ownership, ChainReadError> {
        if let Some(ownership) = self.balances.get(&(liquid_split.clone(), account.clone())) {
            return Ok(*ownership);
        }
        if self.balances.keys().any(|(ls, _)| ls == liquid_split) {
            Ok(Ownership::ZERO)
        } else {
            Err(ChainReadError::Reverted {
                contract: liquid_split.clone(),
                reason: "no balances configured".to_string(),
            })
        }
    }

    fn liquid_split_config(
        &self,
        liquid_split: &Address,
    ) -> Result<LiquidSplitConfig, ChainReadError> {
        self.configs
            .get(liquid_split)
            .cloned()
            .ok_or_else(|| ChainReadError::Reverted {
                contract: liquid_split.clone(),
                reason: "no config configured".to_string(),
            })
    }
}
