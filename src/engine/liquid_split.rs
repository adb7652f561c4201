//! Liquid-split holder ownership, in two models.
//!
//! - factory linear: ownership moves by `amount * SCALE / FIXED_SUPPLY` per
//!   transferred unit, truncated per amount
//! - external: ownership is re-read from the contract for every affected holder
//!
//! A holder whose ownership reaches zero has its row deleted.

use crate::datasource::ChainReader;
use crate::domain::{
    Address, Amount, LiquidSplitHolder, Ownership, FIXED_SUPPLY, PERCENTAGE_SCALE,
};
use crate::error::IndexerError;
use crate::store::{EntityStore, StoreError, StoreExt};
use tracing::warn;

/// Ownership carried by a set of transferred token amounts under the
/// factory-linear model.
pub fn factory_ownership_delta(amounts: &[Amount]) -> Result<Ownership, IndexerError> {
    let mut total: u32 = 0;
    for amount in amounts {
        let scaled = amount
            .mul_div_floor(PERCENTAGE_SCALE as u64, FIXED_SUPPLY as u64)
            .and_then(|a| a.to_u64())
            .and_then(|a| u32::try_from(a).ok())
            .ok_or_else(|| {
                IndexerError::InvalidEvent(format!("liquid split transfer of {} units", amount))
            })?;
        total = total.checked_add(scaled).ok_or_else(|| {
            IndexerError::InvalidEvent("liquid split batch transfer overflows".to_string())
        })?;
    }
    Ok(Ownership::new(total))
}

pub struct OwnershipTracker;

impl OwnershipTracker {
    pub fn ownership<S: EntityStore + ?Sized>(
        store: &S,
        liquid_split: &Address,
        account: &Address,
    ) -> Result<Ownership, StoreError> {
        Ok(store
            .load::<LiquidSplitHolder>(&LiquidSplitHolder::key(liquid_split, account))?
            .map(|h| h.ownership)
            .unwrap_or(Ownership::ZERO))
    }

    pub fn holders<S: EntityStore + ?Sized>(
        store: &S,
        liquid_split: &Address,
    ) -> Result<Vec<LiquidSplitHolder>, StoreError> {
        store.load_prefixed::<LiquidSplitHolder>(&LiquidSplitHolder::prefix(liquid_split))
    }

    /// Sum of all holder ownership, in ppm.
    pub fn total_ownership<S: EntityStore + ?Sized>(
        store: &S,
        liquid_split: &Address,
    ) -> Result<u64, StoreError> {
        Ok(Self::holders(store, liquid_split)?
            .iter()
            .map(|h| h.ownership.ppm() as u64)
            .sum())
    }

    /// Apply a factory-linear transfer. Returns the ownership moved.
    pub fn apply_factory_transfer<S: EntityStore + ?Sized>(
        store: &mut S,
        liquid_split: &Address,
        from: &Address,
        to: &Address,
        amounts: &[Amount],
    ) -> Result<Ownership, IndexerError> {
        let delta = factory_ownership_delta(amounts)?;
        if delta.is_zero() {
            return Ok(delta);
        }

        if !from.is_zero() {
            let current = Self::ownership(store, liquid_split, from)?;
            let next = current.checked_sub(delta).ok_or_else(|| {
                IndexerError::Inconsistent(format!(
                    "holder {} of {} has {} ppm, cannot send {}",
                    from,
                    liquid_split,
                    current.ppm(),
                    delta.ppm()
                ))
            })?;
            Self::set_ownership(store, liquid_split, from, next)?;
        }
        if !to.is_zero() {
            let current = Self::ownership(store, liquid_split, to)?;
            let next = current.checked_add(delta).ok_or_else(|| {
                IndexerError::Inconsistent(format!("holder {} ownership overflow", to))
            })?;
            Self::set_ownership(store, liquid_split, to, next)?;
        }
        Ok(delta)
    }

    /// Re-read ownership for every holder a transfer may have changed.
    ///
    /// Mints and burns change every holder's share of supply, so all known
    /// holders are refreshed along with the counterparties. Failed reads
    /// fall back to zero ownership. Returns the accounts refreshed.
    pub fn apply_external_transfer<S: EntityStore + ?Sized>(
        store: &mut S,
        reader: &dyn ChainReader,
        liquid_split: &Address,
        from: &Address,
        to: &Address,
    ) -> Result<Vec<Address>, IndexerError> {
        let mut affected: Vec<Address> = Vec::new();
        for account in [from, to] {
            if !account.is_zero() && !affected.contains(account) {
                affected.push(account.clone());
            }
        }
        if from.is_zero() || to.is_zero() {
            for holder in Self::holders(store, liquid_split)? {
                if !affected.contains(&holder.account) {
                    affected.push(holder.account);
                }
            }
        }

        for account in &affected {
            let ownership = match reader.scaled_percent_balance_of(liquid_split, account) {
                Ok(ownership) => ownership,
                Err(e) => {
                    warn!(
                        "scaledPercentBalanceOf({}) on {} failed, using zero: {}",
                        account, liquid_split, e
                    );
                    Ownership::ZERO
                }
            };
            Self::set_ownership(store, liquid_split, account, ownership)?;
        }
        Ok(affected)
    }

    fn set_ownership<S: EntityStore + ?Sized>(
        store: &mut S,
        liquid_split: &Address,
        account: &Address,
        ownership: Ownership,
    ) -> Result<(), StoreError> {
        if ownership.is_zero() {
            return store.remove::<LiquidSplitHolder>(&LiquidSplitHolder::key(liquid_split, account));
        }
        store.save(&LiquidSplitHolder {
            liquid_split: liquid_split.clone(),
            account: account.clone(),
            ownership,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{StaticChainReader, UnavailableChainReader};
    use crate::store::MemoryStore;

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n))
    }

    fn units(n: u64) -> Vec<Amount> {
        vec![Amount::from_u64(n)]
    }

    #[test]
    fn test_factory_delta_per_amount_truncation() {
        assert_eq!(factory_ownership_delta(&units(1)).unwrap(), Ownership::new(1_000));
        let batch = vec![Amount::from_u64(2), Amount::from_u64(3)];
        assert_eq!(factory_ownership_delta(&batch).unwrap(), Ownership::new(5_000));
        assert!(factory_ownership_delta(&units(u64::MAX)).is_err());
    }

    #[test]
    fn test_factory_burn_to_zero_deletes_row() {
        let mut store = MemoryStore::new();
        let ls = addr(9);
        OwnershipTracker::apply_factory_transfer(&mut store, &ls, &Address::zero(), &addr(1), &units(10))
            .unwrap();
        assert_eq!(OwnershipTracker::holders(&store, &ls).unwrap().len(), 1);

        OwnershipTracker::apply_factory_transfer(&mut store, &ls, &addr(1), &Address::zero(), &units(10))
            .unwrap();
        assert!(OwnershipTracker::holders(&store, &ls).unwrap().is_empty());
    }

    #[test]
    fn test_factory_underflow_is_inconsistent() {
        let mut store = MemoryStore::new();
        let err = OwnershipTracker::apply_factory_transfer(
            &mut store,
            &addr(9),
            &addr(1),
            &addr(2),
            &units(1),
        )
        .unwrap_err();
        assert!(matches!(err, IndexerError::Inconsistent(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_external_transfer_reads_counterparties() {
        let mut store = MemoryStore::new();
        let ls = addr(9);
        let reader = StaticChainReader::new()
            .with_balance(&ls, &addr(1), 700_000)
            .with_balance(&ls, &addr(2), 300_000);

        let refreshed =
            OwnershipTracker::apply_external_transfer(&mut store, &reader, &ls, &addr(1), &addr(2))
                .unwrap();
        assert_eq!(refreshed, vec![addr(1), addr(2)]);
        assert_eq!(
            OwnershipTracker::ownership(&store, &ls, &addr(1)).unwrap(),
            Ownership::new(700_000)
        );
        assert_eq!(OwnershipTracker::total_ownership(&store, &ls).unwrap(), 1_000_000);
    }

    #[test]
    fn test_external_read_failure_falls_back_to_zero() {
        let mut store = MemoryStore::new();
        let ls = addr(9);
        OwnershipTracker::apply_factory_transfer(&mut store, &ls, &Address::zero(), &addr(1), &units(5))
            .unwrap();

        OwnershipTracker::apply_external_transfer(
            &mut store,
            &UnavailableChainReader,
            &ls,
            &addr(1),
            &addr(2),
        )
        .unwrap();
        assert!(OwnershipTracker::holders(&store, &ls).unwrap().is_empty());
    }
}
