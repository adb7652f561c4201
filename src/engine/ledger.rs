//! Per-(account, token) distributed and withdrawn accumulators.

use crate::domain::{Address, Amount, LedgerEntry};
use crate::error::IndexerError;
use crate::store::{EntityStore, StoreError, StoreExt};

pub struct Ledger;

impl Ledger {
    pub fn entry<S: EntityStore + ?Sized>(
        store: &S,
        account: &Address,
        token: &Address,
    ) -> Result<Option<LedgerEntry>, StoreError> {
        store.load::<LedgerEntry>(&LedgerEntry::key(account, token))
    }

    /// `distributed += amount`. Zero amounts leave the store untouched.
    pub fn credit<S: EntityStore + ?Sized>(
        store: &mut S,
        account: &Address,
        token: &Address,
        amount: Amount,
    ) -> Result<(), IndexerError> {
        Self::accumulate(store, account, token, amount, |entry| &mut entry.distributed)
    }

    /// `withdrawn += amount`. Zero amounts leave the store untouched.
    pub fn debit<S: EntityStore + ?Sized>(
        store: &mut S,
        account: &Address,
        token: &Address,
        amount: Amount,
    ) -> Result<(), IndexerError> {
        Self::accumulate(store, account, token, amount, |entry| &mut entry.withdrawn)
    }

    /// `distributed - withdrawn`; zero for an account that never had a row.
    ///
    /// `None` when withdrawals exceed indexed distributions, which happens
    /// when funds reached the account outside the indexed history.
    pub fn active_balance<S: EntityStore + ?Sized>(
        store: &S,
        account: &Address,
        token: &Address,
    ) -> Result<Option<Amount>, StoreError> {
        Ok(match Self::entry(store, account, token)? {
            Some(entry) => entry.active(),
            None => Some(Amount::ZERO),
        })
    }

    fn accumulate<S, F>(
        store: &mut S,
        account: &Address,
        token: &Address,
        amount: Amount,
        field: F,
    ) -> Result<(), IndexerError>
    where
        S: EntityStore + ?Sized,
        F: FnOnce(&mut LedgerEntry) -> &mut Amount,
    {
        if amount.is_zero() {
            return Ok(());
        }
        let mut entry = Self::entry(store, account, token)?
            .unwrap_or_else(|| LedgerEntry::new(account.clone(), token.clone()));
        let slot = field(&mut entry);
        *slot = slot.checked_add(amount).ok_or_else(|| {
            IndexerError::Inconsistent(format!("ledger overflow for {}/{}", account, token))
        })?;
        store.save(&entry)?;
        Ok(())
    }
}
