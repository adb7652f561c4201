//! Account resolver: one authoritative kind per identifier.

use crate::domain::{Account, AccountKind, Address, EventMeta, ParentEntityType};
use crate::error::IndexerError;
use crate::store::{EntityStore, StoreError, StoreExt};
use tracing::{debug, warn};

/// Result of [`AccountResolver::create_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Creation {
    Created,
    /// The id was already taken; nothing was written.
    Existing(AccountKind),
}

impl Creation {
    pub fn is_created(&self) -> bool {
        matches!(self, Creation::Created)
    }
}

/// Result of [`AccountResolver::require`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindCheck {
    Matches,
    /// The id exists under another kind (first writer won).
    Collision(AccountKind),
}

pub struct AccountResolver;

impl AccountResolver {
    pub fn resolve<S: EntityStore + ?Sized>(
        store: &S,
        id: &Address,
    ) -> Result<Option<AccountKind>, StoreError> {
        Ok(Self::load(store, id)?.map(|a| a.kind))
    }

    pub fn load<S: EntityStore + ?Sized>(
        store: &S,
        id: &Address,
    ) -> Result<Option<Account>, StoreError> {
        store.load::<Account>(id.as_str())
    }

    /// Register `id` as `kind` unless it already names an account.
    ///
    /// Collisions are logged and never overwrite the existing kind.
    pub fn create_if_absent<S: EntityStore + ?Sized>(
        store: &mut S,
        id: &Address,
        kind: AccountKind,
        meta: &EventMeta,
    ) -> Result<Creation, StoreError> {
        if let Some(existing) = Self::resolve(store, id)? {
            if kind.is_structured() {
                warn!(
                    "Cannot create {} at {}: already registered as {}",
                    kind, id, existing
                );
            } else if existing.is_structured() {
                debug!("Not creating holder at {}: already a {}", id, existing);
            }
            return Ok(Creation::Existing(existing));
        }

        store.save(&Account {
            id: id.clone(),
            kind,
            created_block: meta.block_number,
            latest_block: meta.block_number,
            latest_activity: meta.timestamp,
            parent_entity_type: None,
        })?;
        Ok(Creation::Created)
    }

    pub fn ensure_holder<S: EntityStore + ?Sized>(
        store: &mut S,
        id: &Address,
        meta: &EventMeta,
    ) -> Result<Creation, StoreError> {
        Self::create_if_absent(store, id, AccountKind::Holder, meta)
    }

    /// Check that `id` exists with `kind`.
    ///
    /// An unknown id is fatal; a different kind is a benign collision and is
    /// logged at warning level.
    pub fn require<S: EntityStore + ?Sized>(
        store: &S,
        id: &Address,
        kind: AccountKind,
    ) -> Result<KindCheck, IndexerError> {
        match Self::resolve(store, id)? {
            None => Err(IndexerError::missing(kind, id)),
            Some(found) if found == kind => Ok(KindCheck::Matches),
            Some(found) => {
                warn!("Expected {} at {} but found {}; skipping", kind, id, found);
                Ok(KindCheck::Collision(found))
            }
        }
    }

    /// Record activity on an existing account. Unknown ids are ignored.
    pub fn touch<S: EntityStore + ?Sized>(
        store: &mut S,
        id: &Address,
        meta: &EventMeta,
    ) -> Result<(), StoreError> {
        if let Some(mut account) = Self::load(store, id)? {
            if meta.block_number >= account.latest_block {
                account.latest_block = meta.block_number;
                account.latest_activity = meta.timestamp;
                store.save(&account)?;
            }
        }
        Ok(())
    }

    /// Tag an account with the product it belongs to. Returns false if the
    /// account does not exist.
    pub fn set_parent<S: EntityStore + ?Sized>(
        store: &mut S,
        id: &Address,
        parent: ParentEntityType,
    ) -> Result<bool, StoreError> {
        match Self::load(store, id)? {
            Some(mut account) => {
                account.parent_entity_type = Some(parent);
                store.save(&account)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
