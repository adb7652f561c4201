//! Downstream reachability over the recipient graph.

use crate::domain::{
    AccountKind, Address, LiquidSplit, PassThroughWallet, Split, Swapper, VestingModule,
    WaterfallTranche,
};
use crate::engine::AccountResolver;
use crate::error::IndexerError;
use crate::store::{EntityStore, StoreExt};
use std::collections::HashSet;

/// Direct successors of `id` in the recipient graph.
pub fn edges<S: EntityStore + ?Sized>(
    store: &S,
    id: &Address,
) -> Result<Vec<Address>, IndexerError> {
    let Some(kind) = AccountResolver::resolve(store, id)? else {
        return Ok(Vec::new());
    };
    let next = match kind {
        AccountKind::Holder => Vec::new(),
        AccountKind::Split => store
            .load::<Split>(id.as_str())?
            .map(|s| s.recipients)
            .unwrap_or_default(),
        AccountKind::WaterfallModule => store
            .load_prefixed::<WaterfallTranche>(&format!("{}-", id))?
            .into_iter()
            .map(|t| t.recipient)
            .collect(),
        AccountKind::LiquidSplit => store
            .load::<LiquidSplit>(id.as_str())?
            .and_then(|ls| ls.payout_split)
            .into_iter()
            .collect(),
        AccountKind::Swapper => store
            .load::<Swapper>(id.as_str())?
            .map(|s| s.beneficiary)
            .into_iter()
            .collect(),
        AccountKind::VestingModule => store
            .load::<VestingModule>(id.as_str())?
            .map(|v| v.beneficiary)
            .into_iter()
            .collect(),
        AccountKind::PassThroughWallet => store
            .load::<PassThroughWallet>(id.as_str())?
            .map(|w| w.pass_through)
            .filter(|target| !target.is_zero())
            .into_iter()
            .collect(),
    };
    Ok(next)
}

/// Every account reachable from `root`, depth first in first-seen order.
///
/// Reaching an account already on the current path is a cycle and fails the
/// query; reaching one through two different paths is fine.
pub fn downstream<S: EntityStore + ?Sized>(
    store: &S,
    root: &Address,
) -> Result<Vec<Address>, IndexerError> {
    let mut seen: HashSet<Address> = HashSet::new();
    let mut on_path: Vec<Address> = vec![root.clone()];
    let mut order = Vec::new();
    visit(store, root, &mut seen, &mut on_path, &mut order)?;
    Ok(order)
}

fn visit<S: EntityStore + ?Sized>(
    store: &S,
    id: &Address,
    seen: &mut HashSet<Address>,
    on_path: &mut Vec<Address>,
    order: &mut Vec<Address>,
) -> Result<(), IndexerError> {
    for next in edges(store, id)? {
        if on_path.contains(&next) {
            return Err(IndexerError::CycleDetected(next.to_string()));
        }
        if !seen.insert(next.clone()) {
            continue;
        }
        order.push(next.clone());
        on_path.push(next.clone());
        visit(store, &next, seen, on_path, order)?;
        on_path.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventMeta, Ownership, Recipient, Timestamp, TxHash};
    use crate::store::MemoryStore;

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n))
    }

    fn meta() -> EventMeta {
        EventMeta {
            block_number: 1,
            timestamp: Timestamp::new(0),
            transaction_hash: TxHash::new("0x01"),
            transaction_index: 0,
            log_index: 0,
            origin: Default::default(),
        }
    }

    fn split(store: &mut MemoryStore, id: u8, recipients: &[u8]) {
        AccountResolver::create_if_absent(store, &addr(id), AccountKind::Split, &meta()).unwrap();
        let recipients: Vec<Address> = recipients.iter().map(|r| addr(*r)).collect();
        for r in &recipients {
            AccountResolver::ensure_holder(store, r, &meta()).unwrap();
            store
                .save(&Recipient {
                    split: addr(id),
                    account: r.clone(),
                    ownership: Ownership::new(1),
                })
                .unwrap();
        }
        store
            .save(&Split {
                id: addr(id),
                controller: None,
                pending_controller: None,
                distributor_fee: Ownership::ZERO,
                recipients,
            })
            .unwrap();
    }

    #[test]
    fn test_nested_splits_with_diamond() {
        let mut store = MemoryStore::new();
        split(&mut store, 3, &[5]);
        split(&mut store, 4, &[5]);
        split(&mut store, 1, &[3, 4]);
        let reached = downstream(&store, &addr(1)).unwrap();
        assert_eq!(reached, vec![addr(3), addr(5), addr(4)]);
    }

    #[test]
    fn test_cycle_is_fatal() {
        let mut store = MemoryStore::new();
        AccountResolver::create_if_absent(&mut store, &addr(1), AccountKind::Split, &meta())
            .unwrap();
        split(&mut store, 2, &[1]);
        split(&mut store, 1, &[2]);
        let err = downstream(&store, &addr(1)).unwrap_err();
        assert!(matches!(err, IndexerError::CycleDetected(_)));
    }

    #[test]
    fn test_unknown_root_is_empty() {
        let store = MemoryStore::new();
        assert!(downstream(&store, &addr(1)).unwrap().is_empty());
    }
}
