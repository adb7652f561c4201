//! Sequential tranche fill for waterfall modules.

use crate::domain::{Address, Amount, TrancheFill, WaterfallTranche};
use crate::error::IndexerError;

/// Build tranches from cumulative thresholds.
///
/// Tranche `i` starts at `thresholds[i-1]` (0 for the first) and is bounded by
/// `thresholds[i]`; the final recipient gets the unbounded residual tranche.
pub fn build_tranches(
    waterfall: &Address,
    recipients: &[Address],
    thresholds: &[Amount],
) -> Result<Vec<WaterfallTranche>, IndexerError> {
    if recipients.len() != thresholds.len() + 1 {
        return Err(IndexerError::InvalidEvent(format!(
            "waterfall {} has {} recipients for {} thresholds",
            waterfall,
            recipients.len(),
            thresholds.len()
        )));
    }

    let mut tranches = Vec::with_capacity(recipients.len());
    let mut start = Amount::ZERO;
    for (index, recipient) in recipients.iter().enumerate() {
        let size = match thresholds.get(index) {
            Some(threshold) => Some(
                threshold
                    .checked_sub(start)
                    .filter(|size| !size.is_zero())
                    .ok_or_else(|| {
                        IndexerError::InvalidEvent(format!(
                            "waterfall {} thresholds must be strictly increasing",
                            waterfall
                        ))
                    })?,
            ),
            None => None,
        };
        tranches.push(WaterfallTranche {
            waterfall: waterfall.clone(),
            index,
            start_amount: start,
            size,
            claimed_amount: Amount::ZERO,
            recipient: recipient.clone(),
        });
        if let Some(threshold) = thresholds.get(index) {
            start = *threshold;
        }
    }
    Ok(tranches)
}

/// Pay `total` into `tranches` in index order, updating `claimed_amount`.
///
/// Returns one fill per tranche that received funds. The fills always sum to
/// `total`; running out of tranches first means the residual is missing.
pub fn fill_tranches(
    tranches: &mut [WaterfallTranche],
    total: Amount,
) -> Result<Vec<TrancheFill>, IndexerError> {
    let mut remaining = total;
    let mut fills = Vec::new();

    for tranche in tranches.iter_mut() {
        if remaining.is_zero() {
            break;
        }
        let paid = match tranche.size {
            Some(size) => {
                let room = size.checked_sub(tranche.claimed_amount).ok_or_else(|| {
                    IndexerError::Inconsistent(format!(
                        "tranche {} of {} claimed beyond its size",
                        tranche.index, tranche.waterfall
                    ))
                })?;
                if room.is_zero() {
                    continue;
                }
                room.min(remaining)
            }
            None => remaining,
        };

        tranche.claimed_amount = tranche.claimed_amount.checked_add(paid).ok_or_else(|| {
            IndexerError::Inconsistent(format!("tranche {} claimed overflow", tranche.index))
        })?;
        remaining = remaining.saturating_sub(paid);
        fills.push(TrancheFill {
            index: tranche.index,
            recipient: tranche.recipient.clone(),
            amount: paid,
        });
    }

    if !remaining.is_zero() {
        return Err(IndexerError::Inconsistent(format!(
            "waterfall funding left {} unallocated; residual tranche missing",
            remaining
        )));
    }
    Ok(fills)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n))
    }

    fn amt(n: u64) -> Amount {
        Amount::from_u64(n)
    }

    #[test]
    fn test_build_tranches_from_thresholds() {
        let tranches =
            build_tranches(&addr(9), &[addr(1), addr(2), addr(3)], &[amt(100), amt(300)]).unwrap();
        assert_eq!(tranches.len(), 3);
        assert_eq!(tranches[0].start_amount, amt(0));
        assert_eq!(tranches[0].size, Some(amt(100)));
        assert_eq!(tranches[1].start_amount, amt(100));
        assert_eq!(tranches[1].size, Some(amt(200)));
        assert_eq!(tranches[2].start_amount, amt(300));
        assert!(tranches[2].is_residual());
    }

    #[test]
    fn test_build_tranches_rejects_bad_shapes() {
        assert!(matches!(
            build_tranches(&addr(9), &[addr(1)], &[amt(100)]),
            Err(IndexerError::InvalidEvent(_))
        ));
        assert!(matches!(
            build_tranches(&addr(9), &[addr(1), addr(2), addr(3)], &[amt(100), amt(100)]),
            Err(IndexerError::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_single_residual_takes_everything() {
        let mut tranches = build_tranches(&addr(9), &[addr(1)], &[]).unwrap();
        let fills = fill_tranches(&mut tranches, amt(77)).unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].amount, amt(77));
        assert_eq!(tranches[0].claimed_amount, amt(77));
    }

    #[test]
    fn test_zero_funding_is_noop() {
        let mut tranches = build_tranches(&addr(9), &[addr(1), addr(2)], &[amt(10)]).unwrap();
        let fills = fill_tranches(&mut tranches, Amount::ZERO).unwrap();
        assert!(fills.is_empty());
    }

    #[test]
    fn test_missing_residual_is_inconsistent() {
        let mut tranches = build_tranches(&addr(9), &[addr(1), addr(2)], &[amt(10)]).unwrap();
        tranches.pop();
        let err = fill_tranches(&mut tranches, amt(11)).unwrap_err();
        assert!(matches!(err, IndexerError::Inconsistent(_)));
    }
}
