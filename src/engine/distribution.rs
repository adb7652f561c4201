//! Proportional distribution with distributor-fee deduction.
//!
//! All shares truncate toward zero. The shortfall between `remaining` and the
//! sum of recipient credits is reported as dust and credited to nobody.

use crate::domain::{Address, Amount, Ownership, RecipientShare, PERCENTAGE_SCALE};
use crate::error::IndexerError;

/// One ledger credit produced by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub account: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionPlan {
    pub gross: Amount,
    /// Withheld fee, whether or not anyone is credited with it.
    pub distributor_fee: Amount,
    /// `None` when the fee is zero or the distributor is unknown.
    pub distributor_credit: Option<Credit>,
    pub recipient_credits: Vec<Credit>,
    pub dust: Amount,
}

impl DistributionPlan {
    /// Sum of everything credited, fee included.
    pub fn total_credited(&self) -> Amount {
        self.recipient_credits
            .iter()
            .map(|c| c.amount)
            .chain(self.distributor_credit.iter().map(|c| c.amount))
            .sum()
    }
}

/// Compute the credits for distributing `gross` through a split.
///
/// `distributor` is the zero address when the caller could not be identified.
pub fn compute_distribution(
    gross: Amount,
    distributor_fee: Ownership,
    recipients: &[RecipientShare],
    distributor: &Address,
) -> Result<DistributionPlan, IndexerError> {
    if distributor_fee.ppm() >= PERCENTAGE_SCALE {
        return Err(IndexerError::Inconsistent(format!(
            "distributor fee {} is not below scale",
            distributor_fee.ppm()
        )));
    }
    let scale = PERCENTAGE_SCALE as u64;

    let fee = if distributor_fee.is_zero() {
        Amount::ZERO
    } else {
        mul_ppm(gross, distributor_fee)?
    };
    let remaining = gross
        .checked_sub(fee)
        .ok_or_else(|| IndexerError::Inconsistent("fee exceeds gross amount".to_string()))?;

    let distributor_credit = if fee.is_zero() || distributor.is_zero() {
        None
    } else {
        Some(Credit {
            account: distributor.clone(),
            amount: fee,
        })
    };

    let mut recipient_credits = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let amount = remaining
            .mul_div_floor(recipient.ownership.ppm() as u64, scale)
            .ok_or_else(|| IndexerError::Inconsistent("recipient share overflow".to_string()))?;
        recipient_credits.push(Credit {
            account: recipient.account.clone(),
            amount,
        });
    }

    let credited: Amount = recipient_credits.iter().map(|c| c.amount).sum();
    let dust = remaining.saturating_sub(credited);

    Ok(DistributionPlan {
        gross,
        distributor_fee: fee,
        distributor_credit,
        recipient_credits,
        dust,
    })
}

fn mul_ppm(amount: Amount, share: Ownership) -> Result<Amount, IndexerError> {
    amount
        .mul_div_floor(share.ppm() as u64, PERCENTAGE_SCALE as u64)
        .ok_or_else(|| IndexerError::Inconsistent("fee overflow".to_string()))
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
    fn test_no_fee_exact_split() {
        let recipients = vec![
            RecipientShare::new(addr(1), 600_000),
            RecipientShare::new(addr(2), 400_000),
        ];
        let plan = compute_distribution(amt(1000), Ownership::ZERO, &recipients, &addr(9)).unwrap();
        assert_eq!(plan.distributor_fee, Amount::ZERO);
        assert_eq!(plan.distributor_credit, None);
        assert_eq!(plan.recipient_credits[0].amount, amt(600));
        assert_eq!(plan.recipient_credits[1].amount, amt(400));
        assert_eq!(plan.dust, Amount::ZERO);
    }

    #[test]
    fn test_dust_not_reassigned() {
        let recipients = vec![
            RecipientShare::new(addr(1), 333_333),
            RecipientShare::new(addr(2), 333_333),
            RecipientShare::new(addr(3), 333_334),
        ];
        let plan = compute_distribution(amt(100), Ownership::ZERO, &recipients, &addr(9)).unwrap();
        let amounts: Vec<Amount> = plan.recipient_credits.iter().map(|c| c.amount).collect();
        assert_eq!(amounts, vec![amt(33), amt(33), amt(33)]);
        assert_eq!(plan.dust, amt(1));
    }

    #[test]
    fn test_fee_withheld_for_unknown_distributor() {
        let recipients = vec![RecipientShare::new(addr(1), 1_000_000)];
        let plan =
            compute_distribution(amt(1000), Ownership::new(100_000), &recipients, &Address::zero())
                .unwrap();
        assert_eq!(plan.distributor_fee, amt(100));
        assert_eq!(plan.distributor_credit, None);
        assert_eq!(plan.recipient_credits[0].amount, amt(900));
        assert_eq!(plan.total_credited(), amt(900));
    }

    #[test]
    fn test_fee_at_scale_rejected() {
        let recipients = vec![RecipientShare::new(addr(1), 1_000_000)];
        let err = compute_distribution(amt(1), Ownership::FULL, &recipients, &addr(9)).unwrap_err();
        assert!(matches!(err, IndexerError::Inconsistent(_)));
    }

    #[test]
    fn test_zero_gross() {
        let recipients = vec![RecipientShare::new(addr(1), 1_000_000)];
        let plan =
            compute_distribution(Amount::ZERO, Ownership::new(10), &recipients, &addr(9)).unwrap();
        assert_eq!(plan.total_credited(), Amount::ZERO);
        assert_eq!(plan.distributor_credit, None);
    }
}
