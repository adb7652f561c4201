use super::HandlerContext;
use crate::domain::{
    AccountKind, Address, Amount, ControlAction, ControlTransferCancelled,
    ControlTransferInitiated, ControlTransferred, FactPayload, FundsDistributed, Recipient,
    RecipientShare, SetAction, Split, SplitCreated, SplitUpdated, TokenAmount, Withdrawal,
    PERCENTAGE_SCALE,
};
use crate::engine::{compute_distribution, Ledger};
use crate::error::IndexerError;
use crate::store::StoreExt;
use tracing::debug;

const SPLIT_SET_PREFIX: &str = "sse";
const CONTROL_TRANSFER_PREFIX: &str = "cte";
const DISTRIBUTION_PREFIX: &str = "de";
const WITHDRAWAL_PREFIX: &str = "we";

/// Payout splits deployed for liquid splits are created with two
/// placeholder recipients at half each.
fn is_liquid_payout_placeholder(recipients: &[RecipientShare]) -> bool {
    let half = PERCENTAGE_SCALE / 2;
    recipients.len() == 2
        && recipients[0].account.is_zero()
        && recipients[1].account == Address::one()
        && recipients.iter().all(|r| r.ownership.ppm() == half)
}

fn write_recipients(
    ctx: &mut HandlerContext<'_>,
    split: &Address,
    recipients: &[RecipientShare],
) -> Result<(), IndexerError> {
    for share in recipients {
        ctx.ensure_holder(&share.account)?;
        ctx.store.save(&Recipient {
            split: split.clone(),
            account: share.account.clone(),
            ownership: share.ownership,
        })?;
    }
    Ok(())
}

pub(super) fn split_created(
    ctx: &mut HandlerContext<'_>,
    ev: &SplitCreated,
) -> Result<(), IndexerError> {
    if !ctx.create(&ev.split, AccountKind::Split)? {
        return Ok(());
    }
    write_recipients(ctx, &ev.split, &ev.recipients)?;

    let controller = ev.controller.clone().filter(|c| !c.is_zero());
    if let Some(controller) = &controller {
        if is_liquid_payout_placeholder(&ev.recipients) {
            debug!("Split {} is a liquid split payout split", ev.split);
        } else {
            ctx.ensure_holder(controller)?;
        }
    }

    let accounts: Vec<Address> = ev.recipients.iter().map(|r| r.account.clone()).collect();
    ctx.store.save(&Split {
        id: ev.split.clone(),
        controller,
        pending_controller: None,
        distributor_fee: ev.distributor_fee,
        recipients: accounts.clone(),
    })?;

    ctx.record(
        SPLIT_SET_PREFIX,
        &ev.split,
        FactPayload::SplitSet {
            action: SetAction::Create,
            distributor_fee: ev.distributor_fee,
            added: accounts,
            removed: Vec::new(),
        },
    )?;
    Ok(())
}

pub(super) fn split_updated(
    ctx: &mut HandlerContext<'_>,
    ev: &SplitUpdated,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.split, AccountKind::Split)? {
        return Ok(());
    }
    let mut split: Split = ctx.load_required(ev.split.as_str(), "split")?;

    let next: Vec<Address> = ev.recipients.iter().map(|r| r.account.clone()).collect();
    let removed: Vec<Address> = split
        .recipients
        .iter()
        .filter(|a| !next.contains(a))
        .cloned()
        .collect();
    let added: Vec<Address> = next
        .iter()
        .filter(|a| !split.recipients.contains(a))
        .cloned()
        .collect();

    for account in &removed {
        ctx.store
            .remove::<Recipient>(&Recipient::key(&ev.split, account))?;
    }
    write_recipients(ctx, &ev.split, &ev.recipients)?;

    split.recipients = next;
    split.distributor_fee = ev.distributor_fee;
    ctx.store.save(&split)?;

    ctx.record(
        SPLIT_SET_PREFIX,
        &ev.split,
        FactPayload::SplitSet {
            action: SetAction::Update,
            distributor_fee: ev.distributor_fee,
            added,
            removed,
        },
    )?;
    Ok(())
}

pub(super) fn control_transfer_initiated(
    ctx: &mut HandlerContext<'_>,
    ev: &ControlTransferInitiated,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.split, AccountKind::Split)? {
        return Ok(());
    }
    let mut split: Split = ctx.load_required(ev.split.as_str(), "split")?;
    ctx.ensure_holder(&ev.new_potential_controller)?;
    split.pending_controller = Some(ev.new_potential_controller.clone());
    ctx.store.save(&split)?;

    ctx.record(
        CONTROL_TRANSFER_PREFIX,
        &ev.split,
        FactPayload::ControlTransfer {
            action: ControlAction::Initiate,
            from: split.controller.clone(),
            to: split.pending_controller.clone(),
        },
    )?;
    Ok(())
}

pub(super) fn control_transfer_cancelled(
    ctx: &mut HandlerContext<'_>,
    ev: &ControlTransferCancelled,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.split, AccountKind::Split)? {
        return Ok(());
    }
    let mut split: Split = ctx.load_required(ev.split.as_str(), "split")?;
    let cancelled = split.pending_controller.take();
    ctx.store.save(&split)?;

    ctx.record(
        CONTROL_TRANSFER_PREFIX,
        &ev.split,
        FactPayload::ControlTransfer {
            action: ControlAction::Cancel,
            from: split.controller.clone(),
            to: cancelled,
        },
    )?;
    Ok(())
}

pub(super) fn control_transferred(
    ctx: &mut HandlerContext<'_>,
    ev: &ControlTransferred,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.split, AccountKind::Split)? {
        return Ok(());
    }
    let mut split: Split = ctx.load_required(ev.split.as_str(), "split")?;
    let previous = split.controller.take();

    // Transferring to the zero address renounces control.
    if !ev.new_controller.is_zero() {
        ctx.ensure_holder(&ev.new_controller)?;
        split.controller = Some(ev.new_controller.clone());
    }
    split.pending_controller = None;
    ctx.store.save(&split)?;

    ctx.record(
        CONTROL_TRANSFER_PREFIX,
        &ev.split,
        FactPayload::ControlTransfer {
            action: ControlAction::Transfer,
            from: previous,
            to: split.controller.clone(),
        },
    )?;
    Ok(())
}

/// Credits the fee and recipient shares of one distribution.
///
/// The split's own `withdrawn` total is left alone: only `Withdrawal` events
/// debit a ledger row. A split that is itself a recipient therefore keeps
/// its received funds in its active balance after passing them on.
pub(super) fn funds_distributed(
    ctx: &mut HandlerContext<'_>,
    ev: &FundsDistributed,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.split, AccountKind::Split)? {
        return Ok(());
    }
    let split: Split = ctx.load_required(ev.split.as_str(), "split")?;

    let mut shares = Vec::with_capacity(split.recipients.len());
    for account in &split.recipients {
        let recipient: Recipient =
            ctx.load_required(&Recipient::key(&ev.split, account), "recipient")?;
        shares.push(RecipientShare {
            account: recipient.account,
            ownership: recipient.ownership,
        });
    }

    let plan = compute_distribution(ev.amount, split.distributor_fee, &shares, &ev.distributor)?;

    if let Some(credit) = &plan.distributor_credit {
        ctx.ensure_holder(&credit.account)?;
        Ledger::credit(&mut ctx.store, &credit.account, &ev.token, credit.amount)?;
    }
    for credit in &plan.recipient_credits {
        Ledger::credit(&mut ctx.store, &credit.account, &ev.token, credit.amount)?;
    }
    if !plan.dust.is_zero() {
        debug!(
            "Distribution of {} from {} left {} undistributed",
            ev.amount, ev.split, plan.dust
        );
    }

    ctx.record(
        DISTRIBUTION_PREFIX,
        &ev.split,
        FactPayload::Distribution {
            token: ev.token.clone(),
            amount: ev.amount,
            distributor: Some(ev.distributor.clone()).filter(|d| !d.is_zero()),
            distributor_fee: plan.distributor_fee,
            dust: plan.dust,
        },
    )?;
    Ok(())
}

pub(super) fn withdrawal(ctx: &mut HandlerContext<'_>, ev: &Withdrawal) -> Result<(), IndexerError> {
    ctx.ensure_holder(&ev.account)?;

    let mut withdrawn: Vec<TokenAmount> = Vec::with_capacity(ev.tokens.len() + 1);
    if !ev.native_amount.is_zero() {
        withdrawn.push(TokenAmount {
            token: Address::zero(),
            amount: ev.native_amount,
        });
    }
    withdrawn.extend(ev.tokens.iter().filter(|t| !t.amount.is_zero()).cloned());

    for item in &withdrawn {
        Ledger::debit(&mut ctx.store, &ev.account, &item.token, item.amount)?;
    }
    let total: Amount = withdrawn.iter().map(|t| t.amount).sum();
    debug!("Withdrawal by {}: {} tokens, {} total units", ev.account, withdrawn.len(), total);

    ctx.record(
        WITHDRAWAL_PREFIX,
        &ev.account,
        FactPayload::Withdrawal { tokens: withdrawn },
    )?;
    Ok(())
}
