use super::HandlerContext;
use crate::domain::{
    AccountKind, Address, Amount, FactPayload, OwnerExecCalls, ParentEntityType,
    PassThroughWallet, Split, SwapBalance, Swapper, SwapperChange, SwapperCreated, SwapperFlash,
    SwapperUpdated,
};
use crate::engine::{flash_legs, trace, AccountResolver, Ledger, SwapLeg, TraceContext};
use crate::error::IndexerError;
use crate::store::{joint_id, StoreExt};
use tracing::debug;

const SWAPPER_UPDATE_PREFIX: &str = "sue";
const SWAP_PREFIX: &str = "sfe";
const RECEIPT_PREFIX: &str = "rcv";

pub(super) fn swapper_created(
    ctx: &mut HandlerContext<'_>,
    ev: &SwapperCreated,
) -> Result<(), IndexerError> {
    if !ctx.create(&ev.swapper, AccountKind::Swapper)? {
        return Ok(());
    }
    ctx.ensure_holder(&ev.owner)?;
    ctx.ensure_holder(&ev.beneficiary)?;

    let mut swapper = Swapper {
        id: ev.swapper.clone(),
        owner: ev.owner.clone(),
        paused: ev.paused,
        beneficiary: ev.beneficiary.clone(),
        token_to_beneficiary: ev.token_to_beneficiary.clone(),
        oracle: ev.oracle.clone(),
        default_scaled_offer_factor: ev.default_scaled_offer_factor,
        pair_overrides: Vec::new(),
    };
    for pair in &ev.pair_overrides {
        swapper.set_pair_override(pair.clone());
    }
    ctx.store.save(&swapper)?;
    Ok(())
}

pub(super) fn swapper_updated(
    ctx: &mut HandlerContext<'_>,
    ev: &SwapperUpdated,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.swapper, AccountKind::Swapper)? {
        return Ok(());
    }
    let mut swapper: Swapper = ctx.load_required(ev.swapper.as_str(), "swapper")?;

    match &ev.change {
        SwapperChange::Beneficiary(beneficiary) => {
            ctx.ensure_holder(beneficiary)?;
            swapper.beneficiary = beneficiary.clone();
        }
        SwapperChange::TokenToBeneficiary(token) => swapper.token_to_beneficiary = token.clone(),
        SwapperChange::Oracle(oracle) => swapper.oracle = oracle.clone(),
        SwapperChange::DefaultScaledOfferFactor(factor) => {
            swapper.default_scaled_offer_factor = *factor
        }
        SwapperChange::PairOverrides(pairs) => {
            for pair in pairs {
                swapper.set_pair_override(pair.clone());
            }
        }
        SwapperChange::Paused(paused) => swapper.paused = *paused,
        SwapperChange::Owner(owner) => {
            ctx.ensure_holder(owner)?;
            swapper.owner = owner.clone();
        }
    }
    ctx.store.save(&swapper)?;

    ctx.record(
        SWAPPER_UPDATE_PREFIX,
        &ev.swapper,
        FactPayload::SwapperUpdate {
            change: ev.change.clone(),
        },
    )?;
    Ok(())
}

pub(super) fn swapper_flash(
    ctx: &mut HandlerContext<'_>,
    ev: &SwapperFlash,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.swapper, AccountKind::Swapper)? {
        return Ok(());
    }
    let swapper: Swapper = ctx.load_required(ev.swapper.as_str(), "swapper")?;
    let legs = flash_legs(
        &swapper.beneficiary,
        &ev.token_to_beneficiary,
        &ev.quotes,
        ev.excess_to_beneficiary,
    );
    apply_legs(ctx, &ev.swapper, &legs)
}

pub(super) fn owner_exec_calls(
    ctx: &mut HandlerContext<'_>,
    ev: &OwnerExecCalls,
) -> Result<(), IndexerError> {
    let Some(trace_ctx) = trace_context(ctx, &ev.account)? else {
        debug!("Ignoring owner calls on {}: not a traced account", ev.account);
        return Ok(());
    };
    let report = trace(&trace_ctx, &ev.calls, &ev.logs);
    if report.dropped > 0 {
        debug!(
            "Swap trace for {} dropped {} unmatched legs",
            ev.account, report.dropped
        );
    }
    ctx.dropped_legs += report.dropped;
    apply_legs(ctx, &ev.account, &report.legs)
}

fn trace_context(
    ctx: &HandlerContext<'_>,
    account: &Address,
) -> Result<Option<TraceContext>, IndexerError> {
    match ctx.kind_of(account)? {
        Some(AccountKind::Swapper) => {
            let swapper: Swapper = ctx.load_required(account.as_str(), "swapper")?;
            Ok(Some(TraceContext::single(account.clone(), swapper.beneficiary)))
        }
        Some(AccountKind::PassThroughWallet) => {
            let is_diversifier = AccountResolver::load(&ctx.store, account)?
                .and_then(|a| a.parent_entity_type)
                == Some(ParentEntityType::Diversifier);
            if !is_diversifier {
                return Ok(None);
            }
            let wallet: PassThroughWallet =
                ctx.load_required(account.as_str(), "passThroughWallet")?;
            let Some(split) = ctx.store.load::<Split>(wallet.pass_through.as_str())? else {
                return Ok(None);
            };

            let mut beneficiaries = Vec::with_capacity(split.recipients.len());
            let mut round_robin = Vec::new();
            for recipient in &split.recipients {
                match ctx.store.load::<Swapper>(recipient.as_str())? {
                    Some(swapper) => {
                        round_robin.push(swapper.beneficiary.clone());
                        beneficiaries.push(swapper.beneficiary);
                    }
                    None => beneficiaries.push(recipient.clone()),
                }
            }
            Ok(Some(TraceContext {
                account: account.clone(),
                beneficiaries,
                round_robin,
                default_beneficiary: None,
            }))
        }
        _ => Ok(None),
    }
}

/// Per-pair totals for one event, with per-beneficiary output.
struct PairTotals {
    input_token: Address,
    output_token: Address,
    input_amount: Amount,
    output_amount: Amount,
    receipts: Vec<(Address, Amount)>,
}

fn add(a: Amount, b: Amount) -> Result<Amount, IndexerError> {
    a.checked_add(b)
        .ok_or_else(|| IndexerError::Inconsistent("swap total overflow".to_string()))
}

/// Apply swap legs for `account`: beneficiary withdrawals, running pair
/// balances, then one swap fact per pair and one receipt per beneficiary.
fn apply_legs(
    ctx: &mut HandlerContext<'_>,
    account: &Address,
    legs: &[SwapLeg],
) -> Result<(), IndexerError> {
    let mut pairs: Vec<PairTotals> = Vec::new();

    for leg in legs {
        // Structured beneficiaries still hold the output, so it stays in
        // their active balance.
        if ctx.kind_of(&leg.beneficiary)? == Some(AccountKind::Holder) {
            Ledger::debit(
                &mut ctx.store,
                &leg.beneficiary,
                &leg.output_token,
                leg.output_amount,
            )?;
        }

        let key = SwapBalance::key(account, &leg.input_token, &leg.output_token);
        let mut balance = ctx.store.load::<SwapBalance>(&key)?.unwrap_or(SwapBalance {
            account: account.clone(),
            input_token: leg.input_token.clone(),
            output_token: leg.output_token.clone(),
            input_amount: Amount::ZERO,
            output_amount: Amount::ZERO,
        });
        balance.input_amount = add(balance.input_amount, leg.input_amount)?;
        balance.output_amount = add(balance.output_amount, leg.output_amount)?;
        ctx.store.save(&balance)?;

        let idx = match pairs
            .iter()
            .position(|p| p.input_token == leg.input_token && p.output_token == leg.output_token)
        {
            Some(idx) => idx,
            None => {
                pairs.push(PairTotals {
                    input_token: leg.input_token.clone(),
                    output_token: leg.output_token.clone(),
                    input_amount: Amount::ZERO,
                    output_amount: Amount::ZERO,
                    receipts: Vec::new(),
                });
                pairs.len() - 1
            }
        };
        let pair = &mut pairs[idx];
        pair.input_amount = add(pair.input_amount, leg.input_amount)?;
        pair.output_amount = add(pair.output_amount, leg.output_amount)?;
        match pair.receipts.iter_mut().find(|(b, _)| *b == leg.beneficiary) {
            Some((_, amount)) => *amount = add(*amount, leg.output_amount)?,
            None => pair
                .receipts
                .push((leg.beneficiary.clone(), leg.output_amount)),
        }
    }

    for pair in pairs {
        let swap_id = joint_id(&[
            &ctx.meta.record_id(SWAP_PREFIX),
            pair.input_token.as_str(),
            pair.output_token.as_str(),
        ]);
        ctx.record_with_id(
            swap_id.clone(),
            account,
            FactPayload::Swap {
                input_token: pair.input_token.clone(),
                input_amount: pair.input_amount,
                output_token: pair.output_token.clone(),
                output_amount: pair.output_amount,
            },
        )?;
        for (beneficiary, amount) in pair.receipts {
            ctx.record_with_id(
                joint_id(&[RECEIPT_PREFIX, &swap_id, beneficiary.as_str()]),
                &beneficiary,
                FactPayload::SwapReceipt {
                    swap: swap_id.clone(),
                    beneficiary: beneficiary.clone(),
                    output_token: pair.output_token.clone(),
                    output_amount: amount,
                },
            )?;
        }
    }

    ctx.swap_legs += legs.len();
    Ok(())
}
