use super::HandlerContext;
use crate::domain::{
    AccountKind, Address, Amount, FactPayload, LiquidSplit, LiquidSplitCreated,
    LiquidSplitFactoryCreated, LiquidSplitHolderTransfer, Ownership, OwnershipModel,
    ParentEntityType, PassThroughFunds, PassThroughWallet, PassThroughWalletCreated,
    PassThroughWalletUpdated, RecoupCreated, Split, TokenRelease, TransferType, VestingAction,
    VestingFundsReleased, VestingModule, VestingModuleCreated, VestingStream,
    VestingStreamCreated, WalletChange, WaterfallCreated, WaterfallFunded, WaterfallModule,
    WaterfallTranche,
};
use crate::engine::{build_tranches, fill_tranches, AccountResolver, Ledger, OwnershipTracker};
use crate::error::IndexerError;
use crate::store::StoreExt;
use tracing::{info, warn};

const WATERFALL_FUNDS_PREFIX: &str = "wfe";
const VESTING_MODULE_PREFIX: &str = "cvme";
const VESTING_STREAM_PREFIX: &str = "cvse";
const VESTING_RELEASE_PREFIX: &str = "rvfe";
const HOLDER_TRANSFER_PREFIX: &str = "tne";
const PASS_THROUGH_FUNDS_PREFIX: &str = "ptfe";

fn load_tranches(
    ctx: &HandlerContext<'_>,
    waterfall: &WaterfallModule,
) -> Result<Vec<WaterfallTranche>, IndexerError> {
    (0..waterfall.tranche_count)
        .map(|index| {
            ctx.load_required(
                &WaterfallTranche::key(&waterfall.id, index),
                "waterfallTranche",
            )
        })
        .collect()
}

pub(super) fn waterfall_created(
    ctx: &mut HandlerContext<'_>,
    ev: &WaterfallCreated,
) -> Result<(), IndexerError> {
    let tranches = build_tranches(&ev.waterfall, &ev.recipients, &ev.thresholds)?;
    if !ctx.create(&ev.waterfall, AccountKind::WaterfallModule)? {
        return Ok(());
    }
    for tranche in &tranches {
        ctx.ensure_holder(&tranche.recipient)?;
        ctx.store.save(tranche)?;
    }
    ctx.store.save(&WaterfallModule {
        id: ev.waterfall.clone(),
        token: ev.token.clone(),
        tranche_count: tranches.len(),
        total_claimed: Amount::ZERO,
    })?;
    Ok(())
}

pub(super) fn waterfall_funded(
    ctx: &mut HandlerContext<'_>,
    ev: &WaterfallFunded,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.waterfall, AccountKind::WaterfallModule)? {
        return Ok(());
    }
    let mut waterfall: WaterfallModule =
        ctx.load_required(ev.waterfall.as_str(), "waterfallModule")?;
    let mut tranches = load_tranches(ctx, &waterfall)?;

    let total = ev
        .payouts
        .iter()
        .try_fold(Amount::ZERO, |acc, p| acc.checked_add(*p))
        .ok_or_else(|| IndexerError::InvalidEvent("waterfall payouts overflow".to_string()))?;
    let fills = fill_tranches(&mut tranches, total)?;

    for fill in &fills {
        Ledger::credit(&mut ctx.store, &fill.recipient, &waterfall.token, fill.amount)?;
        if let Some(tranche) = tranches.iter().find(|t| t.index == fill.index) {
            ctx.store.save(tranche)?;
        }
    }
    waterfall.total_claimed = waterfall.total_claimed.checked_add(total).ok_or_else(|| {
        IndexerError::Inconsistent(format!("waterfall {} total claimed overflow", waterfall.id))
    })?;
    ctx.store.save(&waterfall)?;

    ctx.record(
        WATERFALL_FUNDS_PREFIX,
        &ev.waterfall,
        FactPayload::WaterfallFunds {
            token: waterfall.token.clone(),
            amount: total,
            fills,
        },
    )?;
    Ok(())
}

pub(super) fn recoup_created(
    ctx: &mut HandlerContext<'_>,
    ev: &RecoupCreated,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.waterfall, AccountKind::WaterfallModule)? {
        return Ok(());
    }
    let waterfall: WaterfallModule = ctx.load_required(ev.waterfall.as_str(), "waterfallModule")?;
    AccountResolver::set_parent(&mut ctx.store, &ev.waterfall, ParentEntityType::Recoup)?;

    for tranche in load_tranches(ctx, &waterfall)? {
        if ctx.kind_of(&tranche.recipient)? == Some(AccountKind::Split) {
            AccountResolver::set_parent(&mut ctx.store, &tranche.recipient, ParentEntityType::Recoup)?;
        }
    }
    Ok(())
}

pub(super) fn vesting_module_created(
    ctx: &mut HandlerContext<'_>,
    ev: &VestingModuleCreated,
) -> Result<(), IndexerError> {
    if !ctx.create(&ev.module, AccountKind::VestingModule)? {
        return Ok(());
    }
    ctx.ensure_holder(&ev.beneficiary)?;
    ctx.store.save(&VestingModule {
        id: ev.module.clone(),
        beneficiary: ev.beneficiary.clone(),
        vesting_period: ev.vesting_period,
    })?;

    ctx.record(
        VESTING_MODULE_PREFIX,
        &ev.module,
        FactPayload::Vesting {
            action: VestingAction::ModuleCreated,
            stream_id: None,
            token: None,
            amount: None,
        },
    )?;
    Ok(())
}

pub(super) fn vesting_stream_created(
    ctx: &mut HandlerContext<'_>,
    ev: &VestingStreamCreated,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.module, AccountKind::VestingModule)? {
        return Ok(());
    }
    ctx.store.save(&VestingStream {
        module: ev.module.clone(),
        stream_id: ev.stream_id,
        token: ev.token.clone(),
        total_amount: ev.amount,
        claimed_amount: Amount::ZERO,
        start_time: ctx.meta.timestamp,
    })?;

    ctx.record(
        VESTING_STREAM_PREFIX,
        &ev.module,
        FactPayload::Vesting {
            action: VestingAction::StreamCreated,
            stream_id: Some(ev.stream_id),
            token: Some(ev.token.clone()),
            amount: Some(ev.amount),
        },
    )?;
    Ok(())
}

pub(super) fn vesting_funds_released(
    ctx: &mut HandlerContext<'_>,
    ev: &VestingFundsReleased,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.module, AccountKind::VestingModule)? {
        return Ok(());
    }
    let mut stream: VestingStream = ctx.load_required(
        &VestingStream::key(&ev.module, ev.stream_id),
        "vestingStream",
    )?;
    let total = stream.total_amount;
    stream.claimed_amount = stream
        .claimed_amount
        .checked_add(ev.amount)
        .filter(|claimed| *claimed <= total)
        .ok_or_else(|| {
            IndexerError::Inconsistent(format!(
                "stream {} of {} released beyond its total",
                ev.stream_id, ev.module
            ))
        })?;
    ctx.store.save(&stream)?;

    ctx.record(
        VESTING_RELEASE_PREFIX,
        &ev.module,
        FactPayload::Vesting {
            action: VestingAction::FundsReleased,
            stream_id: Some(ev.stream_id),
            token: Some(stream.token.clone()),
            amount: Some(ev.amount),
        },
    )?;
    Ok(())
}

pub(super) fn liquid_split_created(
    ctx: &mut HandlerContext<'_>,
    ev: &LiquidSplitCreated,
) -> Result<(), IndexerError> {
    if !ctx.create(&ev.liquid_split, AccountKind::LiquidSplit)? {
        return Ok(());
    }

    let (mut payout_split, mut distributor_fee) = (ev.payout_split.clone(), ev.distributor_fee);
    if payout_split.is_none() || distributor_fee.is_none() {
        match ctx.reader.liquid_split_config(&ev.liquid_split) {
            Ok(config) => {
                payout_split = payout_split.or(Some(config.payout_split));
                distributor_fee = distributor_fee.or(Some(config.distributor_fee));
            }
            Err(e) => warn!(
                "Could not read config of liquid split {}, using defaults: {}",
                ev.liquid_split, e
            ),
        }
    }

    ctx.store.save(&LiquidSplit {
        id: ev.liquid_split.clone(),
        payout_split: payout_split.filter(|s| !s.is_zero()),
        distributor_fee: distributor_fee.unwrap_or(Ownership::ZERO),
        ownership_model: OwnershipModel::External,
    })?;
    Ok(())
}

pub(super) fn liquid_split_factory_created(
    ctx: &mut HandlerContext<'_>,
    ev: &LiquidSplitFactoryCreated,
) -> Result<(), IndexerError> {
    let Some(mut liquid_split) = ctx.store.load::<LiquidSplit>(ev.liquid_split.as_str())? else {
        warn!(
            "Factory marked {} but no liquid split exists there; skipping",
            ev.liquid_split
        );
        return Ok(());
    };
    liquid_split.ownership_model = OwnershipModel::FactoryLinear;
    ctx.store.save(&liquid_split)?;
    Ok(())
}

pub(super) fn liquid_split_holder_transfer(
    ctx: &mut HandlerContext<'_>,
    ev: &LiquidSplitHolderTransfer,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.liquid_split, AccountKind::LiquidSplit)? {
        return Ok(());
    }
    let liquid_split: LiquidSplit = ctx.load_required(ev.liquid_split.as_str(), "liquidSplit")?;

    ctx.ensure_holder(&ev.from)?;
    ctx.ensure_holder(&ev.to)?;
    match liquid_split.ownership_model {
        OwnershipModel::FactoryLinear => {
            OwnershipTracker::apply_factory_transfer(
                &mut ctx.store,
                &ev.liquid_split,
                &ev.from,
                &ev.to,
                &ev.amounts,
            )?;
        }
        OwnershipModel::External => {
            OwnershipTracker::apply_external_transfer(
                &mut ctx.store,
                ctx.reader,
                &ev.liquid_split,
                &ev.from,
                &ev.to,
            )?;
        }
    }

    ctx.record(
        HOLDER_TRANSFER_PREFIX,
        &ev.liquid_split,
        FactPayload::HolderTransfer {
            transfer_type: TransferType::classify(&ev.from, &ev.to),
            from: ev.from.clone(),
            to: ev.to.clone(),
            amount: ev.amounts.iter().copied().sum(),
        },
    )?;
    Ok(())
}

pub(super) fn pass_through_wallet_created(
    ctx: &mut HandlerContext<'_>,
    ev: &PassThroughWalletCreated,
) -> Result<(), IndexerError> {
    if !ctx.create(&ev.wallet, AccountKind::PassThroughWallet)? {
        return Ok(());
    }
    ctx.ensure_holder(&ev.owner)?;
    ctx.store.save(&PassThroughWallet {
        id: ev.wallet.clone(),
        owner: ev.owner.clone(),
        paused: ev.paused,
        pass_through: ev.pass_through.clone(),
    })?;
    Ok(())
}

pub(super) fn pass_through_wallet_updated(
    ctx: &mut HandlerContext<'_>,
    ev: &PassThroughWalletUpdated,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.wallet, AccountKind::PassThroughWallet)? {
        return Ok(());
    }
    let mut wallet: PassThroughWallet =
        ctx.load_required(ev.wallet.as_str(), "passThroughWallet")?;

    match &ev.change {
        WalletChange::PassThrough(target) => {
            let previous = std::mem::replace(&mut wallet.pass_through, target.clone());
            if wallet.owner == ctx.config.diversifier_factory
                && previous.is_zero()
                && !target.is_zero()
            {
                tag_diversifier(ctx, &wallet.id, target)?;
            }
        }
        WalletChange::Paused(paused) => wallet.paused = *paused,
        WalletChange::Owner(owner) => {
            ctx.ensure_holder(owner)?;
            wallet.owner = owner.clone();
        }
    }
    ctx.store.save(&wallet)?;
    Ok(())
}

/// A diversifier is a pass-through wallet deployed by the diversifier
/// factory, forwarding to a split whose swapper recipients convert funds.
fn tag_diversifier(
    ctx: &mut HandlerContext<'_>,
    wallet: &Address,
    target: &Address,
) -> Result<(), IndexerError> {
    AccountResolver::set_parent(&mut ctx.store, wallet, ParentEntityType::Diversifier)?;
    if ctx.kind_of(target)? != Some(AccountKind::Split) {
        return Ok(());
    }
    AccountResolver::set_parent(&mut ctx.store, target, ParentEntityType::Diversifier)?;

    let split: Split = ctx.load_required(target.as_str(), "split")?;
    for recipient in &split.recipients {
        if ctx.kind_of(recipient)? == Some(AccountKind::Swapper) {
            AccountResolver::set_parent(&mut ctx.store, recipient, ParentEntityType::Diversifier)?;
        }
    }
    info!("Tagged {} and split {} as diversifier", wallet, target);
    Ok(())
}

pub(super) fn pass_through_funds(
    ctx: &mut HandlerContext<'_>,
    ev: &PassThroughFunds,
) -> Result<(), IndexerError> {
    if !ctx.require(&ev.wallet, AccountKind::PassThroughWallet)? {
        return Ok(());
    }
    let wallet: PassThroughWallet = ctx.load_required(ev.wallet.as_str(), "passThroughWallet")?;

    for item in &ev.tokens {
        let key = TokenRelease::key(&ev.wallet, &item.token);
        let mut release = ctx.store.load::<TokenRelease>(&key)?.unwrap_or(TokenRelease {
            wallet: ev.wallet.clone(),
            token: item.token.clone(),
            amount: Amount::ZERO,
        });
        release.amount = release.amount.checked_add(item.amount).ok_or_else(|| {
            IndexerError::Inconsistent(format!("release total overflow for {}", key))
        })?;
        ctx.store.save(&release)?;
    }

    ctx.record(
        PASS_THROUGH_FUNDS_PREFIX,
        &ev.wallet,
        FactPayload::PassThroughFunds {
            pass_through: wallet.pass_through,
            tokens: ev.tokens.clone(),
        },
    )?;
    Ok(())
}
