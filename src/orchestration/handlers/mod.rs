//! Per-event handlers. Each one runs against a staged store and either
//! completes or returns an error; the indexer commits only on success.

use crate::config::Config;
use crate::datasource::ChainReader;
use crate::domain::{AccountKind, Address, AuditFact, DomainEvent, EventMeta, FactPayload};
use crate::engine::{AccountResolver, KindCheck};
use crate::error::IndexerError;
use crate::store::{Record, StagedStore, StoreExt};

mod modules;
mod splits;
mod swaps;

pub(crate) struct HandlerContext<'a> {
    pub store: StagedStore<'a>,
    pub meta: &'a EventMeta,
    pub reader: &'a dyn ChainReader,
    pub config: &'a Config,
    pub swap_legs: usize,
    pub dropped_legs: usize,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        store: StagedStore<'a>,
        meta: &'a EventMeta,
        reader: &'a dyn ChainReader,
        config: &'a Config,
    ) -> Self {
        Self {
            store,
            meta,
            reader,
            config,
            swap_legs: 0,
            dropped_legs: 0,
        }
    }

    /// Register a new structured account. `false` means the id was taken
    /// and the handler should stop.
    pub fn create(&mut self, id: &Address, kind: AccountKind) -> Result<bool, IndexerError> {
        Ok(AccountResolver::create_if_absent(&mut self.store, id, kind, self.meta)?.is_created())
    }

    /// Make sure `id` has an account. The zero address never gets one.
    pub fn ensure_holder(&mut self, id: &Address) -> Result<(), IndexerError> {
        if !id.is_zero() {
            AccountResolver::ensure_holder(&mut self.store, id, self.meta)?;
        }
        Ok(())
    }

    /// `true` if `id` is a `kind`. A different kind is a benign skip; an
    /// unknown id is fatal.
    pub fn require(&self, id: &Address, kind: AccountKind) -> Result<bool, IndexerError> {
        Ok(AccountResolver::require(&self.store, id, kind)? == KindCheck::Matches)
    }

    pub fn kind_of(&self, id: &Address) -> Result<Option<AccountKind>, IndexerError> {
        Ok(AccountResolver::resolve(&self.store, id)?)
    }

    pub fn load_required<T: Record>(&self, id: &str, kind: &'static str) -> Result<T, IndexerError> {
        self.store
            .load::<T>(id)?
            .ok_or_else(|| IndexerError::missing_row(kind, id))
    }

    /// Write an audit fact with id `<prefix>-<txHash>-<logIndex>`.
    pub fn record(
        &mut self,
        prefix: &str,
        account: &Address,
        payload: FactPayload,
    ) -> Result<String, IndexerError> {
        let id = self.meta.record_id(prefix);
        self.record_with_id(id.clone(), account, payload)?;
        Ok(id)
    }

    pub fn record_with_id(
        &mut self,
        id: String,
        account: &Address,
        payload: FactPayload,
    ) -> Result<(), IndexerError> {
        self.store
            .save(&AuditFact::new(self.meta, id, account, payload))?;
        Ok(())
    }
}

/// Account whose activity timestamp an event advances.
fn subject(event: &DomainEvent) -> &Address {
    match event {
        DomainEvent::SplitCreated(e) => &e.split,
        DomainEvent::SplitUpdated(e) => &e.split,
        DomainEvent::ControlTransferInitiated(e) => &e.split,
        DomainEvent::ControlTransferCancelled(e) => &e.split,
        DomainEvent::ControlTransferred(e) => &e.split,
        DomainEvent::FundsDistributed(e) => &e.split,
        DomainEvent::Withdrawal(e) => &e.account,
        DomainEvent::WaterfallCreated(e) => &e.waterfall,
        DomainEvent::WaterfallFunded(e) => &e.waterfall,
        DomainEvent::RecoupCreated(e) => &e.waterfall,
        DomainEvent::VestingModuleCreated(e) => &e.module,
        DomainEvent::VestingStreamCreated(e) => &e.module,
        DomainEvent::VestingFundsReleased(e) => &e.module,
        DomainEvent::LiquidSplitCreated(e) => &e.liquid_split,
        DomainEvent::LiquidSplitFactoryCreated(e) => &e.liquid_split,
        DomainEvent::LiquidSplitHolderTransfer(e) => &e.liquid_split,
        DomainEvent::SwapperCreated(e) => &e.swapper,
        DomainEvent::SwapperUpdated(e) => &e.swapper,
        DomainEvent::SwapperFlash(e) => &e.swapper,
        DomainEvent::PassThroughWalletCreated(e) => &e.wallet,
        DomainEvent::PassThroughWalletUpdated(e) => &e.wallet,
        DomainEvent::PassThroughFunds(e) => &e.wallet,
        DomainEvent::OwnerExecCalls(e) => &e.account,
    }
}

pub(crate) fn dispatch(ctx: &mut HandlerContext<'_>, event: &DomainEvent) -> Result<(), IndexerError> {
    match event {
        DomainEvent::SplitCreated(e) => splits::split_created(ctx, e)?,
        DomainEvent::SplitUpdated(e) => splits::split_updated(ctx, e)?,
        DomainEvent::ControlTransferInitiated(e) => splits::control_transfer_initiated(ctx, e)?,
        DomainEvent::ControlTransferCancelled(e) => splits::control_transfer_cancelled(ctx, e)?,
        DomainEvent::ControlTransferred(e) => splits::control_transferred(ctx, e)?,
        DomainEvent::FundsDistributed(e) => splits::funds_distributed(ctx, e)?,
        DomainEvent::Withdrawal(e) => splits::withdrawal(ctx, e)?,
        DomainEvent::WaterfallCreated(e) => modules::waterfall_created(ctx, e)?,
        DomainEvent::WaterfallFunded(e) => modules::waterfall_funded(ctx, e)?,
        DomainEvent::RecoupCreated(e) => modules::recoup_created(ctx, e)?,
        DomainEvent::VestingModuleCreated(e) => modules::vesting_module_created(ctx, e)?,
        DomainEvent::VestingStreamCreated(e) => modules::vesting_stream_created(ctx, e)?,
        DomainEvent::VestingFundsReleased(e) => modules::vesting_funds_released(ctx, e)?,
        DomainEvent::LiquidSplitCreated(e) => modules::liquid_split_created(ctx, e)?,
        DomainEvent::LiquidSplitFactoryCreated(e) => modules::liquid_split_factory_created(ctx, e)?,
        DomainEvent::LiquidSplitHolderTransfer(e) => modules::liquid_split_holder_transfer(ctx, e)?,
        DomainEvent::SwapperCreated(e) => swaps::swapper_created(ctx, e)?,
        DomainEvent::SwapperUpdated(e) => swaps::swapper_updated(ctx, e)?,
        DomainEvent::SwapperFlash(e) => swaps::swapper_flash(ctx, e)?,
        DomainEvent::PassThroughWalletCreated(e) => modules::pass_through_wallet_created(ctx, e)?,
        DomainEvent::PassThroughWalletUpdated(e) => modules::pass_through_wallet_updated(ctx, e)?,
        DomainEvent::PassThroughFunds(e) => modules::pass_through_funds(ctx, e)?,
        DomainEvent::OwnerExecCalls(e) => swaps::owner_exec_calls(ctx, e)?,
    }
    AccountResolver::touch(&mut ctx.store, subject(event), ctx.meta)?;
    Ok(())
}
