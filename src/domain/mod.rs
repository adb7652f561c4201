//! Domain types for the Splits protocol indexer.
//!
//! This module provides:
//! - Primitives: Address, TxHash, Timestamp, 256-bit Amount, ppm Ownership
//! - Account entities and the decoded event model
//! - Raw log decoding for swap tracing
//! - Canonical event ordering for deterministic replay

pub mod account;
pub mod amount;
pub mod audit;
pub mod event;
pub mod ledger;
pub mod log;
pub mod ordering;
pub mod ownership;
pub mod primitives;

pub use account::{
    Account, AccountKind, LiquidSplit, LiquidSplitHolder, OwnershipModel, PairOverride,
    ParentEntityType, PassThroughWallet, Recipient, RecipientShare, Split, Swapper, TokenRelease,
    VestingModule, VestingStream, WaterfallModule, WaterfallTranche,
};
pub use amount::{Amount, AmountParseError};
pub use audit::{
    AuditFact, ControlAction, FactPayload, SetAction, TrancheFill, TransferType, VestingAction,
};
pub use event::{
    ControlTransferCancelled, ControlTransferInitiated, ControlTransferred, DomainEvent,
    EventEnvelope, EventMeta, FlashQuote, FundsDistributed, LiquidSplitCreated,
    LiquidSplitFactoryCreated, LiquidSplitHolderTransfer, Origin, OwnerExecCalls,
    PassThroughFunds, PassThroughWalletCreated, PassThroughWalletUpdated, RecoupCreated,
    SplitCreated, SplitUpdated, SubCall, SwapperChange, SwapperCreated, SwapperFlash,
    SwapperUpdated, TokenAmount, VestingFundsReleased, VestingModuleCreated,
    VestingStreamCreated, WalletChange, WaterfallCreated, WaterfallFunded, Withdrawal,
};
pub use ledger::{LedgerEntry, SwapBalance};
pub use log::{RawLog, TracedLog};
pub use ordering::{sort_events_deterministic, EventOrderingKey};
pub use ownership::{Ownership, FIXED_SUPPLY, PERCENTAGE_SCALE};
pub use primitives::{Address, AddressParseError, Timestamp, TxHash};
