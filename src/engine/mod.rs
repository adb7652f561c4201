//! Pure computation engines for deterministic ledger logic.
//!
//! Engines never touch the event stream; they read and write an
//! [`EntityStore`](crate::store::EntityStore) handed to them by the indexer.

pub mod distribution;
pub mod graph;
pub mod ledger;
pub mod liquid_split;
pub mod resolver;
pub mod swap_tracer;
pub mod waterfall;

pub use distribution::{compute_distribution, Credit, DistributionPlan};
pub use graph::downstream;
pub use ledger::Ledger;
pub use liquid_split::{factory_ownership_delta, OwnershipTracker};
pub use resolver::{AccountResolver, Creation, KindCheck};
pub use swap_tracer::{flash_legs, trace, PendingState, SwapLeg, TraceContext, TraceReport};
pub use waterfall::{build_tranches, fill_tranches};
