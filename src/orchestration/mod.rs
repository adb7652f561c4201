mod handlers;
pub mod indexer;

pub use indexer::{Indexer, Outcome, ReplayReport};
