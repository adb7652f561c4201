pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod store;

pub use config::{Config, OrderingMode};
pub use datasource::{
    ChainReader, DataSourceError, EventSource, JsonlEventSource, MockEventSource,
    StaticChainReader, UnavailableChainReader,
};
pub use db::{init_db, Repository};
pub use domain::{
    Address, Amount, DomainEvent, EventEnvelope, EventMeta, EventOrderingKey, Ownership,
    Timestamp, TxHash,
};
pub use error::IndexerError;
pub use orchestration::{Indexer, Outcome, ReplayReport};
pub use store::{EntityStore, MemoryStore, StoreExt};
