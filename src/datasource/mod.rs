//! Sources of decoded protocol events, plus the point-in-time chain reader.

use crate::domain::EventEnvelope;
use async_trait::async_trait;
use std::fmt;

pub mod chain;
pub mod jsonl;
pub mod mock;

pub use chain::{
    ChainReadError, ChainReader, LiquidSplitConfig, StaticChainReader, UnavailableChainReader,
};
pub use jsonl::JsonlEventSource;
pub use mock::MockEventSource;

/// Event source trait for fetching decoded events.
///
/// Implementations return events in delivery order; the indexer decides
/// whether to sort them.
#[async_trait]
pub trait EventSource: Send + Sync + fmt::Debug {
    /// Fetch every event at or after `from_block`.
    async fn fetch_events(&self, from_block: u64) -> Result<Vec<EventEnvelope>, DataSourceError>;
}

/// Error type for event source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// The underlying file or stream could not be read
    Io(String),
    /// A record could not be decoded
    ParseError { line: usize, message: String },
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::Io(msg) => write!(f, "IO error: {}", msg),
            DataSourceError::ParseError { line, message } => {
                write!(f, "Parse error on line {}: {}", line, message)
            }
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}

impl From<std::io::Error> for DataSourceError {
    fn from(err: std::io::Error) -> Self {
        DataSourceError::Io(err.to_string())
    }
}
