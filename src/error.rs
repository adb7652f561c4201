use crate::domain::{AccountKind, EventOrderingKey};
use crate::store::StoreError;
use thiserror::Error;

/// Fatal error while applying one event. The event's staged writes are discarded.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("missing {kind} entity: {id}")]
    MissingEntity { kind: &'static str, id: String },
    #[error("recipient cycle detected at {0}")]
    CycleDetected(String),
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("event {key} is not after watermark {watermark}")]
    OutOfOrder {
        key: EventOrderingKey,
        watermark: EventOrderingKey,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IndexerError {
    pub fn missing(kind: AccountKind, id: impl ToString) -> Self {
        IndexerError::MissingEntity {
            kind: kind.as_str(),
            id: id.to_string(),
        }
    }

    pub fn missing_row(kind: &'static str, id: impl ToString) -> Self {
        IndexerError::MissingEntity {
            kind,
            id: id.to_string(),
        }
    }
}
