//! Entity store abstraction.
//!
//! Entities are JSON documents addressed by `(table, id)`. Two implementations:
//! - `MemoryStore`: ordered in-memory map, the committed state
//! - `StagedStore`: write overlay used to apply one event atomically

mod memory;
mod staged;

pub use memory::MemoryStore;
pub use staged::StagedStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode or decode {table}/{id}: {source}")]
    Codec {
        table: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store backend error: {0}")]
    Backend(String),
}

/// A typed entity persisted in one table.
pub trait Record: Serialize + DeserializeOwned {
    const TABLE: &'static str;

    fn id(&self) -> String;
}

/// Join identifier parts with `-`, the composite id convention for every table.
pub fn joint_id(parts: &[&str]) -> String {
    parts.join("-")
}

/// Trait for entity storage backends.
pub trait EntityStore {
    fn get_raw(&self, table: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Ids in `table` starting with `prefix`, in ascending order.
    fn ids_with_prefix(&self, table: &str, prefix: &str) -> Result<Vec<String>, StoreError>;

    fn put_raw(&mut self, table: &str, id: &str, value: Value) -> Result<(), StoreError>;

    fn delete_raw(&mut self, table: &str, id: &str) -> Result<(), StoreError>;

    /// Apply a batch of writes. Backends that can fail midway must make this atomic.
    fn write_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        for op in batch.operations {
            match op {
                BatchOp::Put { table, id, value } => self.put_raw(&table, &id, value)?,
                BatchOp::Delete { table, id } => self.delete_raw(&table, &id)?,
            }
        }
        Ok(())
    }
}

/// Typed helpers over any [`EntityStore`].
pub trait StoreExt: EntityStore {
    fn load<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError> {
        match self.get_raw(T::TABLE, id)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Codec {
                    table: T::TABLE.to_string(),
                    id: id.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn save<T: Record>(&mut self, record: &T) -> Result<(), StoreError> {
        let id = record.id();
        let value = serde_json::to_value(record).map_err(|source| StoreError::Codec {
            table: T::TABLE.to_string(),
            id: id.clone(),
            source,
        })?;
        self.put_raw(T::TABLE, &id, value)
    }

    fn remove<T: Record>(&mut self, id: &str) -> Result<(), StoreError> {
        self.delete_raw(T::TABLE, id)
    }

    /// Load every record whose id starts with `prefix`.
    fn load_prefixed<T: Record>(&self, prefix: &str) -> Result<Vec<T>, StoreError> {
        let mut records = Vec::new();
        for id in self.ids_with_prefix(T::TABLE, prefix)? {
            if let Some(record) = self.load::<T>(&id)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

impl<S: EntityStore + ?Sized> StoreExt for S {}

/// A batch of write operations to be applied together.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    pub operations: Vec<BatchOp>,
}

#[derive(Clone, Debug)]
pub enum BatchOp {
    Put {
        table: String,
        id: String,
        value: Value,
    },
    Delete {
        table: String,
        id: String,
    },
}

impl WriteBatch {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    pub fn put(&mut self, table: impl Into<String>, id: impl Into<String>, value: Value) {
        self.operations.push(BatchOp::Put {
            table: table.into(),
            id: id.into(),
            value,
        });
    }

    pub fn delete(&mut self, table: impl Into<String>, id: impl Into<String>) {
        self.operations.push(BatchOp::Delete {
            table: table.into(),
            id: id.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}
