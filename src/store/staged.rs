//! Write overlay for applying one event atomically.
//!
//! Reads fall through to the committed store unless the key was written or
//! deleted in this stage. Nothing reaches the committed store until the
//! caller turns the stage into a [`WriteBatch`] and applies it.

use super::{EntityStore, StoreError, WriteBatch};
use serde_json::Value;
use std::collections::BTreeMap;

type Key = (String, String);

pub struct StagedStore<'a> {
    base: &'a dyn EntityStore,
    /// `None` marks a staged delete.
    pending: BTreeMap<Key, Option<Value>>,
}

impl<'a> StagedStore<'a> {
    pub fn new(base: &'a dyn EntityStore) -> Self {
        Self {
            base,
            pending: BTreeMap::new(),
        }
    }

    /// Number of staged writes and deletes.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Consume the stage, producing the writes in key order.
    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for ((table, id), value) in self.pending {
            match value {
                Some(value) => batch.put(table, id, value),
                None => batch.delete(table, id),
            }
        }
        batch
    }
}

impl EntityStore for StagedStore<'_> {
    fn get_raw(&self, table: &str, id: &str) -> Result<Option<Value>, StoreError> {
        match self.pending.get(&(table.to_string(), id.to_string())) {
            Some(staged) => Ok(staged.clone()),
            None => self.base.get_raw(table, id),
        }
    }

    fn ids_with_prefix(&self, table: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self
            .base
            .ids_with_prefix(table, prefix)?
            .into_iter()
            .filter(|id| {
                !matches!(
                    self.pending.get(&(table.to_string(), id.clone())),
                    Some(None)
                )
            })
            .collect();
        for ((t, id), value) in &self.pending {
            if t == table && id.starts_with(prefix) && value.is_some() && !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn put_raw(&mut self, table: &str, id: &str, value: Value) -> Result<(), StoreError> {
        self.pending
            .insert((table.to_string(), id.to_string()), Some(value));
        Ok(())
    }

    fn delete_raw(&mut self, table: &str, id: &str) -> Result<(), StoreError> {
        self.pending.insert((table.to_string(), id.to_string()), None);
        Ok(())
    }
}
