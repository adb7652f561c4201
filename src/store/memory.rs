//! In-memory entity store.

use super::{EntityStore, StoreError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered in-memory store; the committed state during replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    tables: BTreeMap<String, BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// Total number of rows across all tables.
    pub fn len(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of rows in one table.
    pub fn table_len(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.len()).unwrap_or(0)
    }

    /// Iterate every row as `(table, id, body)` in table then id order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.tables.iter().flat_map(|(table, rows)| {
            rows.iter()
                .map(move |(id, value)| (table.as_str(), id.as_str(), value))
        })
    }
}

impl EntityStore for MemoryStore {
    fn get_raw(&self, table: &str, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.tables.get(table).and_then(|t| t.get(id)).cloned())
    }

    fn ids_with_prefix(&self, table: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let Some(rows) = self.tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .range(prefix.to_string()..)
            .take_while(|(id, _)| id.starts_with(prefix))
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn put_raw(&mut self, table: &str, id: &str, value: Value) -> Result<(), StoreError> {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    fn delete_raw(&mut self, table: &str, id: &str) -> Result<(), StoreError> {
        if let Some(rows) = self.tables.get_mut(table) {
            rows.remove(id);
            if rows.is_empty() {
                self.tables.remove(table);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_get_delete() {
        let mut store = MemoryStore::new();
        store.put_raw("accounts", "0x1", json!({"kind": "holder"})).unwrap();
        assert_eq!(
            store.get_raw("accounts", "0x1").unwrap(),
            Some(json!({"kind": "holder"}))
        );
        assert_eq!(store.len(), 1);

        store.delete_raw("accounts", "0x1").unwrap();
        assert!(store.get_raw("accounts", "0x1").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut store = MemoryStore::new();
        store.delete_raw("accounts", "nope").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_prefix_scan_is_bounded() {
        let mut store = MemoryStore::new();
        for id in ["0xa-1", "0xa-2", "0xab-1", "0xb-1"] {
            store.put_raw("holders", id, json!(null)).unwrap();
        }
        let ids = store.ids_with_prefix("holders", "0xa-").unwrap();
        assert_eq!(ids, vec!["0xa-1".to_string(), "0xa-2".to_string()]);
        assert!(store.ids_with_prefix("missing", "x").unwrap().is_empty());
    }

    #[test]
    fn test_rows_iteration_order() {
        let mut store = MemoryStore::new();
        store.put_raw("b", "2", json!(2)).unwrap();
        store.put_raw("a", "1", json!(1)).unwrap();
        let rows: Vec<_> = store.rows().map(|(t, id, _)| (t, id)).collect();
        assert_eq!(rows, vec![("a", "1"), ("b", "2")]);
        assert_eq!(store.table_len("a"), 1);
    }
}
