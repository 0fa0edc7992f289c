use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Tables;

/// Primary key type shared by every table.
pub type RecordId = u64;

/// Row type stored in one of the [`Tables`].
pub trait Record: Clone + Send + Sync + 'static {
    /// Singular name used in logs and error messages.
    const KIND: &'static str;

    fn id(&self) -> RecordId;
    fn table(tables: &Tables) -> &Table<Self>;
    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;

    /// Removes or detaches rows referencing a record that was just deleted.
    fn cascade(_tables: &mut Tables, _id: RecordId) {}
}

/// Ordered rows plus the id sequence for one record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table<R> {
    rows: BTreeMap<RecordId, R>,
    next_id: RecordId,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<R: Record> Table<R> {
    /// Id the next inserted row will receive.
    pub fn next_id(&self) -> RecordId {
        self.next_id
    }

    pub fn get(&self, id: RecordId) -> Option<&R> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Inserts or replaces the row keyed by `record.id()`.
    pub fn insert(&mut self, record: R) {
        let id = record.id();
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        self.rows.insert(id, record);
    }

    pub(super) fn remove(&mut self, id: RecordId) -> Option<R> {
        self.rows.remove(&id)
    }

    pub fn ids_where<F>(&self, predicate: F) -> Vec<RecordId>
    where
        F: Fn(&R) -> bool,
    {
        self.rows
            .iter()
            .filter(|(_, row)| predicate(row))
            .map(|(id, _)| *id)
            .collect()
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut R> {
        self.rows.values_mut()
    }
}
