use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::MasteryRecord;

/// One mastery record per item id. An absent entry means "never reviewed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordStore {
    records: HashMap<String, MasteryRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item_id: &str) -> Option<MasteryRecord> {
        self.records.get(item_id).copied()
    }

    pub fn put(&mut self, item_id: &str, record: MasteryRecord) {
        self.records.insert(item_id.to_string(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MasteryRecord)> {
        self.records.iter().map(|(id, rec)| (id.as_str(), rec))
    }

    /// Full state reset; the only way records are ever removed.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl FromIterator<(String, MasteryRecord)> for RecordStore {
    fn from_iter<T: IntoIterator<Item = (String, MasteryRecord)>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
