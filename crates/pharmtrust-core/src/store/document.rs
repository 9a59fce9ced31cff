//! The artifact document: every medicine and its unit assets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::MedicineBatch;

/// Whole persisted state.
///
/// Units nest inside their medicine, so a unit can never outlive (or exist
/// without) its batch record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// medicine_id -> batch record
    #[serde(default)]
    pub medicines: BTreeMap<String, MedicineBatch>,
    /// Other top-level keys (e.g. written by bootstrap scripts), kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Document {
    /// Empty `{"medicines": {}}` document.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a document and attach each record's key as its `medicine_id`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut document: Document = serde_json::from_str(json)?;
        for (id, batch) in document.medicines.iter_mut() {
            batch.medicine_id = id.clone();
        }
        Ok(document)
    }

    /// Pretty JSON, as written to disk.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn get(&self, medicine_id: &str) -> Option<&MedicineBatch> {
        self.medicines.get(medicine_id)
    }

    pub fn contains(&self, medicine_id: &str) -> bool {
        self.medicines.contains_key(medicine_id)
    }

    /// Insert a record under its `medicine_id`. Returns false (and leaves the
    /// document untouched) if the id is taken.
    pub fn insert_new(&mut self, batch: MedicineBatch) -> bool {
        if self.medicines.contains_key(&batch.medicine_id) {
            return false;
        }
        self.medicines.insert(batch.medicine_id.clone(), batch);
        true
    }

    /// Iterate records in `medicine_id` order.
    pub fn iter(&self) -> impl Iterator<Item = &MedicineBatch> {
        self.medicines.values()
    }

    /// Total unit assets across all medicines.
    pub fn unit_count(&self) -> usize {
        self.medicines.values().map(|m| m.issued_units()).sum()
    }

    /// Highest native asset index recorded anywhere in the document.
    pub fn max_asset_index(&self) -> Option<u64> {
        self.medicines
            .values()
            .flat_map(|m| {
                std::iter::once(&m.batch_asset_id).chain(m.unit_assets.values())
            })
            .filter_map(|id| id.as_asset_index())
            .max()
    }
}
