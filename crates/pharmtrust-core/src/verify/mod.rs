//! Verification: from a unit asset id back to its medicine and batch.
//!
//! [`VerificationResolver`] scans the document linearly and is the reference
//! behavior. [`UnitIndex`] is the registry's shortcut for the same question;
//! both return the first match in `medicine_id` order.

mod payload;

pub use payload::*;

use std::collections::HashMap;

use crate::models::VerificationRecord;
use crate::store::Document;

/// Linear-scan resolver over a document snapshot.
pub struct VerificationResolver<'a> {
    document: &'a Document,
}

impl<'a> VerificationResolver<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Provenance of `unit_asset_id`, or `None` if no medicine issued it.
    pub fn resolve(&self, unit_asset_id: &str) -> Option<VerificationRecord> {
        for batch in self.document.iter() {
            if let Some(serial) = batch.serial_of(unit_asset_id) {
                return Some(VerificationRecord::from_match(batch, serial, unit_asset_id));
            }
        }
        None
    }
}

/// Where a unit asset was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLocation {
    pub medicine_id: String,
    pub unit_serial: String,
}

/// Secondary index: canonical unit asset id -> location.
#[derive(Debug, Clone, Default)]
pub struct UnitIndex {
    entries: HashMap<String, UnitLocation>,
}

impl UnitIndex {
    /// Index every unit in `document`; on duplicate ids the first one wins.
    pub fn build(document: &Document) -> Self {
        let mut index = Self::default();
        for batch in document.iter() {
            for (serial, asset_id) in &batch.unit_assets {
                index.insert_if_absent(&asset_id.canonical(), &batch.medicine_id, serial);
            }
        }
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, unit_asset_id: &str) -> Option<&UnitLocation> {
        self.entries.get(unit_asset_id.trim())
    }

    /// Record a freshly issued unit.
    pub fn insert(&mut self, unit_asset_id: &str, medicine_id: &str, unit_serial: &str) {
        self.entries.insert(
            unit_asset_id.to_string(),
            UnitLocation {
                medicine_id: medicine_id.to_string(),
                unit_serial: unit_serial.to_string(),
            },
        );
    }

    /// Resolve through the index against `document`.
    pub fn resolve(&self, document: &Document, unit_asset_id: &str) -> Option<VerificationRecord> {
        let location = self.get(unit_asset_id)?;
        let batch = document.get(&location.medicine_id)?;
        Some(VerificationRecord::from_match(
            batch,
            &location.unit_serial,
            unit_asset_id,
        ))
    }

    fn insert_if_absent(&mut self, unit_asset_id: &str, medicine_id: &str, unit_serial: &str) {
        if !self.entries.contains_key(unit_asset_id) {
            self.insert(unit_asset_id, medicine_id, unit_serial);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
      "medicines": {
        "Amoxy 500_B1_20250916": {
          "medicine_name": "Amoxy 500", "batch_no": "B1", "batch_asa_id": 1000,
          "total_units": 10, "expiry_date": "2027-08", "created_date": "2025-09-16T10:00:00",
          "unit_nfts": {"U001": 1001, "U002": "1002"}
        },
        "Para 650_B7_20250917": {
          "medicine_name": "Para 650", "batch_no": "B7", "batch_asa_id": 2000,
          "total_units": 5, "expiry_date": "2026-01", "created_date": "2025-09-17T09:00:00",
          "unit_nfts": {"U001": 2001}
        }
      }
    }"#;

    #[test]
    fn test_resolve_numeric_id() {
        let doc = Document::from_json(DOCUMENT).unwrap();
        let record = VerificationResolver::new(&doc).resolve("2001").unwrap();
        assert_eq!(record.medicine_name, "Para 650");
        assert_eq!(record.batch_number, "B7");
        assert_eq!(record.unit_serial, "U001");
        assert_eq!(record.batch_asset_id, "2000");
        assert!(record.authentic);
    }

    #[test]
    fn test_resolve_string_stored_id() {
        let doc = Document::from_json(DOCUMENT).unwrap();
        let record = VerificationResolver::new(&doc).resolve("1002").unwrap();
        assert_eq!(record.unit_serial, "U002");
        assert_eq!(record.medicine_id, "Amoxy 500_B1_20250916");
    }

    #[test]
    fn test_same_serial_in_two_batches_resolves_by_asset() {
        let doc = Document::from_json(DOCUMENT).unwrap();
        let resolver = VerificationResolver::new(&doc);
        assert_eq!(resolver.resolve("1001").unwrap().medicine_name, "Amoxy 500");
        assert_eq!(resolver.resolve("2001").unwrap().medicine_name, "Para 650");
    }

    #[test]
    fn test_unknown_id() {
        let doc = Document::from_json(DOCUMENT).unwrap();
        assert!(VerificationResolver::new(&doc).resolve("nonexistent-id-12345").is_none());
        assert!(VerificationResolver::new(&doc).resolve("1000").is_none());
    }

    #[test]
    fn test_index_agrees_with_scan() {
        let doc = Document::from_json(DOCUMENT).unwrap();
        let index = UnitIndex::build(&doc);
        let resolver = VerificationResolver::new(&doc);
        assert_eq!(index.len(), 3);
        for id in ["1001", "1002", "2001", "9999"] {
            assert_eq!(index.resolve(&doc, id), resolver.resolve(id), "id {}", id);
        }
    }

    #[test]
    fn test_duplicate_ids_first_match_wins() {
        let corrupted = DOCUMENT.replace("\"U001\": 2001", "\"U001\": 1001");
        let doc = Document::from_json(&corrupted).unwrap();
        let index = UnitIndex::build(&doc);

        let scanned = VerificationResolver::new(&doc).resolve("1001").unwrap();
        assert_eq!(scanned.medicine_name, "Amoxy 500");
        assert_eq!(index.resolve(&doc, "1001"), Some(scanned));
    }
}
