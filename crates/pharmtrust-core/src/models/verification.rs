//! Verification results.

use serde::{Deserialize, Serialize};

use super::MedicineBatch;

/// Provenance reconstructed from a single unit asset id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationRecord {
    pub medicine_id: String,
    pub medicine_name: String,
    #[serde(rename = "batch_no")]
    pub batch_number: String,
    pub unit_serial: String,
    pub unit_asset_id: String,
    pub batch_asset_id: String,
    pub expiry_date: String,
    #[serde(rename = "created_date")]
    pub created_at: String,
    /// A match in the ledger-confirmed store is the authenticity proof
    pub authentic: bool,
}

impl VerificationRecord {
    /// Build the record for `serial` of `batch`.
    pub fn from_match(batch: &MedicineBatch, serial: &str, unit_asset_id: &str) -> Self {
        Self {
            medicine_id: batch.medicine_id.clone(),
            medicine_name: batch.medicine_name.clone(),
            batch_number: batch.batch_number.clone(),
            unit_serial: serial.to_string(),
            unit_asset_id: unit_asset_id.trim().to_string(),
            batch_asset_id: batch.batch_asset_id.canonical(),
            expiry_date: batch.expiry_date.clone(),
            created_at: batch.created_at.clone(),
            authentic: true,
        }
    }
}

/// One line of the operator inventory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryLine {
    pub medicine_id: String,
    pub medicine_name: String,
    #[serde(rename = "batch_no")]
    pub batch_number: String,
    pub batch_asset_id: String,
    pub total_units: u64,
    pub expiry_date: String,
    pub issued_units: usize,
}

impl From<&MedicineBatch> for InventoryLine {
    fn from(batch: &MedicineBatch) -> Self {
        Self {
            medicine_id: batch.medicine_id.clone(),
            medicine_name: batch.medicine_name.clone(),
            batch_number: batch.batch_number.clone(),
            batch_asset_id: batch.batch_asset_id.canonical(),
            total_units: batch.total_units,
            expiry_date: batch.expiry_date.clone(),
            issued_units: batch.issued_units(),
        }
    }
}
