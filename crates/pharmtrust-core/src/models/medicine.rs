//! Medicine batch records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::LedgerId;

/// One manufactured lot and the unit assets issued from it.
///
/// Field names on disk follow the deployed `artifacts.json` layout;
/// `batch_asa_id` and `unit_nfts` must never be renamed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineBatch {
    /// Derived key; lives in the document map, not in the record
    #[serde(skip)]
    pub medicine_id: String,
    /// Medicine name as registered
    pub medicine_name: String,
    /// Manufacturer batch number
    #[serde(rename = "batch_no")]
    pub batch_number: String,
    /// Batch asset; assigned once at registration
    #[serde(rename = "batch_asa_id")]
    pub batch_asset_id: LedgerId,
    /// Supply of the batch asset
    pub total_units: u64,
    /// Expiry, `YYYY-MM` or `YYYY-MM-DD`
    pub expiry_date: String,
    /// Registration timestamp (RFC 3339)
    #[serde(rename = "created_date")]
    pub created_at: String,
    /// Unit serial -> unit asset
    #[serde(rename = "unit_nfts", default)]
    pub unit_assets: BTreeMap<String, LedgerId>,
    /// Fields written by other versions, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MedicineBatch {
    /// Number of unit assets issued so far.
    pub fn issued_units(&self) -> usize {
        self.unit_assets.len()
    }

    /// Unit asset issued under `serial`, if any.
    pub fn unit_asset(&self, serial: &str) -> Option<&LedgerId> {
        self.unit_assets.get(serial)
    }

    /// Serial under which `unit_asset_id` was issued.
    pub fn serial_of(&self, unit_asset_id: &str) -> Option<&str> {
        self.unit_assets
            .iter()
            .find(|(_, id)| id.matches(unit_asset_id))
            .map(|(serial, _)| serial.as_str())
    }
}

/// Request to register a new batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBatch {
    pub medicine_name: String,
    pub batch_number: String,
    pub total_units: u64,
    pub expiry_date: String,
}

impl NewBatch {
    pub fn new(
        medicine_name: impl Into<String>,
        batch_number: impl Into<String>,
        total_units: u64,
        expiry_date: impl Into<String>,
    ) -> Self {
        Self {
            medicine_name: medicine_name.into(),
            batch_number: batch_number.into(),
            total_units,
            expiry_date: expiry_date.into(),
        }
    }

    /// Check required fields before anything touches the ledger.
    pub fn validate(&self) -> Result<(), String> {
        if self.medicine_name.trim().is_empty() {
            return Err("medicine_name is required".into());
        }
        if self.batch_number.trim().is_empty() {
            return Err("batch_no is required".into());
        }
        if self.total_units == 0 {
            return Err("total_units must be positive".into());
        }
        if !is_valid_expiry(&self.expiry_date) {
            return Err(format!(
                "expiry_date '{}' must be YYYY-MM or YYYY-MM-DD",
                self.expiry_date
            ));
        }
        Ok(())
    }
}

/// Accept `YYYY-MM` or a full `YYYY-MM-DD` date.
pub fn is_valid_expiry(expiry: &str) -> bool {
    match expiry.len() {
        7 => NaiveDate::parse_from_str(&format!("{}-01", expiry), "%Y-%m-%d").is_ok(),
        10 => NaiveDate::parse_from_str(expiry, "%Y-%m-%d").is_ok(),
        _ => false,
    }
}
