//! Payloads handed to an external QR encoder.

use serde::{Deserialize, Serialize};

/// Printed on a unit's label when it is issued.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitQrPayload {
    pub medicine_id: String,
    pub unit_nft_id: String,
    pub unit_serial: String,
    pub timestamp: String,
}

impl UnitQrPayload {
    pub fn new(medicine_id: &str, unit_asset_id: &str, unit_serial: &str) -> Self {
        Self {
            medicine_id: medicine_id.to_string(),
            unit_nft_id: unit_asset_id.to_string(),
            unit_serial: unit_serial.to_string(),
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Points a scanner at the verification page for a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationLink {
    pub unit_nft_id: String,
    pub verification_url: String,
    pub timestamp: String,
}

impl VerificationLink {
    pub fn new(unit_asset_id: &str) -> Self {
        let unit_asset_id = unit_asset_id.trim();
        Self {
            unit_nft_id: unit_asset_id.to_string(),
            verification_url: format!("/verify/{}", unit_asset_id),
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_payload_fields() {
        let payload = UnitQrPayload::new("Amoxy 500_B1_20250916", "1001", "U001");
        let value: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        assert_eq!(value["medicine_id"], "Amoxy 500_B1_20250916");
        assert_eq!(value["unit_nft_id"], "1001");
        assert_eq!(value["unit_serial"], "U001");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_verification_link() {
        let link = VerificationLink::new(" 1001 ");
        assert_eq!(link.verification_url, "/verify/1001");
        assert_eq!(link.unit_nft_id, "1001");
    }
}
