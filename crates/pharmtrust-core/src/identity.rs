//! Deterministic identifiers and ledger labels.
//!
//! Medicine ids are the uniqueness key of the store and must be reproducible:
//! the same name, batch number and calendar day always give the same id.
//! Asset labels are advisory; two batches may share a short code.

use chrono::NaiveDate;
use pharmtrust_ledger::{MAX_ASSET_NAME_LEN, MAX_UNIT_NAME_LEN, MAX_URL_LEN};

/// Characters of the medicine name used in short codes.
const NAME_PREFIX_LEN: usize = 3;
/// Trailing characters of the batch number used in batch short codes.
const BATCH_SUFFIX_LEN: usize = 5;

/// Short code and display name for a ledger asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLabel {
    /// At most 8 bytes
    pub unit_name: String,
    /// At most 32 bytes
    pub asset_name: String,
}

/// `"{name}_{batch}_{YYYYMMDD}"`.
pub fn derive_medicine_id(medicine_name: &str, batch_number: &str, date: NaiveDate) -> String {
    format!(
        "{}_{}_{}",
        medicine_name,
        batch_number,
        date.format("%Y%m%d")
    )
}

/// Label for a batch asset, e.g. `AMO50916` / `Amoxy 500Batch-B2025-09-16`.
pub fn batch_label(medicine_name: &str, batch_number: &str) -> AssetLabel {
    let compact: Vec<char> = batch_number.chars().filter(|c| *c != '-').collect();
    let suffix: String = compact[compact.len().saturating_sub(BATCH_SUFFIX_LEN)..]
        .iter()
        .collect();

    AssetLabel {
        unit_name: truncate_bytes(
            &format!("{}{}", name_prefix(medicine_name), suffix),
            MAX_UNIT_NAME_LEN,
        ),
        asset_name: truncate_bytes(
            &format!("{}Batch-{}", medicine_name, batch_number),
            MAX_ASSET_NAME_LEN,
        ),
    }
}

/// Label for a unit asset, e.g. `AMOUU001` / `Amoxy 500 Unit #U001`.
pub fn unit_label(medicine_name: &str, unit_serial: &str) -> AssetLabel {
    AssetLabel {
        unit_name: truncate_bytes(
            &format!("{}U{}", name_prefix(medicine_name), unit_serial),
            MAX_UNIT_NAME_LEN,
        ),
        asset_name: truncate_bytes(
            &format!("{} Unit #{}", medicine_name, unit_serial),
            MAX_ASSET_NAME_LEN,
        ),
    }
}

/// Random serial for callers that do not supply one: `U` + 8 hex chars.
pub fn generate_unit_serial() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("U{}", &uuid[..8])
}

/// The serial a unit is recorded under: `requested` trimmed, or a generated
/// one when it is missing or blank.
pub fn resolve_unit_serial(requested: Option<&str>) -> String {
    requested
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_unit_serial)
}

/// Metadata location of a batch asset; `None` if it would not fit on the ledger.
pub fn batch_metadata_url(base_url: &str, medicine_id: &str) -> Option<String> {
    fit_url(format!(
        "{}/batch_{}.json",
        base_url.trim_end_matches('/'),
        medicine_id
    ))
}

/// Metadata location of a unit asset; `None` if it would not fit on the ledger.
pub fn unit_metadata_url(base_url: &str, medicine_id: &str, unit_serial: &str) -> Option<String> {
    fit_url(format!(
        "{}/unit_{}_{}.json#arc3",
        base_url.trim_end_matches('/'),
        medicine_id,
        unit_serial
    ))
}

fn fit_url(url: String) -> Option<String> {
    (url.len() <= MAX_URL_LEN).then_some(url)
}

fn name_prefix(medicine_name: &str) -> String {
    medicine_name
        .chars()
        .filter(|c| *c != ' ')
        .take(NAME_PREFIX_LEN)
        .collect::<String>()
        .to_uppercase()
}

/// Cut `s` to at most `max` bytes without splitting a character.
fn truncate_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
