//! PharmTrust Core Library
//!
//! Pharmaceutical provenance on a public ledger: every manufactured batch is a
//! fungible ledger asset, every unit is a singleton asset, and a unit's asset
//! id is enough to recover its medicine and batch.
//!
//! # Architecture
//!
//! ```text
//!   CreateMedicine ──┐                       ┌── Verify(unit asset id)
//!   CreateUnit ──────┤                       │
//!                    ▼                       ▼
//!           ┌─────────────────┐     ┌──────────────────┐
//!           │ MedicineRegistry│     │ UnitIndex / scan │
//!           │  (writer lock)  │     │ (snapshot reads) │
//!           └───┬─────────┬───┘     └────────▲─────────┘
//!               │         │                  │
//!        mint + wait   save, then swap ──────┘
//!               │         │
//!               ▼         ▼
//!        ┌───────────┐ ┌─────────────────┐
//!        │AssetLedger│ │ ArtifactStore   │
//!        │ (DevNet / │ │ artifacts.json  │
//!        │  host)    │ └─────────────────┘
//!        └───────────┘
//! ```
//!
//! # Core Principle
//!
//! **Nothing is recorded before the ledger confirms it.** A failed or timed-out
//! mint leaves the stored document untouched.
//!
//! # Modules
//!
//! - [`models`]: Domain types (MedicineBatch, LedgerId, VerificationRecord)
//! - [`identity`]: Medicine ids, asset labels, serials and metadata URLs
//! - [`store`]: JSON artifact document with atomic saves
//! - [`registry`]: Batch and unit issuance
//! - [`verify`]: Unit asset id resolution and QR payloads
//! - [`config`]: TOML configuration
//! - [`logging`]: Subscriber setup for binaries

pub mod config;
pub mod identity;
pub mod logging;
pub mod models;
pub mod registry;
pub mod store;
pub mod verify;

// Re-export commonly used types
pub use config::{ConfigError, RegistryConfig, SerialPolicy};
pub use models::{InventoryLine, LedgerId, MedicineBatch, NewBatch, VerificationRecord};
pub use registry::{devnet_ledger, MedicineRegistry, RegisteredBatch, RegistryError};
pub use store::{ArtifactStore, Document, StoreError};
pub use verify::{UnitIndex, UnitQrPayload, VerificationLink, VerificationResolver};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::Arc;

use pharmtrust_ledger::{
    AccountInfo, AssetCreateParams, AssetId, AssetLedger, LedgerError, LedgerResult, ManagerRoles,
};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PharmTrustError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ledger error: {0}")]
    LedgerError(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<RegistryError> for PharmTrustError {
    fn from(e: RegistryError) -> Self {
        let message = e.to_string();
        match e {
            RegistryError::Validation(_) => PharmTrustError::InvalidInput(message),
            RegistryError::DuplicateBatch(_) | RegistryError::DuplicateSerial { .. } => {
                PharmTrustError::Duplicate(message)
            }
            RegistryError::MedicineNotFound(_) => PharmTrustError::NotFound(message),
            RegistryError::MintFailed(_) | RegistryError::Ledger(_) => {
                PharmTrustError::LedgerError(message)
            }
            RegistryError::Timeout(_) => PharmTrustError::Timeout(message),
            RegistryError::Store(_) | RegistryError::LockPoisoned => {
                PharmTrustError::StorageError(message)
            }
            RegistryError::Config(_) => PharmTrustError::ConfigError(message),
        }
    }
}

impl From<ConfigError> for PharmTrustError {
    fn from(e: ConfigError) -> Self {
        PharmTrustError::ConfigError(e.to_string())
    }
}

impl From<StoreError> for PharmTrustError {
    fn from(e: StoreError) -> Self {
        PharmTrustError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for PharmTrustError {
    fn from(e: serde_json::Error) -> Self {
        PharmTrustError::SerializationError(e.to_string())
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for PharmTrustError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        PharmTrustError::LedgerError(e.reason)
    }
}

// =========================================================================
// Host Ledger (implemented in foreign code)
// =========================================================================

/// Ledger client supplied by the embedding application.
///
/// `create_asset` must block until the asset is confirmed and return its
/// index. Report an unconfirmed transaction as `Timeout`.
#[uniffi::export(with_foreign)]
pub trait HostLedger: Send + Sync {
    fn create_asset(&self, request: FfiAssetRequest) -> Result<u64, PharmTrustError>;

    fn account_info(&self, address: String) -> Result<FfiAccountInfo, PharmTrustError>;
}

struct HostLedgerAdapter {
    host: Arc<dyn HostLedger>,
}

impl HostLedgerAdapter {
    fn map_error(e: PharmTrustError) -> LedgerError {
        match e {
            PharmTrustError::Timeout(reason) => LedgerError::HostTimeout(reason),
            PharmTrustError::InvalidInput(reason) => LedgerError::InvalidParams(reason),
            other => LedgerError::Node(other.to_string()),
        }
    }
}

impl AssetLedger for HostLedgerAdapter {
    fn create_asset(&self, params: &AssetCreateParams) -> LedgerResult<AssetId> {
        params.validate()?;
        self.host
            .create_asset(params.clone().into())
            .map_err(Self::map_error)
    }

    fn account_info(&self, address: &str) -> LedgerResult<AccountInfo> {
        self.host
            .account_info(address.to_string())
            .map(Into::into)
            .map_err(Self::map_error)
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open the registry described by a TOML config, minting through `ledger`.
#[uniffi::export]
pub fn open_registry(
    config_path: String,
    ledger: Arc<dyn HostLedger>,
) -> Result<Arc<PharmTrustCore>, PharmTrustError> {
    let config = RegistryConfig::from_file(&config_path)?;
    let ledger: Arc<dyn AssetLedger> = Arc::new(HostLedgerAdapter { host: ledger });
    Ok(Arc::new(PharmTrustCore {
        registry: MedicineRegistry::open(config, ledger)?,
    }))
}

/// Open a registry at `store_path` backed by an in-memory ledger (for testing).
#[uniffi::export]
pub fn open_devnet_registry(store_path: String) -> Result<Arc<PharmTrustCore>, PharmTrustError> {
    let config = RegistryConfig::with_store_path(&store_path);
    let ledger: Arc<dyn AssetLedger> = Arc::new(devnet_ledger(&config)?);
    Ok(Arc::new(PharmTrustCore {
        registry: MedicineRegistry::open(config, ledger)?,
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe registry wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PharmTrustCore {
    registry: MedicineRegistry<Arc<dyn AssetLedger>>,
}

#[uniffi::export]
impl PharmTrustCore {
    // =========================================================================
    // Issuance
    // =========================================================================

    /// Register a batch; omitted values come from the configured defaults.
    pub fn create_medicine(
        &self,
        medicine_name: String,
        batch_number: String,
        total_units: Option<u64>,
        expiry_date: Option<String>,
    ) -> Result<FfiBatchRegistration, PharmTrustError> {
        let defaults = &self.registry.config().defaults;
        let request = NewBatch::new(
            medicine_name,
            batch_number,
            total_units.unwrap_or(defaults.total_units),
            expiry_date.unwrap_or_else(|| defaults.expiry_date.clone()),
        );
        Ok(self.registry.register_batch(request)?.into())
    }

    /// Issue a unit; a serial is generated when none is given.
    pub fn create_unit(
        &self,
        medicine_id: String,
        unit_serial: Option<String>,
    ) -> Result<FfiUnitIssued, PharmTrustError> {
        let unit_serial = identity::resolve_unit_serial(unit_serial.as_deref());
        let unit_asset_id = self
            .registry
            .issue_unit(&medicine_id, &unit_serial)?
            .canonical();
        let qr_payload =
            UnitQrPayload::new(&medicine_id, &unit_asset_id, &unit_serial).to_json()?;

        Ok(FfiUnitIssued {
            unit_asset_id,
            unit_serial,
            qr_payload,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get a medicine by id.
    pub fn get_medicine(&self, medicine_id: String) -> Result<Option<FfiMedicine>, PharmTrustError> {
        Ok(self.registry.get_medicine(&medicine_id)?.map(Into::into))
    }

    /// All medicines, ordered by id.
    pub fn list_medicines(&self) -> Result<Vec<FfiMedicine>, PharmTrustError> {
        Ok(self
            .registry
            .list_medicines()?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Issuance counts per medicine.
    pub fn inventory(&self) -> Result<Vec<FfiInventoryLine>, PharmTrustError> {
        Ok(self
            .registry
            .inventory_summary()?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Verify a unit asset id. `None` means the unit was never issued here.
    pub fn verify(&self, unit_asset_id: String) -> Result<Option<FfiVerification>, PharmTrustError> {
        Ok(self.registry.verify(&unit_asset_id)?.map(Into::into))
    }

    /// QR payload pointing at the verification page of a unit.
    pub fn verification_link(&self, unit_asset_id: String) -> Result<String, PharmTrustError> {
        Ok(VerificationLink::new(&unit_asset_id).to_json()?)
    }

    /// Balance and holdings of the creator account.
    pub fn creator_balance(&self) -> Result<FfiAccountInfo, PharmTrustError> {
        Ok(self.registry.creator_balance()?.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe batch registration result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBatchRegistration {
    pub medicine_id: String,
    pub batch_asset_id: String,
}

impl From<RegisteredBatch> for FfiBatchRegistration {
    fn from(batch: RegisteredBatch) -> Self {
        Self {
            medicine_id: batch.medicine_id,
            batch_asset_id: batch.batch_asset_id.canonical(),
        }
    }
}

/// FFI-safe unit issuance result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUnitIssued {
    pub unit_asset_id: String,
    pub unit_serial: String,
    /// JSON handed to a QR encoder
    pub qr_payload: String,
}

/// FFI-safe medicine batch.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub medicine_id: String,
    pub medicine_name: String,
    pub batch_number: String,
    pub batch_asset_id: String,
    pub total_units: u64,
    pub expiry_date: String,
    pub created_at: String,
    /// Unit serial -> unit asset id
    pub unit_assets: HashMap<String, String>,
}

impl From<MedicineBatch> for FfiMedicine {
    fn from(batch: MedicineBatch) -> Self {
        Self {
            batch_asset_id: batch.batch_asset_id.canonical(),
            unit_assets: batch
                .unit_assets
                .iter()
                .map(|(serial, id)| (serial.clone(), id.canonical()))
                .collect(),
            medicine_id: batch.medicine_id,
            medicine_name: batch.medicine_name,
            batch_number: batch.batch_number,
            total_units: batch.total_units,
            expiry_date: batch.expiry_date,
            created_at: batch.created_at,
        }
    }
}

/// FFI-safe inventory line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInventoryLine {
    pub medicine_id: String,
    pub medicine_name: String,
    pub batch_number: String,
    pub batch_asset_id: String,
    pub total_units: u64,
    pub issued_units: u64,
    pub expiry_date: String,
}

impl From<InventoryLine> for FfiInventoryLine {
    fn from(line: InventoryLine) -> Self {
        Self {
            medicine_id: line.medicine_id,
            medicine_name: line.medicine_name,
            batch_number: line.batch_number,
            batch_asset_id: line.batch_asset_id,
            total_units: line.total_units,
            issued_units: line.issued_units as u64,
            expiry_date: line.expiry_date,
        }
    }
}

/// FFI-safe verification result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVerification {
    pub medicine_id: String,
    pub medicine_name: String,
    pub batch_number: String,
    pub unit_serial: String,
    pub unit_asset_id: String,
    pub batch_asset_id: String,
    pub expiry_date: String,
    pub created_at: String,
    pub authentic: bool,
}

impl From<VerificationRecord> for FfiVerification {
    fn from(record: VerificationRecord) -> Self {
        Self {
            medicine_id: record.medicine_id,
            medicine_name: record.medicine_name,
            batch_number: record.batch_number,
            unit_serial: record.unit_serial,
            unit_asset_id: record.unit_asset_id,
            batch_asset_id: record.batch_asset_id,
            expiry_date: record.expiry_date,
            created_at: record.created_at,
            authentic: record.authentic,
        }
    }
}

/// FFI-safe asset creation request, passed to a [`HostLedger`].
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAssetRequest {
    pub sender: String,
    pub total: u64,
    pub decimals: u32,
    pub default_frozen: bool,
    pub unit_name: String,
    pub asset_name: String,
    pub url: Option<String>,
    pub note: Option<Vec<u8>>,
    pub manager: String,
    pub reserve: String,
    pub freeze: String,
    pub clawback: String,
}

impl From<AssetCreateParams> for FfiAssetRequest {
    fn from(params: AssetCreateParams) -> Self {
        Self {
            sender: params.sender,
            total: params.total,
            decimals: params.decimals,
            default_frozen: params.default_frozen,
            unit_name: params.unit_name,
            asset_name: params.asset_name,
            url: params.url,
            note: params.note,
            manager: params.roles.manager,
            reserve: params.roles.reserve,
            freeze: params.roles.freeze,
            clawback: params.roles.clawback,
        }
    }
}

impl From<FfiAssetRequest> for AssetCreateParams {
    fn from(request: FfiAssetRequest) -> Self {
        AssetCreateParams {
            sender: request.sender,
            total: request.total,
            decimals: request.decimals,
            default_frozen: request.default_frozen,
            unit_name: request.unit_name,
            asset_name: request.asset_name,
            url: request.url,
            note: request.note,
            roles: ManagerRoles {
                manager: request.manager,
                reserve: request.reserve,
                freeze: request.freeze,
                clawback: request.clawback,
            },
        }
    }
}

/// FFI-safe asset holding.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAssetHolding {
    pub asset_id: u64,
    pub amount: u64,
}

/// FFI-safe account view.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAccountInfo {
    pub address: String,
    /// Native balance in micro-units
    pub amount: u64,
    pub assets: Vec<FfiAssetHolding>,
}

impl From<AccountInfo> for FfiAccountInfo {
    fn from(info: AccountInfo) -> Self {
        Self {
            address: info.address,
            amount: info.amount,
            assets: info
                .assets
                .into_iter()
                .map(|a| FfiAssetHolding {
                    asset_id: a.asset_id,
                    amount: a.amount,
                })
                .collect(),
        }
    }
}

impl From<FfiAccountInfo> for AccountInfo {
    fn from(info: FfiAccountInfo) -> Self {
        AccountInfo {
            address: info.address,
            amount: info.amount,
            assets: info
                .assets
                .into_iter()
                .map(|a| pharmtrust_ledger::AssetHolding {
                    asset_id: a.asset_id,
                    amount: a.amount,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Host ledger that hands out sequential ids and records requests.
    struct RecordingHost {
        next: Mutex<u64>,
        requests: Mutex<Vec<FfiAssetRequest>>,
        times_out: bool,
    }

    impl RecordingHost {
        fn new(times_out: bool) -> Self {
            Self {
                next: Mutex::new(5_000),
                requests: Mutex::new(Vec::new()),
                times_out,
            }
        }
    }

    impl HostLedger for RecordingHost {
        fn create_asset(&self, request: FfiAssetRequest) -> Result<u64, PharmTrustError> {
            if self.times_out {
                return Err(PharmTrustError::Timeout("not confirmed by round 20".into()));
            }
            self.requests.lock().unwrap().push(request);
            let mut next = self.next.lock().unwrap();
            *next += 1;
            Ok(*next)
        }

        fn account_info(&self, address: String) -> Result<FfiAccountInfo, PharmTrustError> {
            Ok(FfiAccountInfo {
                address,
                amount: 42,
                assets: Vec::new(),
            })
        }
    }

    fn write_config(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("pharmtrust.toml");
        let store = dir.path().join("artifacts.json");
        std::fs::write(
            &path,
            format!("store_path = {:?}\ncreator_address = \"HOST\"\n", store),
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_host_ledger_flow() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::new(false));
        let core = open_registry(write_config(&dir), host.clone()).unwrap();

        let batch = core
            .create_medicine("Amoxy 500".into(), "B2025-09-16".into(), None, None)
            .unwrap();
        assert_eq!(batch.batch_asset_id, "5001");

        let unit = core.create_unit(batch.medicine_id.clone(), None).unwrap();
        assert!(unit.unit_serial.starts_with('U'));
        assert!(unit.qr_payload.contains(&unit.unit_asset_id));

        let verified = core.verify(unit.unit_asset_id.clone()).unwrap().unwrap();
        assert_eq!(verified.medicine_name, "Amoxy 500");
        assert!(verified.authentic);

        let requests = host.requests.lock().unwrap();
        assert_eq!(requests[0].total, 1000);
        assert_eq!(requests[0].manager, "HOST");
        assert_eq!(requests[1].total, 1);
    }

    #[test]
    fn test_host_timeout_maps_to_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::new(true));
        let core = open_registry(write_config(&dir), host).unwrap();

        let err = core
            .create_medicine("Amoxy 500".into(), "B1".into(), Some(10), None)
            .unwrap_err();
        assert!(matches!(err, PharmTrustError::Timeout(_)));
        assert!(core.list_medicines().unwrap().is_empty());
    }

    #[test]
    fn test_devnet_registry() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("artifacts.json");
        let core = open_devnet_registry(store.to_string_lossy().into_owned()).unwrap();

        let batch = core
            .create_medicine("Para 650".into(), "B7".into(), Some(5), Some("2026-01".into()))
            .unwrap();
        core.create_unit(batch.medicine_id.clone(), Some("U001".into()))
            .unwrap();

        let medicine = core.get_medicine(batch.medicine_id).unwrap().unwrap();
        assert_eq!(medicine.total_units, 5);
        assert_eq!(medicine.unit_assets.len(), 1);
        assert_eq!(core.inventory().unwrap()[0].issued_units, 1);
        assert!(core.verify("nonexistent-id-12345".into()).unwrap().is_none());
    }

    #[test]
    fn test_unit_payload_uses_recorded_serial() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("artifacts.json");
        let core = open_devnet_registry(store.to_string_lossy().into_owned()).unwrap();
        let batch = core
            .create_medicine("Para 650".into(), "B7".into(), None, None)
            .unwrap();

        let unit = core
            .create_unit(batch.medicine_id.clone(), Some("U1 ".into()))
            .unwrap();
        assert_eq!(unit.unit_serial, "U1");
        let payload: UnitQrPayload = serde_json::from_str(&unit.qr_payload).unwrap();
        assert_eq!(payload.unit_serial, "U1");

        let medicine = core.get_medicine(batch.medicine_id.clone()).unwrap().unwrap();
        assert_eq!(medicine.unit_assets.get("U1"), Some(&unit.unit_asset_id));

        let generated = core.create_unit(batch.medicine_id, Some("".into())).unwrap();
        assert!(generated.unit_serial.starts_with('U'));
    }

    #[test]
    fn test_duplicate_batch_is_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("artifacts.json");
        let core = open_devnet_registry(store.to_string_lossy().into_owned()).unwrap();

        core.create_medicine("Para 650".into(), "B7".into(), None, None)
            .unwrap();
        let err = core
            .create_medicine("Para 650".into(), "B7".into(), None, None)
            .unwrap_err();
        assert!(matches!(err, PharmTrustError::Duplicate(_)));
    }

    #[test]
    fn test_verification_link() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("artifacts.json");
        let core = open_devnet_registry(store.to_string_lossy().into_owned()).unwrap();

        let link = core.verification_link("1001".into()).unwrap();
        assert!(link.contains("/verify/1001"));
    }
}
