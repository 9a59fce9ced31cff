//! Medicine registry: batch and unit issuance over the ledger and the store.
//!
//! Every mutation follows the same path under one writer lock:
//! check the current snapshot, mint on the ledger (blocking until confirmed),
//! write the updated document, then swap the in-memory snapshot. Any failure
//! before the write leaves both the file and the snapshot untouched.
//!
//! Readers clone the current snapshot handle and never wait on a mint.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Local};
use pharmtrust_ledger::{
    AccountInfo, AssetCreateParams, AssetLedger, ConfirmingLedger, DevNet, LedgerError,
    ManagerRoles,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, RegistryConfig, SerialPolicy};
use crate::identity;
use crate::models::{InventoryLine, LedgerId, MedicineBatch, NewBatch, VerificationRecord};
use crate::store::{ArtifactStore, Document, StoreError, StoreResult};
use crate::verify::{UnitIndex, VerificationResolver};

/// Registry errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Medicine already exists: {0}")]
    DuplicateBatch(String),

    #[error("Unit serial {serial} already issued for medicine {medicine_id}")]
    DuplicateSerial { medicine_id: String, serial: String },

    #[error("Medicine not found: {0}")]
    MedicineNotFound(String),

    #[error("Mint failed: {0}")]
    MintFailed(#[source] LedgerError),

    #[error("Mint not confirmed in time: {0}")]
    Timeout(#[source] LedgerError),

    #[error("Ledger error: {0}")]
    Ledger(#[source] LedgerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry lock poisoned")]
    LockPoisoned,
}

impl RegistryError {
    fn from_mint(e: LedgerError) -> Self {
        if e.is_timeout() {
            RegistryError::Timeout(e)
        } else {
            RegistryError::MintFailed(e)
        }
    }

    /// The durable document could not be parsed.
    pub fn is_store_corrupt(&self) -> bool {
        matches!(self, RegistryError::Store(StoreError::Corrupt { .. }))
    }
}

impl<T> From<std::sync::PoisonError<T>> for RegistryError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        RegistryError::LockPoisoned
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Identifiers of a newly registered batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredBatch {
    pub medicine_id: String,
    pub batch_asset_id: LedgerId,
}

#[derive(Clone)]
struct Snapshot {
    document: Arc<Document>,
    index: Arc<UnitIndex>,
}

impl Snapshot {
    fn new(document: Document) -> Self {
        let index = UnitIndex::build(&document);
        Self {
            document: Arc::new(document),
            index: Arc::new(index),
        }
    }
}

/// Owner of the working copy of the artifact document.
pub struct MedicineRegistry<L> {
    config: RegistryConfig,
    store: ArtifactStore,
    ledger: L,
    snapshot: RwLock<Snapshot>,
    writer: Mutex<()>,
}

impl<L: AssetLedger> MedicineRegistry<L> {
    /// Load the stored document and take ownership of it.
    ///
    /// Refuses to open on a corrupt document.
    pub fn open(config: RegistryConfig, ledger: L) -> RegistryResult<Self> {
        config.validate()?;
        let store = ArtifactStore::new(&config.store_path);
        let document = store.load()?;

        info!(
            path = %store.path().display(),
            medicines = document.medicines.len(),
            units = document.unit_count(),
            "Medicine registry opened"
        );

        Ok(Self {
            config,
            store,
            ledger,
            snapshot: RwLock::new(Snapshot::new(document)),
            writer: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Register a batch, deriving its id from today's date.
    pub fn register_batch(&self, request: NewBatch) -> RegistryResult<RegisteredBatch> {
        self.register_batch_at(request, Local::now())
    }

    /// Register a batch as of `now`.
    pub fn register_batch_at(
        &self,
        request: NewBatch,
        now: DateTime<Local>,
    ) -> RegistryResult<RegisteredBatch> {
        let request = NewBatch {
            medicine_name: request.medicine_name.trim().to_string(),
            batch_number: request.batch_number.trim().to_string(),
            expiry_date: request.expiry_date.trim().to_string(),
            ..request
        };
        request.validate().map_err(RegistryError::Validation)?;

        let _writer = self.lock_writer()?;
        let current = self.current()?;

        let medicine_id = identity::derive_medicine_id(
            &request.medicine_name,
            &request.batch_number,
            now.date_naive(),
        );
        if current.document.contains(&medicine_id) {
            warn!(%medicine_id, "Rejected duplicate batch");
            return Err(RegistryError::DuplicateBatch(medicine_id));
        }

        let label = identity::batch_label(&request.medicine_name, &request.batch_number);
        let params = AssetCreateParams {
            sender: self.config.creator_address.clone(),
            total: request.total_units,
            decimals: 0,
            default_frozen: false,
            unit_name: label.unit_name,
            asset_name: label.asset_name,
            url: identity::batch_metadata_url(&self.config.metadata_base_url, &medicine_id),
            note: batch_note(&medicine_id, &request),
            roles: ManagerRoles::all(&self.config.creator_address),
        };
        let batch_asset_id = LedgerId::from(
            self.ledger
                .create_asset(&params)
                .map_err(RegistryError::from_mint)?,
        );

        let mut document = (*current.document).clone();
        document.insert_new(MedicineBatch {
            medicine_id: medicine_id.clone(),
            medicine_name: request.medicine_name,
            batch_number: request.batch_number,
            batch_asset_id: batch_asset_id.clone(),
            total_units: request.total_units,
            expiry_date: request.expiry_date,
            created_at: now.to_rfc3339(),
            unit_assets: BTreeMap::new(),
            extra: BTreeMap::new(),
        });
        self.commit(
            Snapshot {
                document: Arc::new(document),
                index: current.index,
            },
            &batch_asset_id,
        )?;

        info!(%medicine_id, %batch_asset_id, "Batch registered");
        Ok(RegisteredBatch {
            medicine_id,
            batch_asset_id,
        })
    }

    /// Mint a unit asset under `medicine_id` and record it as `unit_serial`.
    pub fn issue_unit(&self, medicine_id: &str, unit_serial: &str) -> RegistryResult<LedgerId> {
        let serial = unit_serial.trim();
        if serial.is_empty() {
            return Err(RegistryError::Validation("unit_serial is required".into()));
        }

        let _writer = self.lock_writer()?;
        let current = self.current()?;

        let batch = current
            .document
            .get(medicine_id)
            .ok_or_else(|| RegistryError::MedicineNotFound(medicine_id.to_string()))?;

        let replaced = batch.unit_asset(serial).cloned();
        if let Some(existing) = &replaced {
            match self.config.serial_policy {
                SerialPolicy::Reject => {
                    warn!(medicine_id, serial, %existing, "Rejected duplicate unit serial");
                    return Err(RegistryError::DuplicateSerial {
                        medicine_id: medicine_id.to_string(),
                        serial: serial.to_string(),
                    });
                }
                SerialPolicy::Overwrite => {
                    warn!(medicine_id, serial, %existing, "Re-issuing unit serial");
                }
            }
        }

        let label = identity::unit_label(&batch.medicine_name, serial);
        let params = AssetCreateParams {
            sender: self.config.creator_address.clone(),
            total: 1,
            decimals: 0,
            default_frozen: false,
            unit_name: label.unit_name,
            asset_name: label.asset_name,
            url: identity::unit_metadata_url(&self.config.metadata_base_url, medicine_id, serial),
            note: None,
            roles: ManagerRoles::all(&self.config.creator_address),
        };
        let unit_asset_id = LedgerId::from(
            self.ledger
                .create_asset(&params)
                .map_err(RegistryError::from_mint)?,
        );

        let mut document = (*current.document).clone();
        if let Some(batch) = document.medicines.get_mut(medicine_id) {
            batch
                .unit_assets
                .insert(serial.to_string(), unit_asset_id.clone());
        }
        let index = if replaced.is_some() {
            UnitIndex::build(&document)
        } else {
            let mut index = (*current.index).clone();
            index.insert(&unit_asset_id.canonical(), medicine_id, serial);
            index
        };
        self.commit(
            Snapshot {
                document: Arc::new(document),
                index: Arc::new(index),
            },
            &unit_asset_id,
        )?;

        info!(medicine_id, serial, %unit_asset_id, "Unit issued");
        Ok(unit_asset_id)
    }

    pub fn get_medicine(&self, medicine_id: &str) -> RegistryResult<Option<MedicineBatch>> {
        Ok(self.current()?.document.get(medicine_id).cloned())
    }

    /// All medicines, ordered by `medicine_id`.
    pub fn list_medicines(&self) -> RegistryResult<Vec<MedicineBatch>> {
        Ok(self.current()?.document.iter().cloned().collect())
    }

    /// Verify a unit asset id; `None` if this registry never issued it.
    pub fn verify(&self, unit_asset_id: &str) -> RegistryResult<Option<VerificationRecord>> {
        let current = self.current()?;
        Ok(current.index.resolve(&current.document, unit_asset_id))
    }

    /// Verify by scanning the whole document instead of the index.
    pub fn verify_by_scan(&self, unit_asset_id: &str) -> RegistryResult<Option<VerificationRecord>> {
        let current = self.current()?;
        Ok(VerificationResolver::new(&current.document).resolve(unit_asset_id))
    }

    /// Current document; stays valid (and unchanged) while the registry moves on.
    pub fn document(&self) -> RegistryResult<Arc<Document>> {
        Ok(self.current()?.document)
    }

    /// Per-medicine issuance counts.
    pub fn inventory_summary(&self) -> RegistryResult<Vec<InventoryLine>> {
        Ok(self
            .current()?
            .document
            .iter()
            .map(InventoryLine::from)
            .collect())
    }

    /// Balance and holdings of the creator account.
    pub fn creator_balance(&self) -> RegistryResult<AccountInfo> {
        self.ledger
            .account_info(&self.config.creator_address)
            .map_err(RegistryError::Ledger)
    }

    /// Re-read the durable document, discarding the working copy.
    pub fn reload(&self) -> RegistryResult<()> {
        let _writer = self.lock_writer()?;
        let document = self.store.load()?;
        *self.snapshot.write()? = Snapshot::new(document);
        Ok(())
    }

    fn current(&self) -> RegistryResult<Snapshot> {
        Ok(self.snapshot.read()?.clone())
    }

    fn lock_writer(&self) -> RegistryResult<MutexGuard<'_, ()>> {
        Ok(self.writer.lock()?)
    }

    /// Persist `next`, then make it the working copy.
    fn commit(&self, next: Snapshot, minted: &LedgerId) -> RegistryResult<()> {
        if let Err(e) = self.store.save(&next.document) {
            error!(
                asset_id = %minted,
                error = %e,
                "Asset minted but artifact document not saved"
            );
            return Err(e.into());
        }
        debug!(
            medicines = next.document.medicines.len(),
            indexed_units = next.index.len(),
            "Snapshot replaced"
        );
        *self.snapshot.write()? = next;
        Ok(())
    }
}

/// In-memory ledger for offline runs against `config`'s store.
///
/// Asset indices continue after the highest one already recorded, so ids
/// stay unique across runs.
pub fn devnet_ledger(config: &RegistryConfig) -> StoreResult<ConfirmingLedger<DevNet>> {
    let recorded = ArtifactStore::new(&config.store_path).load()?;
    let node = DevNet::new().starting_after(recorded.max_asset_index().unwrap_or(0));
    Ok(ConfirmingLedger::new(node, config.confirmation_rounds))
}

/// Transaction note describing the batch.
fn batch_note(medicine_id: &str, request: &NewBatch) -> Option<Vec<u8>> {
    serde_json::to_vec(&serde_json::json!({
        "medicine_id": medicine_id,
        "medicine_name": request.medicine_name,
        "batch_no": request.batch_number,
        "total_units": request.total_units,
        "expiry_date": request.expiry_date,
    }))
    .ok()
}
