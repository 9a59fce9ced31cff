//! Asset creation parameters and account views.

use serde::{Deserialize, Serialize};

use crate::client::{LedgerError, LedgerResult};

/// Ledger-assigned asset index.
pub type AssetId = u64;

/// Maximum byte length of an asset's unit name.
pub const MAX_UNIT_NAME_LEN: usize = 8;
/// Maximum byte length of an asset's display name.
pub const MAX_ASSET_NAME_LEN: usize = 32;
/// Maximum byte length of an asset's metadata URL.
pub const MAX_URL_LEN: usize = 96;
/// Maximum number of decimals an asset may declare.
pub const MAX_DECIMALS: u32 = 19;

/// Accounts holding the four administrative roles of an asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagerRoles {
    pub manager: String,
    pub reserve: String,
    pub freeze: String,
    pub clawback: String,
}

impl ManagerRoles {
    /// Give every role to a single account.
    pub fn all(address: &str) -> Self {
        Self {
            manager: address.to_string(),
            reserve: address.to_string(),
            freeze: address.to_string(),
            clawback: address.to_string(),
        }
    }
}

/// Parameters of an asset-creation transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetCreateParams {
    /// Creator account; receives the whole supply
    pub sender: String,
    /// Total supply in base units
    pub total: u64,
    /// Number of decimals (0 for indivisible units)
    pub decimals: u32,
    /// Whether holdings start frozen
    pub default_frozen: bool,
    /// Short ticker-like code (at most 8 bytes)
    pub unit_name: String,
    /// Display name (at most 32 bytes)
    pub asset_name: String,
    /// Off-chain metadata location
    pub url: Option<String>,
    /// Arbitrary note attached to the transaction
    pub note: Option<Vec<u8>>,
    /// Administrative roles
    pub roles: ManagerRoles,
}

impl AssetCreateParams {
    /// Check the parameters against ledger field limits.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.sender.is_empty() {
            return Err(LedgerError::InvalidParams("sender is empty".into()));
        }
        if self.total == 0 {
            return Err(LedgerError::InvalidParams("total supply must be positive".into()));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(LedgerError::InvalidParams(format!(
                "decimals {} exceeds {}",
                self.decimals, MAX_DECIMALS
            )));
        }
        if self.unit_name.len() > MAX_UNIT_NAME_LEN {
            return Err(LedgerError::InvalidParams(format!(
                "unit name '{}' exceeds {} bytes",
                self.unit_name, MAX_UNIT_NAME_LEN
            )));
        }
        if self.asset_name.len() > MAX_ASSET_NAME_LEN {
            return Err(LedgerError::InvalidParams(format!(
                "asset name '{}' exceeds {} bytes",
                self.asset_name, MAX_ASSET_NAME_LEN
            )));
        }
        if let Some(url) = &self.url {
            if url.len() > MAX_URL_LEN {
                return Err(LedgerError::InvalidParams(format!(
                    "url exceeds {} bytes",
                    MAX_URL_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Units of an asset held by an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetHolding {
    pub asset_id: AssetId,
    pub amount: u64,
}

/// Account balance and asset holdings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountInfo {
    pub address: String,
    /// Native balance in micro-units
    pub amount: u64,
    pub assets: Vec<AssetHolding>,
}

impl AccountInfo {
    /// An account the ledger has never seen.
    pub fn empty(address: &str) -> Self {
        Self {
            address: address.to_string(),
            amount: 0,
            assets: Vec::new(),
        }
    }

    /// Native balance in whole units.
    pub fn balance(&self) -> f64 {
        self.amount as f64 / 1e6
    }

    /// Amount of `asset_id` held, zero if not opted in.
    pub fn holding(&self, asset_id: AssetId) -> u64 {
        self.assets
            .iter()
            .find(|a| a.asset_id == asset_id)
            .map(|a| a.amount)
            .unwrap_or(0)
    }
}

/// Node view of a submitted transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Round the transaction was confirmed in, if any
    pub confirmed_round: Option<u64>,
    /// Index of the asset created by the transaction
    pub asset_index: Option<AssetId>,
    /// Reason the pool dropped the transaction
    pub pool_error: Option<String>,
}

impl PendingTransaction {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.map_or(false, |r| r > 0)
    }
}
