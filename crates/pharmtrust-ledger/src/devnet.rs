//! In-memory ledger node for tests and offline runs.
//!
//! Rounds advance only when a caller waits for a block. Submitted asset
//! creations confirm `confirmation_delay` rounds after submission, at which
//! point the whole supply is credited to the sender.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::asset::{AccountInfo, AssetCreateParams, AssetHolding, AssetId, PendingTransaction};
use crate::client::{AlgodNode, LedgerError, LedgerResult};

/// First asset index handed out by a fresh DevNet.
pub const DEVNET_FIRST_ASSET_ID: AssetId = 1_000;

struct DevNetTx {
    params: AssetCreateParams,
    asset_index: AssetId,
    /// `None` while confirmations are stalled
    confirm_round: Option<u64>,
    applied: bool,
}

struct DevNetState {
    round: u64,
    /// `None` once every index has been handed out
    next_asset_id: Option<AssetId>,
    submissions: u64,
    transactions: HashMap<String, DevNetTx>,
    accounts: HashMap<String, AccountInfo>,
    assets: HashMap<AssetId, AssetCreateParams>,
    reject_next: Option<String>,
    stalled: bool,
}

/// In-memory node implementing [`AlgodNode`].
pub struct DevNet {
    state: Mutex<DevNetState>,
    confirmation_delay: u64,
}

impl Default for DevNet {
    fn default() -> Self {
        Self::new()
    }
}

impl DevNet {
    /// Node that confirms transactions one round after submission.
    pub fn new() -> Self {
        Self::with_confirmation_delay(1)
    }

    /// Node that confirms transactions `rounds` rounds after submission.
    pub fn with_confirmation_delay(rounds: u64) -> Self {
        Self {
            state: Mutex::new(DevNetState {
                round: 1,
                next_asset_id: Some(DEVNET_FIRST_ASSET_ID),
                submissions: 0,
                transactions: HashMap::new(),
                accounts: HashMap::new(),
                assets: HashMap::new(),
                reject_next: None,
                stalled: false,
            }),
            confirmation_delay: rounds,
        }
    }

    /// Continue handing out asset indices after `last`.
    ///
    /// Lets a node restarted from scratch avoid reusing indices that an
    /// earlier run already recorded.
    pub fn starting_after(self, last: AssetId) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.next_asset_id = match last.checked_add(1) {
                Some(first_free) => state.next_asset_id.map(|next| next.max(first_free)),
                None => None,
            };
        }
        self
    }

    /// Credit native balance to an account.
    pub fn fund(&self, address: &str, micro_units: u64) -> LedgerResult<()> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .entry(address.to_string())
            .or_insert_with(|| AccountInfo::empty(address));
        account.amount += micro_units;
        Ok(())
    }

    /// Make the next submission fail with `reason`.
    pub fn reject_next(&self, reason: &str) -> LedgerResult<()> {
        self.lock()?.reject_next = Some(reason.to_string());
        Ok(())
    }

    /// Stop (or resume) confirming newly submitted transactions.
    pub fn stall_confirmations(&self, stalled: bool) -> LedgerResult<()> {
        self.lock()?.stalled = stalled;
        Ok(())
    }

    /// Number of confirmed assets.
    pub fn asset_count(&self) -> LedgerResult<usize> {
        Ok(self.lock()?.assets.len())
    }

    /// Creation parameters of a confirmed asset.
    pub fn asset_params(&self, asset_id: AssetId) -> LedgerResult<Option<AssetCreateParams>> {
        Ok(self.lock()?.assets.get(&asset_id).cloned())
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, DevNetState>> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Node("devnet state lock poisoned".into()))
    }
}

fn transaction_id(params: &AssetCreateParams, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(params.sender.as_bytes());
    hasher.update(params.asset_name.as_bytes());
    hasher.update(params.unit_name.as_bytes());
    hasher.update(params.total.to_be_bytes());
    hasher.update(nonce.to_be_bytes());
    hex::encode_upper(&hasher.finalize()[..26])
}

impl DevNetState {
    /// Confirm `txid` if its round has come, crediting the supply once.
    fn settle(&mut self, txid: &str) {
        let round = self.round;
        let Some(tx) = self.transactions.get_mut(txid) else {
            return;
        };
        let due = tx.confirm_round.map_or(false, |r| r <= round);
        if !due || tx.applied {
            return;
        }
        tx.applied = true;

        let asset_id = tx.asset_index;
        let params = tx.params.clone();
        let account = self
            .accounts
            .entry(params.sender.clone())
            .or_insert_with(|| AccountInfo::empty(&params.sender));
        account.assets.push(AssetHolding {
            asset_id,
            amount: params.total,
        });
        self.assets.insert(asset_id, params);
        debug!(txid, asset_id, round, "DevNet confirmed asset creation");
    }
}

impl AlgodNode for DevNet {
    fn last_round(&self) -> LedgerResult<u64> {
        Ok(self.lock()?.round)
    }

    fn submit_asset_create(&self, params: &AssetCreateParams) -> LedgerResult<String> {
        let mut state = self.lock()?;
        if let Some(reason) = state.reject_next.take() {
            return Err(LedgerError::Rejected(reason));
        }

        let asset_index = state
            .next_asset_id
            .ok_or_else(|| LedgerError::Node("asset index space exhausted".into()))?;
        state.next_asset_id = asset_index.checked_add(1);
        state.submissions += 1;
        let txid = transaction_id(params, state.submissions);
        let confirm_round = if state.stalled {
            None
        } else {
            Some(state.round + self.confirmation_delay)
        };

        state.transactions.insert(
            txid.clone(),
            DevNetTx {
                params: params.clone(),
                asset_index,
                confirm_round,
                applied: false,
            },
        );
        Ok(txid)
    }

    fn pending_transaction(&self, txid: &str) -> LedgerResult<PendingTransaction> {
        let mut state = self.lock()?;
        state.settle(txid);
        let tx = state
            .transactions
            .get(txid)
            .ok_or_else(|| LedgerError::UnknownTransaction(txid.to_string()))?;

        if tx.applied {
            Ok(PendingTransaction {
                confirmed_round: tx.confirm_round,
                asset_index: Some(tx.asset_index),
                pool_error: None,
            })
        } else {
            Ok(PendingTransaction::default())
        }
    }

    fn wait_for_block_after(&self, round: u64) -> LedgerResult<u64> {
        let mut state = self.lock()?;
        state.round = state.round.max(round + 1);
        Ok(state.round)
    }

    fn account_info(&self, address: &str) -> LedgerResult<AccountInfo> {
        Ok(self
            .lock()?
            .accounts
            .get(address)
            .cloned()
            .unwrap_or_else(|| AccountInfo::empty(address)))
    }
}
