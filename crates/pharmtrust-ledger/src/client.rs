//! Blocking asset creation on top of a round-based ledger node.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::asset::{AccountInfo, AssetCreateParams, AssetId, PendingTransaction};

/// Default number of rounds to wait for a confirmation.
pub const DEFAULT_CONFIRMATION_ROUNDS: u64 = 10;

/// Ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid asset parameters: {0}")]
    InvalidParams(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Transaction {txid} not confirmed in {rounds} rounds")]
    Timeout { txid: String, rounds: u64 },

    #[error("Confirmation timed out: {0}")]
    HostTimeout(String),

    #[error("Confirmed transaction {0} carries no asset index")]
    MissingAssetIndex(String),

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),

    #[error("Node error: {0}")]
    Node(String),
}

impl LedgerError {
    /// Whether the ledger simply did not confirm in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LedgerError::Timeout { .. } | LedgerError::HostTimeout(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// What the registry needs from a ledger.
///
/// `create_asset` blocks until the ledger confirms the asset or gives up;
/// it never returns an id for an unconfirmed transaction.
pub trait AssetLedger: Send + Sync {
    /// Create an asset and return its confirmed index.
    fn create_asset(&self, params: &AssetCreateParams) -> LedgerResult<AssetId>;

    /// Balance and holdings of an account.
    fn account_info(&self, address: &str) -> LedgerResult<AccountInfo>;
}

impl<T: AssetLedger + ?Sized> AssetLedger for Arc<T> {
    fn create_asset(&self, params: &AssetCreateParams) -> LedgerResult<AssetId> {
        (**self).create_asset(params)
    }

    fn account_info(&self, address: &str) -> LedgerResult<AccountInfo> {
        (**self).account_info(address)
    }
}

/// Low-level node API (algod-style).
pub trait AlgodNode: Send + Sync {
    /// Last committed round.
    fn last_round(&self) -> LedgerResult<u64>;

    /// Sign-and-send an asset creation; returns the transaction id.
    fn submit_asset_create(&self, params: &AssetCreateParams) -> LedgerResult<String>;

    /// Pool/confirmation state of a submitted transaction.
    fn pending_transaction(&self, txid: &str) -> LedgerResult<PendingTransaction>;

    /// Block until a round after `round` is committed; returns the new last round.
    fn wait_for_block_after(&self, round: u64) -> LedgerResult<u64>;

    /// Balance and holdings of an account.
    fn account_info(&self, address: &str) -> LedgerResult<AccountInfo>;
}

impl<T: AlgodNode + ?Sized> AlgodNode for Arc<T> {
    fn last_round(&self) -> LedgerResult<u64> {
        (**self).last_round()
    }

    fn submit_asset_create(&self, params: &AssetCreateParams) -> LedgerResult<String> {
        (**self).submit_asset_create(params)
    }

    fn pending_transaction(&self, txid: &str) -> LedgerResult<PendingTransaction> {
        (**self).pending_transaction(txid)
    }

    fn wait_for_block_after(&self, round: u64) -> LedgerResult<u64> {
        (**self).wait_for_block_after(round)
    }

    fn account_info(&self, address: &str) -> LedgerResult<AccountInfo> {
        (**self).account_info(address)
    }
}

/// Poll a transaction once per round for at most `max_rounds` rounds.
pub fn wait_for_confirmation<N: AlgodNode + ?Sized>(
    node: &N,
    txid: &str,
    max_rounds: u64,
) -> LedgerResult<PendingTransaction> {
    let start = node.last_round()?;
    let mut current = start;

    while current < start + max_rounds {
        let pending = node.pending_transaction(txid)?;
        if pending.is_confirmed() {
            debug!(txid, round = ?pending.confirmed_round, "Transaction confirmed");
            return Ok(pending);
        }
        if let Some(reason) = pending.pool_error.filter(|e| !e.is_empty()) {
            return Err(LedgerError::Rejected(reason));
        }
        current += 1;
        node.wait_for_block_after(current)?;
    }

    warn!(txid, rounds = max_rounds, "Transaction not confirmed in time");
    Err(LedgerError::Timeout {
        txid: txid.to_string(),
        rounds: max_rounds,
    })
}

/// [`AssetLedger`] that submits through a node and waits for confirmation.
pub struct ConfirmingLedger<N> {
    node: N,
    confirmation_rounds: u64,
}

impl<N: AlgodNode> ConfirmingLedger<N> {
    pub fn new(node: N, confirmation_rounds: u64) -> Self {
        Self {
            node,
            confirmation_rounds,
        }
    }

    /// The underlying node.
    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn confirmation_rounds(&self) -> u64 {
        self.confirmation_rounds
    }
}

impl<N: AlgodNode> AssetLedger for ConfirmingLedger<N> {
    fn create_asset(&self, params: &AssetCreateParams) -> LedgerResult<AssetId> {
        params.validate()?;

        let txid = self.node.submit_asset_create(params)?;
        debug!(%txid, unit_name = %params.unit_name, "Submitted asset creation");

        let confirmed = wait_for_confirmation(&self.node, &txid, self.confirmation_rounds)?;
        let asset_id = confirmed
            .asset_index
            .ok_or_else(|| LedgerError::MissingAssetIndex(txid.clone()))?;

        info!(
            asset_id,
            %txid,
            asset_name = %params.asset_name,
            total = params.total,
            "Asset created"
        );
        Ok(asset_id)
    }

    fn account_info(&self, address: &str) -> LedgerResult<AccountInfo> {
        self.node.account_info(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Node that replays a fixed script of pending states.
    struct ScriptedNode {
        round: Mutex<u64>,
        script: Mutex<Vec<PendingTransaction>>,
    }

    impl ScriptedNode {
        fn new(mut script: Vec<PendingTransaction>) -> Self {
            script.reverse();
            Self {
                round: Mutex::new(100),
                script: Mutex::new(script),
            }
        }
    }

    impl AlgodNode for ScriptedNode {
        fn last_round(&self) -> LedgerResult<u64> {
            Ok(*self.round.lock().unwrap())
        }

        fn submit_asset_create(&self, _params: &AssetCreateParams) -> LedgerResult<String> {
            Ok("TX1".into())
        }

        fn pending_transaction(&self, _txid: &str) -> LedgerResult<PendingTransaction> {
            Ok(self.script.lock().unwrap().pop().unwrap_or_default())
        }

        fn wait_for_block_after(&self, round: u64) -> LedgerResult<u64> {
            let mut r = self.round.lock().unwrap();
            *r = round + 1;
            Ok(*r)
        }

        fn account_info(&self, address: &str) -> LedgerResult<AccountInfo> {
            Ok(AccountInfo::empty(address))
        }
    }

    fn confirmed(asset: Option<AssetId>) -> PendingTransaction {
        PendingTransaction {
            confirmed_round: Some(101),
            asset_index: asset,
            pool_error: None,
        }
    }

    #[test]
    fn test_confirms_after_pending_rounds() {
        let node = ScriptedNode::new(vec![
            PendingTransaction::default(),
            PendingTransaction::default(),
            confirmed(Some(42)),
        ]);
        let result = wait_for_confirmation(&node, "TX1", 10).unwrap();
        assert_eq!(result.asset_index, Some(42));
    }

    #[test]
    fn test_timeout_after_max_rounds() {
        let node = ScriptedNode::new(vec![]);
        let err = wait_for_confirmation(&node, "TX1", 3).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Timeout {
                txid: "TX1".into(),
                rounds: 3
            }
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn test_pool_error_is_rejection() {
        let node = ScriptedNode::new(vec![PendingTransaction {
            confirmed_round: None,
            asset_index: None,
            pool_error: Some("overspend".into()),
        }]);
        let err = wait_for_confirmation(&node, "TX1", 5).unwrap_err();
        assert_eq!(err, LedgerError::Rejected("overspend".into()));
    }

    #[test]
    fn test_missing_asset_index() {
        let ledger = ConfirmingLedger::new(ScriptedNode::new(vec![confirmed(None)]), 5);
        let params = AssetCreateParams {
            sender: "CREATOR".into(),
            total: 1,
            decimals: 0,
            default_frozen: false,
            unit_name: "AMOUU001".into(),
            asset_name: "Amoxy 500 Unit #U001".into(),
            url: None,
            note: None,
            roles: crate::ManagerRoles::all("CREATOR"),
        };
        let err = ledger.create_asset(&params).unwrap_err();
        assert!(matches!(err, LedgerError::MissingAssetIndex(_)));
    }
}
