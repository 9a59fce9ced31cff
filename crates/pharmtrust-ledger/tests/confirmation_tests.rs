//! Confirmation-window tests against the in-memory node.

use std::sync::Arc;

use pharmtrust_ledger::{
    AssetCreateParams, AssetLedger, ConfirmingLedger, DevNet, LedgerError, ManagerRoles,
};
use proptest::prelude::*;

fn unit_params(serial: &str) -> AssetCreateParams {
    AssetCreateParams {
        sender: "CREATOR".into(),
        total: 1,
        decimals: 0,
        default_frozen: false,
        unit_name: format!("AMOU{}", serial).chars().take(8).collect(),
        asset_name: format!("Amoxy 500 Unit #{}", serial),
        url: None,
        note: None,
        roles: ManagerRoles::all("CREATOR"),
    }
}

proptest! {
    /// A transaction confirms iff its delay fits inside the wait window.
    #[test]
    fn confirmation_window(delay in 1u64..20, window in 2u64..20) {
        let ledger = ConfirmingLedger::new(DevNet::with_confirmation_delay(delay), window);
        let result = ledger.create_asset(&unit_params("U001"));
        if delay <= window {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.unwrap_err().is_timeout());
        }
    }
}

#[test]
fn test_shared_node_keeps_ids_unique() {
    let node = Arc::new(DevNet::new());
    let a = ConfirmingLedger::new(Arc::clone(&node), 10);
    let b = ConfirmingLedger::new(Arc::clone(&node), 10);

    let first = a.create_asset(&unit_params("U001")).unwrap();
    let second = b.create_asset(&unit_params("U002")).unwrap();
    assert_ne!(first, second);
    assert_eq!(node.asset_count().unwrap(), 2);
}

#[test]
fn test_invalid_params_never_reach_node() {
    let node = Arc::new(DevNet::new());
    let ledger = ConfirmingLedger::new(Arc::clone(&node), 10);

    let mut params = unit_params("U001");
    params.asset_name = "x".repeat(40);
    let err = ledger.create_asset(&params).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidParams(_)));
    assert_eq!(node.asset_count().unwrap(), 0);
}

#[test]
fn test_asset_params_recorded() {
    let node = Arc::new(DevNet::new());
    let ledger = ConfirmingLedger::new(Arc::clone(&node), 10);
    let id = ledger.create_asset(&unit_params("U007")).unwrap();

    let recorded = node.asset_params(id).unwrap().unwrap();
    assert_eq!(recorded.asset_name, "Amoxy 500 Unit #U007");
    assert_eq!(recorded.total, 1);
}
