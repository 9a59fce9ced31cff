//! Ledger seam for PharmTrust.
//!
//! The registry never talks to a ledger node directly. It consumes the
//! [`AssetLedger`] contract: create an asset and block until the ledger
//! confirms it (or a bounded number of rounds pass).
//!
//! [`ConfirmingLedger`] builds that contract on top of any [`AlgodNode`]
//! (submit, then poll once per round). [`DevNet`] is an in-memory node for
//! tests and offline runs.

pub mod asset;
pub mod client;
pub mod devnet;

pub use asset::*;
pub use client::*;
pub use devnet::*;
