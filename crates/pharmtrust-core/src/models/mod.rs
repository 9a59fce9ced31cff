//! Domain models for the PharmTrust system.

mod ledger_id;
mod medicine;
mod verification;

pub use ledger_id::*;
pub use medicine::*;
pub use verification::*;
