//! Repository implementations over `SeaORM`.
//!
//! The ledger services in `tally-core` only see [`SeaLedgerStore`] through the
//! `LedgerStore` trait; the mapping between rows and ledger types stays here.

pub mod ledger;
mod mapping;

pub use ledger::SeaLedgerStore;
