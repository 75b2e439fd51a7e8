//! World-state ledger abstraction.
//!
//! The lifecycle engine persists one JSON document per order key through the
//! [`Ledger`] trait. Two backends are provided:
//! - [`InMemoryLedger`] for tests and local runs
//! - [`PostgresLedger`] storing documents as JSONB

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{LedgerError, Result};
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;
pub use query::RichQuery;
pub use store::{Ledger, LedgerExt, LedgerRecord};
