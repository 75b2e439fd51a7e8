//! Settlement of delivered orders.
//!
//! The [`PayoutSweeper`] finds delivered orders whose payout time lock has
//! passed and settles them through the regular order service, acting as the
//! platform organization. It can run once on demand or on a fixed interval.

pub mod error;
pub mod sweeper;

pub use error::SettlementError;
pub use sweeper::{PayoutSweeper, SweepFailure, SweepReport};
