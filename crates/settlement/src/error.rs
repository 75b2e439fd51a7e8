//! Settlement error types.

use domain::DomainError;
use thiserror::Error;

/// Errors that abort a sweep.
///
/// Failures settling a single order do not abort the sweep; they are reported
/// in [`SweepReport::failed`](crate::SweepReport::failed).
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The candidate query failed.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The sweep interval must be positive.
    #[error("Invalid sweep interval: {0:?}")]
    InvalidInterval(std::time::Duration),
}

/// Convenience type alias for settlement results.
pub type Result<T> = std::result::Result<T, SettlementError>;
