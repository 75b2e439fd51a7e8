//! Domain error types.

use ledger::LedgerError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the ledger.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The order operation was rejected.
    #[error("Order error: {0}")]
    Order(OrderError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<OrderError> for DomainError {
    fn from(e: OrderError) -> Self {
        DomainError::Order(e)
    }
}

impl DomainError {
    /// Returns the classification used for metrics labels and status mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Ledger(LedgerError::InvalidQuery(_) | LedgerError::UnsupportedQuery(_)) => {
                ErrorKind::MalformedInput
            }
            DomainError::Ledger(_) => ErrorKind::Ledger,
            DomainError::Serialization(_) => ErrorKind::Serialization,
            DomainError::Order(e) => e.kind(),
        }
    }
}

/// Flat classification of every failure the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Unauthorized,
    Forbidden,
    InvalidTransition,
    InvalidPaymentBranch,
    CodStatusMismatch,
    MissingDeliveryTimestamp,
    TooEarly,
    ReturnWindowExpired,
    MalformedInput,
    Ledger,
    Serialization,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::InvalidPaymentBranch => "invalid_payment_branch",
            ErrorKind::CodStatusMismatch => "cod_status_mismatch",
            ErrorKind::MissingDeliveryTimestamp => "missing_delivery_timestamp",
            ErrorKind::TooEarly => "too_early",
            ErrorKind::ReturnWindowExpired => "return_window_expired",
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::Ledger => "ledger",
            ErrorKind::Serialization => "serialization",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
