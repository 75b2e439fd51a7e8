//! Order aggregate and related types.

mod aggregate;
mod commands;
mod history;
mod service;
mod state;
mod value_objects;

pub use aggregate::{Order, Transition};
pub use commands::{CreateOrder, OrderAction};
pub use history::HistoryEntry;
pub use service::{OrderService, QueryResult};
pub use state::OrderStatus;
pub use value_objects::{CodStatus, PaymentMethod, TenantScope};

use chrono::{DateTime, Utc};
use common::{OrgId, TenantId};
use thiserror::Error;

use crate::aggregate::AggregateError;
use crate::error::ErrorKind;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No order is stored under the id.
    #[error("order not found: {order_id}")]
    NotFound { order_id: String },

    /// An order is already stored under the id.
    #[error("order already exists: {order_id}")]
    AlreadyExists { order_id: String },

    /// The caller may not perform the action.
    #[error(
        "{caller_org} is not authorized to {action} (requires {required_org}{})",
        tenant_suffix(.owner_tenant, .caller_tenant)
    )]
    Unauthorized {
        action: &'static str,
        caller_org: OrgId,
        required_org: OrgId,
        owner_tenant: Option<TenantId>,
        caller_tenant: Option<TenantId>,
    },

    /// The caller may not read the order.
    #[error("{caller_org} may not view this order: {reason}")]
    Forbidden {
        caller_org: OrgId,
        reason: &'static str,
    },

    /// Order is not in a status the action may start from.
    #[error(
        "Invalid state transition: cannot {action} from {current} (allowed: {})",
        join_statuses(.allowed)
    )]
    InvalidTransition {
        action: OrderAction,
        current: OrderStatus,
        allowed: &'static [OrderStatus],
    },

    /// The action belongs to the other payment branch.
    #[error("{action} requires a {required} order, this order is {actual}")]
    InvalidPaymentBranch {
        action: OrderAction,
        required: PaymentMethod,
        actual: PaymentMethod,
    },

    /// Cash-on-delivery collection is not where the action needs it.
    #[error("{action} requires cod status {required}, found {current}")]
    CodStatusMismatch {
        action: OrderAction,
        current: CodStatus,
        required: CodStatus,
    },

    /// The order has no recorded delivery time.
    #[error("{action} requires a recorded delivery timestamp")]
    MissingDeliveryTimestamp { action: &'static str },

    /// Payout lock has not expired yet.
    #[error("payout locked until {unlocks_at} (now {now})")]
    TooEarly {
        unlocks_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// The return window closed.
    #[error("return window closed at {deadline} (now {now})")]
    ReturnWindowExpired {
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// Input failed validation.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NotFound { .. } => ErrorKind::NotFound,
            OrderError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            OrderError::Unauthorized { .. } => ErrorKind::Unauthorized,
            OrderError::Forbidden { .. } => ErrorKind::Forbidden,
            OrderError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            OrderError::InvalidPaymentBranch { .. } => ErrorKind::InvalidPaymentBranch,
            OrderError::CodStatusMismatch { .. } => ErrorKind::CodStatusMismatch,
            OrderError::MissingDeliveryTimestamp { .. } => ErrorKind::MissingDeliveryTimestamp,
            OrderError::TooEarly { .. } => ErrorKind::TooEarly,
            OrderError::ReturnWindowExpired { .. } => ErrorKind::ReturnWindowExpired,
            OrderError::MalformedInput(_) => ErrorKind::MalformedInput,
        }
    }
}

impl AggregateError for OrderError {
    fn not_found(_aggregate_type: &'static str, key: &str) -> Self {
        OrderError::NotFound {
            order_id: key.to_string(),
        }
    }

    fn already_exists(_aggregate_type: &'static str, key: &str) -> Self {
        OrderError::AlreadyExists {
            order_id: key.to_string(),
        }
    }
}

fn tenant_suffix(owner: &Option<TenantId>, caller: &Option<TenantId>) -> String {
    match (owner, caller) {
        (Some(owner), Some(caller)) => format!(" tenant {owner}, caller tenant {caller}"),
        (Some(owner), None) => format!(" tenant {owner}, caller has no tenant"),
        _ => String::new(),
    }
}

fn join_statuses(statuses: &[OrderStatus]) -> String {
    statuses
        .iter()
        .map(OrderStatus::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
