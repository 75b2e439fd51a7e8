//! Domain layer for the multi-party order lifecycle engine.
//!
//! This crate provides:
//! - Aggregate and Change traits with a ledger-backed CommandHandler
//! - The Order aggregate and its status machine
//! - Organization/tenant authorization and read visibility rules
//! - Settlement time locks for payouts and returns
//! - OrderService, the entry point used by transports

pub mod aggregate;
pub mod authz;
pub mod command;
pub mod context;
pub mod error;
pub mod order;
pub mod policy;
pub mod visibility;

pub use aggregate::{Aggregate, AggregateError, Change};
pub use authz::{ActionPolicy, Organizations, Party, Role};
pub use command::{CommandHandler, CommandResult};
pub use context::{Caller, Clock, ManualClock, SystemClock, TxContext};
pub use error::{DomainError, ErrorKind};
pub use order::{
    CodStatus, CreateOrder, HistoryEntry, Order, OrderAction, OrderError, OrderService,
    OrderStatus, PaymentMethod, QueryResult, TenantScope, Transition,
};
pub use policy::{PayoutReadiness, SettlementPolicy, SettlementProfile, UnknownProfile};
pub use visibility::ScopedLookup;
