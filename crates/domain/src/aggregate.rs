//! Core aggregate and change traits.

use serde::{Serialize, de::DeserializeOwned};

use crate::context::TxContext;

/// A validated state change produced by a command.
///
/// Changes are computed from the current aggregate without side effects and
/// only then applied, so a rejected command never touches stored state.
pub trait Change: Clone + Send + Sync {
    /// Returns the action name recorded in the audit trail.
    fn action_name(&self) -> &'static str;
}

/// Errors an aggregate reports for key-level failures.
pub trait AggregateError: std::error::Error + Send + Sync {
    /// No aggregate is stored under `key`.
    fn not_found(aggregate_type: &'static str, key: &str) -> Self;

    /// An aggregate is already stored under `key`.
    fn already_exists(aggregate_type: &'static str, key: &str) -> Self;
}

/// Trait for aggregates persisted as one document per key.
///
/// An aggregate is a cluster of domain objects that can be treated as a single unit.
/// The aggregate root ensures consistency of changes being made within the aggregate.
///
/// Every successful command:
/// - Computes a [`Change`] from the current state (pure, may fail)
/// - Applies the change (pure, infallible)
/// - Records one audit entry for the transaction
pub trait Aggregate: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// The type of changes this aggregate accepts.
    type Change: Change;

    /// The type of errors this aggregate can produce.
    type Error: AggregateError;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the action name recorded when the aggregate is created.
    fn creation_action() -> &'static str;

    /// Applies a change to the aggregate, updating its state.
    ///
    /// This method must be pure and deterministic and must not fail.
    fn apply(&mut self, change: Self::Change);

    /// Appends an audit entry for `action` performed within `ctx`.
    fn record(&mut self, ctx: &TxContext, action: &'static str);
}
