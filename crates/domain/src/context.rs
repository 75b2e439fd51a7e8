//! Per-invocation transaction context.
//!
//! Every mutating or reading operation receives a [`TxContext`] carrying the
//! transaction id, the transaction timestamp and the authenticated caller.
//! The context is produced by the surrounding transport (HTTP gateway, payout
//! sweeper, tests) and is never derived from client-supplied payload fields.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use common::{OrgId, TenantId, TxId};

/// Source of transaction time and transaction ids.
pub trait Clock: Send + Sync {
    /// Returns the current transaction time.
    fn now(&self) -> DateTime<Utc>;

    /// Returns a fresh transaction id.
    fn next_tx_id(&self) -> TxId {
        TxId::new()
    }
}

/// Wall-clock time with random transaction ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Transaction ids are sequential (`tx-1`, `tx-2`, ...), which keeps test
/// histories deterministic. Clones share the same underlying time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
    sequence: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock frozen at the given instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Moves the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    /// Moves the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_tx_id(&self) -> TxId {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        TxId::from_string(format!("tx-{n}"))
    }
}

/// The authenticated invoker of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    org: OrgId,
    tenant: Option<TenantId>,
}

impl Caller {
    /// Creates a caller with no tenant attribute.
    pub fn new(org: impl Into<OrgId>) -> Self {
        Self {
            org: org.into(),
            tenant: None,
        }
    }

    /// Attaches a tenant attribute to the caller.
    pub fn with_tenant(mut self, tenant: impl Into<TenantId>) -> Self {
        let tenant = tenant.into();
        self.tenant = (!tenant.is_empty()).then_some(tenant);
        self
    }

    /// Builds a caller from raw identity attributes.
    ///
    /// An empty tenant attribute is treated as absent.
    pub fn from_attributes(org: impl Into<OrgId>, tenant: Option<String>) -> Self {
        let caller = Self::new(org);
        match tenant {
            Some(t) => caller.with_tenant(t),
            None => caller,
        }
    }

    pub fn org(&self) -> &OrgId {
        &self.org
    }

    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }
}

/// Transaction id, transaction time and caller for one invocation.
#[derive(Debug, Clone)]
pub struct TxContext {
    tx_id: TxId,
    timestamp: DateTime<Utc>,
    caller: Caller,
}

impl TxContext {
    pub fn new(tx_id: TxId, timestamp: DateTime<Utc>, caller: Caller) -> Self {
        Self {
            tx_id,
            timestamp,
            caller,
        }
    }

    /// Opens a context for `caller` using the clock's time and id sequence.
    pub fn issue(clock: &dyn Clock, caller: Caller) -> Self {
        Self::new(clock.next_tx_id(), clock.now(), caller)
    }

    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn manual_clock_advances_and_shares_time() {
        let clock = ManualClock::new(start());
        let other = clock.clone();

        clock.advance(Duration::minutes(5));
        assert_eq!(other.now(), start() + Duration::minutes(5));

        other.set(start());
        assert_eq!(clock.now(), start());
    }

    #[test]
    fn manual_clock_issues_sequential_tx_ids() {
        let clock = ManualClock::new(start());
        assert_eq!(clock.next_tx_id().as_str(), "tx-1");
        assert_eq!(clock.next_tx_id().as_str(), "tx-2");
    }

    #[test]
    fn caller_ignores_empty_tenant_attribute() {
        let caller = Caller::from_attributes("SellerOrgMSP", Some(String::new()));
        assert!(caller.tenant().is_none());

        let caller = Caller::from_attributes("SellerOrgMSP", Some("SHOP-A".to_string()));
        assert_eq!(caller.tenant().map(TenantId::as_str), Some("SHOP-A"));
    }

    #[test]
    fn issue_uses_clock() {
        let clock = ManualClock::new(start());
        let ctx = TxContext::issue(&clock, Caller::new("ShipperOrgMSP"));

        assert_eq!(ctx.timestamp(), start());
        assert_eq!(ctx.tx_id().as_str(), "tx-1");
        assert_eq!(ctx.caller().org().as_str(), "ShipperOrgMSP");
    }
}
