//! Settlement time locks.
//!
//! Delivery starts two clocks: the seller payout stays locked for
//! `payout_delay`, and the buyer may request a return until `return_window`
//! has passed. Both boundaries are inclusive.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::order::{CodStatus, Order, OrderError, OrderStatus, PaymentMethod};

/// A named pair of settlement durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettlementProfile {
    /// Seven day payout lock and return window.
    #[default]
    Production,

    /// Five minute payout lock and return window, for demos.
    Demo,
}

impl SettlementProfile {
    pub fn policy(&self) -> SettlementPolicy {
        match self {
            SettlementProfile::Production => {
                SettlementPolicy::new(Duration::days(7), Duration::days(7))
            }
            SettlementProfile::Demo => {
                SettlementPolicy::new(Duration::minutes(5), Duration::minutes(5))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementProfile::Production => "production",
            SettlementProfile::Demo => "demo",
        }
    }
}

/// A profile name that is neither `production` nor `demo`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown settlement profile {0:?} (expected production or demo)")]
pub struct UnknownProfile(pub String);

impl FromStr for SettlementProfile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(SettlementProfile::Production),
            "demo" => Ok(SettlementProfile::Demo),
            _ => Err(UnknownProfile(s.trim().to_string())),
        }
    }
}

impl std::fmt::Display for SettlementProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a delivered order can be paid out right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "readiness", rename_all = "snake_case")]
pub enum PayoutReadiness {
    Ready,
    Locked { unlocks_at: DateTime<Utc> },
    NotEligible { reason: String },
}

/// Payout lock and return window durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementPolicy {
    payout_delay: Duration,
    return_window: Duration,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        SettlementProfile::default().policy()
    }
}

impl SettlementPolicy {
    pub fn new(payout_delay: Duration, return_window: Duration) -> Self {
        Self {
            payout_delay,
            return_window,
        }
    }

    pub fn payout_delay(&self) -> Duration {
        self.payout_delay
    }

    pub fn return_window(&self) -> Duration {
        self.return_window
    }

    /// Returns a copy with a different payout delay.
    pub fn with_payout_delay(mut self, delay: Duration) -> Self {
        self.payout_delay = delay;
        self
    }

    /// Returns a copy with a different return window.
    pub fn with_return_window(mut self, window: Duration) -> Self {
        self.return_window = window;
        self
    }

    /// First instant at which payout is allowed.
    pub fn payout_unlocks_at(&self, delivered_at: DateTime<Utc>) -> DateTime<Utc> {
        delivered_at
            .checked_add_signed(self.payout_delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Last instant at which a return may be requested.
    pub fn return_deadline(&self, delivered_at: DateTime<Utc>) -> DateTime<Utc> {
        delivered_at
            .checked_add_signed(self.return_window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Guards PayoutToSeller once status and COD checks have passed.
    pub fn check_payout(
        &self,
        delivered_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        let delivered_at = delivered_at.ok_or(OrderError::MissingDeliveryTimestamp {
            action: "PayoutToSeller",
        })?;
        let unlocks_at = self.payout_unlocks_at(delivered_at);
        if now < unlocks_at {
            return Err(OrderError::TooEarly { unlocks_at, now });
        }
        Ok(())
    }

    /// Guards RequestReturn once the status check has passed.
    pub fn check_return(
        &self,
        delivered_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        let delivered_at = delivered_at.ok_or(OrderError::MissingDeliveryTimestamp {
            action: "RequestReturn",
        })?;
        let deadline = self.return_deadline(delivered_at);
        if now > deadline {
            return Err(OrderError::ReturnWindowExpired { deadline, now });
        }
        Ok(())
    }

    /// Classifies an order for the payout sweep without touching it.
    pub fn payout_readiness(&self, order: &Order, now: DateTime<Utc>) -> PayoutReadiness {
        if order.status() != OrderStatus::Delivered {
            return PayoutReadiness::NotEligible {
                reason: format!("status is {}", order.status()),
            };
        }
        if order.payment_method() == PaymentMethod::Cod
            && order.cod_status() != CodStatus::Remitted
        {
            return PayoutReadiness::NotEligible {
                reason: format!("cod status is {}", order.cod_status()),
            };
        }
        let Some(delivered_at) = order.delivery_timestamp() else {
            return PayoutReadiness::NotEligible {
                reason: "no delivery timestamp".to_string(),
            };
        };

        let unlocks_at = self.payout_unlocks_at(delivered_at);
        if now < unlocks_at {
            PayoutReadiness::Locked { unlocks_at }
        } else {
            PayoutReadiness::Ready
        }
    }
}
