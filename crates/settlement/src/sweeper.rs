//! Scheduled payout of delivered orders.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Caller, Clock, ErrorKind, OrderService, PayoutReadiness, Role, TxContext};
use ledger::{Ledger, RichQuery};
use tokio::time::MissedTickBehavior;

use crate::error::{Result, SettlementError};

/// An order the sweeper tried to settle and could not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub order_id: OrderId,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of one sweep, one bucket per candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Orders moved to SETTLED by this sweep.
    pub settled: Vec<OrderId>,
    /// Orders still inside their payout time lock.
    pub locked: Vec<(OrderId, DateTime<Utc>)>,
    /// Delivered orders that cannot be paid out yet, e.g. unremitted COD.
    pub ineligible: Vec<OrderId>,
    pub failed: Vec<SweepFailure>,
}

impl SweepReport {
    /// Number of orders examined.
    pub fn examined(&self) -> usize {
        self.settled.len() + self.locked.len() + self.ineligible.len() + self.failed.len()
    }
}

/// Settles delivered orders once their payout time lock has passed.
pub struct PayoutSweeper<L: Ledger> {
    service: Arc<OrderService<L>>,
    clock: Arc<dyn Clock>,
}

impl<L: Ledger> PayoutSweeper<L> {
    pub fn new(service: Arc<OrderService<L>>, clock: Arc<dyn Clock>) -> Self {
        Self { service, clock }
    }

    fn platform_context(&self) -> TxContext {
        let platform = self.service.organizations().org_for(Role::Platform).clone();
        TxContext::issue(self.clock.as_ref(), Caller::new(platform))
    }

    /// Runs one sweep over every delivered order.
    ///
    /// Only a failing candidate query aborts the sweep.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self) -> Result<SweepReport> {
        let query = RichQuery::new()
            .field("docType", "Order")
            .field("status", "DELIVERED");
        let ctx = self.platform_context();
        let candidates = self.service.query_orders(&ctx, &query).await?;

        let mut report = SweepReport::default();
        for candidate in candidates {
            let order = candidate.record;
            let order_id = order.order_id().clone();

            match self.service.policy().payout_readiness(&order, ctx.timestamp()) {
                PayoutReadiness::Locked { unlocks_at } => {
                    report.locked.push((order_id, unlocks_at));
                }
                PayoutReadiness::NotEligible { reason } => {
                    tracing::debug!(%order_id, %reason, "order not eligible for payout");
                    report.ineligible.push(order_id);
                }
                PayoutReadiness::Ready => {
                    let ctx = self.platform_context();
                    match self.service.payout_to_seller(&ctx, &order_id).await {
                        Ok(_) => report.settled.push(order_id),
                        Err(e) => report.failed.push(SweepFailure {
                            order_id,
                            kind: e.kind(),
                            message: e.to_string(),
                        }),
                    }
                }
            }
        }

        metrics::counter!("payout_sweeps_total").increment(1);
        metrics::counter!("payout_sweep_orders_total", "outcome" => "settled")
            .increment(report.settled.len() as u64);
        metrics::counter!("payout_sweep_orders_total", "outcome" => "failed")
            .increment(report.failed.len() as u64);

        tracing::info!(
            examined = report.examined(),
            settled = report.settled.len(),
            locked = report.locked.len(),
            ineligible = report.ineligible.len(),
            failed = report.failed.len(),
            "payout sweep finished"
        );
        Ok(report)
    }

    /// Sweeps every `period` until the task is dropped or aborted.
    ///
    /// The first sweep runs immediately. A failed sweep is logged and the
    /// loop carries on.
    pub async fn run_every(&self, period: std::time::Duration) -> Result<()> {
        if period.is_zero() {
            return Err(SettlementError::InvalidInterval(period));
        }

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(period_secs = period.as_secs(), "payout sweeper started");

        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep().await {
                tracing::error!(error = %e, "payout sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_every_bucket() {
        let report = SweepReport {
            settled: vec![OrderId::new("A")],
            locked: vec![(OrderId::new("B"), Utc::now())],
            ineligible: vec![OrderId::new("C"), OrderId::new("D")],
            failed: vec![],
        };
        assert_eq!(report.examined(), 4);
        assert_eq!(SweepReport::default().examined(), 0);
    }
}
