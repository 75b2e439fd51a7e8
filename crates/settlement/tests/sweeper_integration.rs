//! Integration tests for the payout sweeper.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use common::OrderId;
use domain::{
    Caller, Clock, CreateOrder, ManualClock, OrderService, OrderStatus, Organizations,
    PaymentMethod, SettlementProfile, TxContext,
};
use ledger::InMemoryLedger;
use settlement::{PayoutSweeper, SettlementError};

const PLATFORM: &str = "ECommercePlatformOrgMSP";
const SELLER: &str = "SellerOrgMSP";
const SHIPPER: &str = "ShipperOrgMSP";

struct TestHarness {
    service: Arc<OrderService<InMemoryLedger>>,
    sweeper: PayoutSweeper<InMemoryLedger>,
    clock: ManualClock,
}

impl TestHarness {
    fn new() -> Self {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let service = Arc::new(OrderService::with_config(
            InMemoryLedger::new(),
            Organizations::default(),
            SettlementProfile::Demo.policy(),
        ));
        let sweeper = PayoutSweeper::new(service.clone(), Arc::new(clock.clone()));
        Self {
            service,
            sweeper,
            clock,
        }
    }

    fn ctx(&self, org: &str) -> TxContext {
        TxContext::issue(&self.clock, Caller::new(org))
    }

    async fn delivered_prepaid(&self, id: &str) -> OrderId {
        let order_id = OrderId::new(id);
        self.service
            .create_order(&self.ctx(SELLER), CreateOrder::new(id, PaymentMethod::Prepaid))
            .await
            .unwrap();
        self.service
            .confirm_payment(&self.ctx(PLATFORM), &order_id)
            .await
            .unwrap();
        self.service
            .ship_order(&self.ctx(SHIPPER), &order_id)
            .await
            .unwrap();
        self.service
            .confirm_delivery(&self.ctx(SHIPPER), &order_id)
            .await
            .unwrap();
        order_id
    }

    async fn delivered_cod(&self, id: &str) -> OrderId {
        let order_id = OrderId::new(id);
        self.service
            .create_order(&self.ctx(SELLER), CreateOrder::new(id, PaymentMethod::Cod))
            .await
            .unwrap();
        self.service
            .ship_order(&self.ctx(SHIPPER), &order_id)
            .await
            .unwrap();
        self.service
            .confirm_cod_delivery(&self.ctx(SHIPPER), &order_id)
            .await
            .unwrap();
        order_id
    }

    async fn status(&self, order_id: &OrderId) -> OrderStatus {
        self.service
            .get_order(&self.ctx(PLATFORM), order_id)
            .await
            .unwrap()
            .status()
    }
}

mod sweep {
    use super::*;

    #[tokio::test]
    async fn test_empty_ledger() {
        let harness = TestHarness::new();
        let report = harness.sweeper.sweep().await.unwrap();
        assert_eq!(report.examined(), 0);
    }

    #[tokio::test]
    async fn test_locked_orders_are_left_alone() {
        let harness = TestHarness::new();
        let delivered_at = harness.clock.now();
        let order_id = harness.delivered_prepaid("ORD-1").await;

        harness.clock.advance(Duration::minutes(4));
        let report = harness.sweeper.sweep().await.unwrap();

        assert!(report.settled.is_empty());
        assert_eq!(
            report.locked,
            vec![(order_id.clone(), delivered_at + Duration::minutes(5))]
        );
        assert_eq!(harness.status(&order_id).await, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn test_ready_orders_are_settled() {
        let harness = TestHarness::new();
        let order_id = harness.delivered_prepaid("ORD-1").await;

        harness.clock.advance(Duration::minutes(5));
        let report = harness.sweeper.sweep().await.unwrap();

        assert_eq!(report.settled, vec![order_id.clone()]);
        assert_eq!(harness.status(&order_id).await, OrderStatus::Settled);

        let order = harness
            .service
            .get_order(&harness.ctx(PLATFORM), &order_id)
            .await
            .unwrap();
        let last = order.history().last().unwrap();
        assert_eq!(last.action, "PayoutToSeller");
        assert_eq!(last.actor_org.as_str(), PLATFORM);

        // Settled orders are no longer candidates.
        let report = harness.sweeper.sweep().await.unwrap();
        assert_eq!(report.examined(), 0);
    }

    #[tokio::test]
    async fn test_unremitted_cod_is_ineligible() {
        let harness = TestHarness::new();
        let order_id = harness.delivered_cod("ORD-COD").await;
        harness.clock.advance(Duration::hours(1));

        let report = harness.sweeper.sweep().await.unwrap();
        assert_eq!(report.ineligible, vec![order_id.clone()]);

        harness
            .service
            .remit_cod(&harness.ctx(PLATFORM), &order_id)
            .await
            .unwrap();
        let report = harness.sweeper.sweep().await.unwrap();
        assert_eq!(report.settled, vec![order_id]);
    }

    #[tokio::test]
    async fn test_mixed_candidates() {
        let harness = TestHarness::new();
        let early = harness.delivered_prepaid("ORD-EARLY").await;
        harness.clock.advance(Duration::minutes(3));
        let late = harness.delivered_prepaid("ORD-LATE").await;
        let cod = harness.delivered_cod("ORD-COD").await;
        harness.clock.advance(Duration::minutes(3));

        let report = harness.sweeper.sweep().await.unwrap();

        assert_eq!(report.settled, vec![early]);
        let locked: Vec<_> = report.locked.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(locked, vec![late]);
        assert_eq!(report.ineligible, vec![cod]);
        assert!(report.failed.is_empty());
    }
}

mod schedule {
    use super::*;

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let harness = TestHarness::new();
        let result = harness.sweeper.run_every(std::time::Duration::ZERO).await;
        assert!(matches!(result, Err(SettlementError::InvalidInterval(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_sweep_settles_orders() {
        let harness = TestHarness::new();
        let order_id = harness.delivered_prepaid("ORD-1").await;
        harness.clock.advance(Duration::minutes(10));

        let sweeper = Arc::new(harness.sweeper);
        let task = {
            let sweeper = sweeper.clone();
            tokio::spawn(async move {
                sweeper
                    .run_every(std::time::Duration::from_secs(60))
                    .await
            })
        };

        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        task.abort();

        let order = harness
            .service
            .get_order(&TxContext::issue(&harness.clock, Caller::new(PLATFORM)), &order_id)
            .await
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Settled);
    }
}
