use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Utc};
use common::{OrderId, OrgId};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{
    Aggregate, Caller, CreateOrder, Order, OrderAction, OrderService, PaymentMethod,
    SettlementPolicy, SystemClock, TxContext,
};
use ledger::{InMemoryLedger, RichQuery};

const SELLER: &str = "SellerOrgMSP";
const SHIPPER: &str = "ShipperOrgMSP";
const PLATFORM: &str = "ECommercePlatformOrgMSP";

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn next_order_id() -> String {
    format!("ORD-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

fn ctx(org: &str) -> TxContext {
    TxContext::issue(&SystemClock, Caller::new(org))
}

/// Settlement policy without time locks, so a full cycle can run back to back.
fn instant_policy() -> SettlementPolicy {
    SettlementPolicy::new(Duration::zero(), Duration::minutes(5))
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = OrderService::new(InMemoryLedger::new());

    c.bench_function("domain/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cmd = CreateOrder::new(next_order_id(), PaymentMethod::Prepaid);
                service.create_order(&ctx(SELLER), cmd).await.unwrap();
            });
        });
    });
}

fn bench_full_prepaid_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = OrderService::with_config(
        InMemoryLedger::new(),
        Default::default(),
        instant_policy(),
    );

    c.bench_function("domain/full_prepaid_cycle", |b| {
        b.iter(|| {
            rt.block_on(async {
                let id = next_order_id();
                let cmd = CreateOrder::new(id.as_str(), PaymentMethod::Prepaid);
                service.create_order(&ctx(SELLER), cmd).await.unwrap();

                let order_id = OrderId::new(id);
                service
                    .confirm_payment(&ctx(PLATFORM), &order_id)
                    .await
                    .unwrap();
                service.ship_order(&ctx(SHIPPER), &order_id).await.unwrap();
                service
                    .confirm_delivery(&ctx(SHIPPER), &order_id)
                    .await
                    .unwrap();
                service
                    .payout_to_seller(&ctx(PLATFORM), &order_id)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_decide(c: &mut Criterion) {
    let ctx = ctx(SELLER);
    let cmd = CreateOrder::new("ORD-BENCH", PaymentMethod::Cod);
    let mut order = Order::create(&ctx, &OrgId::new(SHIPPER), cmd).unwrap();
    order.record(&ctx, Order::creation_action());
    let policy = SettlementPolicy::default();
    let now = Utc::now();

    c.bench_function("domain/decide", |b| {
        b.iter(|| order.decide(OrderAction::ShipOrder, now, &policy).unwrap());
    });
}

fn bench_query_orders(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("domain/query_orders");

    for count in [100, 1_000] {
        let service = OrderService::new(InMemoryLedger::new());
        rt.block_on(async {
            for i in 0..count {
                let method = if i % 2 == 0 {
                    PaymentMethod::Prepaid
                } else {
                    PaymentMethod::Cod
                };
                let cmd = CreateOrder::new(format!("ORD-{i}"), method);
                service.create_order(&ctx(SELLER), cmd).await.unwrap();
            }
        });
        let query = RichQuery::new()
            .field("docType", "Order")
            .field("paymentMethod", "COD");

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    service.query_orders(&ctx(PLATFORM), &query).await.unwrap();
                });
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_create_order,
    bench_full_prepaid_cycle,
    bench_decide,
    bench_query_orders
);
criterion_main!(benches);
