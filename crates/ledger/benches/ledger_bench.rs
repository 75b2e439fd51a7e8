use criterion::{Criterion, criterion_group, criterion_main};
use ledger::{InMemoryLedger, Ledger, RichQuery};
use serde_json::json;

fn order_doc(i: usize) -> Vec<u8> {
    let status = if i % 3 == 0 { "DELIVERED" } else { "CREATED" };
    serde_json::to_vec(&json!({
        "docType": "Order",
        "orderID": format!("ORD-{i}"),
        "status": status,
        "sellerTenantID": format!("SHOP-{}", i % 10),
    }))
    .unwrap()
}

fn bench_put(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InMemoryLedger::new();
    let value = order_doc(1);

    c.bench_function("ledger/put", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.put("ORD-BENCH", value.clone()).await.unwrap();
            });
        });
    });
}

fn bench_query(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InMemoryLedger::new();
    rt.block_on(async {
        for i in 0..1_000 {
            ledger
                .put(&format!("ORD-{i:05}"), order_doc(i))
                .await
                .unwrap();
        }
    });

    let query = RichQuery::new()
        .field("docType", "Order")
        .field("status", "DELIVERED");

    c.bench_function("ledger/query_1000_docs", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.query(&query).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_put, bench_query);
criterion_main!(benches);
