mod support;

use futures_util::future::join_all;
use log::*;
use marketplace_engine::{
    db_types::{NewProduct, NewUser, OrderStatusType, PaymentStatus, Role},
    traits::{CatalogManagement, SettlementError},
};
use mkp_common::Money;
use support::TestMarketplace;

const NUM_BUYERS: usize = 6;

/// Every buyer holds one unit of a product in their cart, but only one more unit is left in stock. When all the
/// orders are confirmed at once, exactly one settlement may succeed.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settlements_race_for_the_last_unit() {
    let m = TestMarketplace::new().await;
    let f = m.fixture.clone();
    let stock = NUM_BUYERS as i64 + 1;
    let product =
        m.db.insert_product(NewProduct::new(f.seller_a.id, "Limited edition", Money::from_units(20), stock)).await.unwrap();
    let mut orders = Vec::with_capacity(NUM_BUYERS);
    for i in 0..NUM_BUYERS {
        let buyer = m
            .db
            .insert_user(NewUser::new(format!("Buyer {i}"), format!("buyer{i}@marketplace.test"), Role::Customer))
            .await
            .unwrap();
        orders.push(m.place_order(buyer.id, &[(product.id, 1)]).await);
    }
    assert_eq!(m.stock(product.id).await, 1);

    info!("🚀️ Confirming {NUM_BUYERS} orders concurrently");
    let api = m.settlement();
    let results = join_all(orders.iter().map(|o| api.confirm_payment(o.order_id()))).await;

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "Exactly one settlement should succeed");
    for result in &results {
        match result {
            Ok(order) => assert_eq!(order.status(), OrderStatusType::Paid),
            Err(SettlementError::InsufficientStock { product_id, available, .. }) => {
                assert_eq!(*product_id, product.id);
                assert_eq!(*available, 0);
            },
            Err(e) => panic!("Unexpected error: {e}"),
        }
    }
    assert_eq!(m.stock(product.id).await, 0);
    for order in &orders {
        let status = m.payment_status(order.order_id()).await;
        let paid = m.checkout_api().order_result(order.order_id()).await.unwrap().status() == OrderStatusType::Paid;
        assert_eq!(status == PaymentStatus::Confirmed, paid);
    }
    assert_eq!(m.balance(f.seller_a.id).await, Money::from_units(18));
    assert_eq!(m.balance(m.admin()).await, Money::from_units(2));
    m.teardown().await;
}

/// Two confirmations for the same order at the same time: one settles, the other sees a confirmed payment.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_confirmations_settle_once() {
    let m = TestMarketplace::new().await;
    let f = m.fixture.clone();
    let order = m.place_order(f.customer.id, &[(f.product_a.id, 1), (f.product_b.id, 1)]).await;
    let api = m.settlement();
    let id = order.order_id();
    let results = join_all((0..4).map(|_| api.confirm_payment(id))).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for result in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(result, SettlementError::PaymentAlreadyProcessed(_, PaymentStatus::Confirmed)));
    }
    assert_eq!(m.balance(m.admin()).await, Money::from_units(15));
    assert_eq!(m.balance(f.seller_a.id).await, Money::from_units(90));
    assert_eq!(m.balance(f.seller_b.id).await, Money::from_units(45));
    assert!(m.ledger().audit_all().await.unwrap().iter().all(|a| a.is_consistent()));
    m.teardown().await;
}

/// Wallet audits run while orders are being settled. Each audit reads a wallet and its entries from one snapshot, so
/// it never sees a balance without the entry that produced it.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn audits_during_settlements_are_always_consistent() {
    let m = TestMarketplace::new().await;
    let f = m.fixture.clone();
    let product =
        m.db.insert_product(NewProduct::new(f.seller_a.id, "Sticker", Money::from_units(3), 100)).await.unwrap();
    let api = m.settlement();
    let first = m.place_order(f.customer.id, &[(product.id, 1)]).await;
    api.confirm_payment(first.order_id()).await.expect("settlement failed");
    let mut orders = Vec::with_capacity(NUM_BUYERS);
    for i in 0..NUM_BUYERS {
        let buyer = m
            .db
            .insert_user(NewUser::new(format!("Buyer {i}"), format!("buyer{i}@marketplace.test"), Role::Customer))
            .await
            .unwrap();
        orders.push(m.place_order(buyer.id, &[(product.id, 2)]).await);
    }

    info!("🚀️ Auditing wallets while {NUM_BUYERS} orders settle");
    let ledger = m.ledger();
    let settle = join_all(orders.iter().map(|o| api.confirm_payment(o.order_id())));
    let audit = async {
        let mut audits = Vec::new();
        for _ in 0..20 {
            audits.extend(ledger.audit_all().await.expect("audit failed"));
            tokio::task::yield_now().await;
        }
        audits
    };
    let (results, audits) = tokio::join!(settle, audit);

    assert!(results.iter().all(|r| r.is_ok()));
    for audit in &audits {
        assert!(audit.is_consistent(), "Inconsistent audit: {audit:?}");
    }
    let expected = Money::from_units(3).checked_mul(1 + 2 * NUM_BUYERS as i64).unwrap();
    let total: Money = ledger.audit_all().await.unwrap().iter().map(|a| a.ledger_total).sum();
    assert_eq!(total, expected);
    m.teardown().await;
}
