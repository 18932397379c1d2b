mod support;

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

use marketplace_engine::{
    events::{EventHandlers, EventHooks, OrderCreatedEvent, OrderPaidEvent},
    CheckoutApi,
    SettlementApi,
    SettlementConfig,
};
use mkp_common::Money;
use support::TestMarketplace;

#[tokio::test]
async fn order_created_and_paid_hooks_fire() {
    let m = TestMarketplace::new().await;
    let f = m.fixture.clone();
    let created = Arc::new(Mutex::new(Vec::<OrderCreatedEvent>::new()));
    let paid = Arc::new(Mutex::new(Vec::<OrderPaidEvent>::new()));

    let mut hooks = EventHooks::default();
    let c = created.clone();
    hooks.on_order_created(move |ev| {
        let c = c.clone();
        Box::pin(async move {
            c.lock().unwrap().push(ev);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let p = paid.clone();
    hooks.on_order_paid(move |ev| {
        let p = p.clone();
        Box::pin(async move {
            p.lock().unwrap().push(ev);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(8, hooks);
    let producers = handlers.producers();
    let tasks = handlers.start_handlers();

    {
        let checkout = CheckoutApi::new(m.db.clone(), producers.clone());
        let settlement = SettlementApi::new(m.db.clone(), SettlementConfig::default(), producers);
        m.carts().add_to_cart(f.customer.id, f.product_a.id, 1).await.unwrap();
        let order = checkout.checkout(f.customer.id).await.unwrap();
        settlement.confirm_payment(order.order_id()).await.unwrap();
        // A failed confirmation publishes nothing
        assert!(settlement.confirm_payment(order.order_id()).await.is_err());
    }
    // Every producer has been dropped, so the handlers drain their queues and stop
    for task in tasks {
        task.await.unwrap();
    }

    let created = created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].order.total, Money::from_units(100));
    assert_eq!(created[0].payment.order_id, created[0].order.id);
    let paid = paid.lock().unwrap();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].result.order.id, created[0].order.id);
    assert_eq!(paid[0].payout.admin_fee, Money::from_units(10));
    assert_eq!(paid[0].payout.share_for(f.seller_a.id), Money::from_units(90));
    drop(created);
    drop(paid);
    m.teardown().await;
}
