use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, OrderId, UserId},
    events::{EventProducers, OrderCreatedEvent},
    mkp_api::settlement_objects::{CartSnapshot, OrderResult},
    traits::{CartManagement, CheckoutError, CheckoutManagement},
};

/// `CheckoutApi` turns a user's cart into an order with an initiated payment.
pub struct CheckoutApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> CheckoutApi<B>
where B: CartManagement + CheckoutManagement
{
    /// Reads the user's cart at current product prices. Nothing is written.
    ///
    /// Fails with [`CheckoutError::EmptyCart`] if the user has no cart, or the cart has no items, and with
    /// [`CheckoutError::AmountOverflow`] if the total cannot be represented.
    pub async fn cart_snapshot(&self, user_id: UserId) -> Result<CartSnapshot, CheckoutError> {
        let lines = self.db.fetch_cart_lines(user_id).await?;
        let snapshot = CartSnapshot::from_lines(user_id, &lines).ok_or_else(|| {
            warn!("🛍️ The cart total for user {user_id} overflows. Refusing to snapshot it");
            CheckoutError::AmountOverflow(user_id)
        })?;
        if snapshot.is_empty() {
            debug!("🛍️ User {user_id} has nothing in their cart");
            return Err(CheckoutError::EmptyCart(user_id));
        }
        trace!("🛍️ Cart snapshot for user {user_id}: {} items, total {}", snapshot.items.len(), snapshot.total);
        Ok(snapshot)
    }

    /// Creates an order from the user's cart, followed by a payment for the order total with status `INITIATED`.
    ///
    /// The cart is left as it is. It is cleared when the payment is settled.
    pub async fn checkout(&self, user_id: UserId) -> Result<OrderResult, CheckoutError> {
        let CartSnapshot { total, items, .. } = self.cart_snapshot(user_id).await?;
        let (order, items) = self.db.insert_order(NewOrder::new(user_id, total, items)).await?;
        let payment = self.db.initiate_payment(order.id, order.total).await?;
        info!("🛍️ Order {} created for user {user_id}. Payment {} of {} initiated", order.id, payment.id, payment.amount);
        for producer in &self.producers.order_created_producer {
            debug!("🛍️ Notifying order created hook subscribers");
            let event = OrderCreatedEvent::new(order.clone(), items.clone(), payment.clone());
            producer.publish_event(event).await;
        }
        Ok(OrderResult::new(order, items, Some(payment)))
    }

    /// Reads back an order with its line items and payment.
    pub async fn order_result(&self, order_id: OrderId) -> Result<OrderResult, CheckoutError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(CheckoutError::OrderNotFound(order_id))?;
        let items = self.db.fetch_order_items(order_id).await?;
        let payment = self.db.fetch_payment_for_order(order_id).await?;
        Ok(OrderResult::new(order, items, payment))
    }
}
