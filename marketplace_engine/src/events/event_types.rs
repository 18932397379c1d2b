use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderItem, Payment},
    mkp_api::settlement_objects::{OrderResult, PayoutSplit},
};

/// Emitted after checkout has created an order and initiated its payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Payment,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, items: Vec<OrderItem>, payment: Payment) -> Self {
        Self { order, items, payment }
    }
}

/// Emitted after a settlement has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub result: OrderResult,
    pub payout: PayoutSplit,
}

impl OrderPaidEvent {
    pub fn new(result: OrderResult, payout: PayoutSplit) -> Self {
        Self { result, payout }
    }
}
