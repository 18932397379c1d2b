use mkp_common::Money;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, Payment, UserId},
    traits::{is_unique_violation, CartError},
};

/// Order and payment creation.
#[allow(async_fn_in_trait)]
pub trait CheckoutManagement {
    /// Creates the order and all its line items in a single atomic write. The new order has status `CREATED`.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderItem>), CheckoutError>;

    /// Creates the payment record for an order, with status `INITIATED`.
    ///
    /// At most one payment can exist per order. A second call for the same order fails with
    /// [`CheckoutError::PaymentAlreadyExists`].
    async fn initiate_payment(&self, order_id: OrderId, amount: Money) -> Result<Payment, CheckoutError>;

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, CheckoutError>;

    /// Line items for the order, in the order they were captured at checkout.
    async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, CheckoutError>;

    async fn fetch_payment_for_order(&self, order_id: OrderId) -> Result<Option<Payment>, CheckoutError>;
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("The cart for user {0} is empty or does not exist")]
    EmptyCart(UserId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("A payment already exists for order {0}")]
    PaymentAlreadyExists(OrderId),
    #[error("The cart total for user {0} is too large to be represented")]
    AmountOverflow(UserId),
    #[error("Could not persist the order. {0}")]
    PersistenceError(String),
}

impl CheckoutError {
    /// Maps a driver error raised while inserting the payment for `order_id`.
    pub(crate) fn from_payment_insert(order_id: OrderId, e: sqlx::Error) -> Self {
        if is_unique_violation(&e) {
            CheckoutError::PaymentAlreadyExists(order_id)
        } else {
            CheckoutError::PersistenceError(e.to_string())
        }
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutError::PersistenceError(e.to_string())
    }
}

impl From<CartError> for CheckoutError {
    fn from(e: CartError) -> Self {
        CheckoutError::PersistenceError(e.to_string())
    }
}
