use thiserror::Error;

use crate::{
    db_types::{OrderId, PaymentStatus, ProductId, UserId},
    mkp_api::settlement_objects::Settlement,
    traits::is_lock_timeout,
};

/// Order settlement.
#[allow(async_fn_in_trait)]
pub trait SettlementManagement {
    /// Settles the order in a single atomic transaction:
    ///
    /// 1. Locks and loads the order, its payment and its line items.
    /// 2. Requires the payment to exist and to be `INITIATED`, then marks it `CONFIRMED`.
    /// 3. Re-reads each product and decrements its stock by the ordered quantity, failing if the product is gone or
    ///    has too little stock.
    /// 4. Splits each line's gross value into the platform fee and the seller's share, and aggregates shares per
    ///    seller.
    /// 5. Resolves the platform account. If `platform_account` is given, that user must exist and be an admin.
    ///    Otherwise the admin with the lowest id is used.
    /// 6. Creates the platform account's wallet if needed, then credits it with a positive fee and every seller with
    ///    a positive share. Each credit creates the wallet if needed, appends a ledger entry and increments the
    ///    balance by the same amount.
    /// 7. Marks the order `PAID` and deletes every item in the buyer's cart.
    ///
    /// Any failure rolls the whole transaction back. Nothing is persisted unless every step succeeds.
    async fn settle_order(
        &self,
        order_id: OrderId,
        platform_account: Option<UserId>,
    ) -> Result<Settlement, SettlementError>;

    /// The status of the order's payment, or `None` if the order has no payment.
    async fn fetch_payment_status(&self, order_id: OrderId) -> Result<Option<PaymentStatus>, SettlementError>;
}

/// The broad class of a settlement failure. Callers use this to decide how to respond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced record is missing. Not retried.
    NotFound,
    /// The payment was already settled. A duplicate or late confirmation, which callers may treat as a no-op.
    StateConflict,
    /// Not enough stock to fill the order.
    Capacity,
    /// Lock contention or a timeout. Nothing was committed, so the whole settlement can be retried.
    Transient,
    /// The system is misconfigured, e.g. there is no admin account. Needs operator attention.
    Configuration,
    /// Any other storage failure.
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("There is no payment for order {0}")]
    PaymentNotFound(OrderId),
    #[error("The payment for order {0} has already been processed (status {1})")]
    PaymentAlreadyProcessed(OrderId, PaymentStatus),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Insufficient stock for product {product_id}. Ordered {requested}, available {available}")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("There is no admin account to receive the platform fee")]
    NoAdminAccount,
    #[error("A line total of order {0} is too large to be represented")]
    AmountOverflow(OrderId),
    #[error("Timed out waiting for the database lock. {0}")]
    LockWaitTimeout(String),
    /// The deadline fired before the settlement reported back. A commit already handed to the database when the
    /// deadline fired can still land, so the payment status is checked before this error is returned.
    #[error("Settlement did not complete within {0}ms and was rolled back")]
    ExecutionTimeout(u128),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl SettlementError {
    pub fn kind(&self) -> ErrorKind {
        use SettlementError::*;
        match self {
            OrderNotFound(_) | PaymentNotFound(_) | ProductNotFound(_) => ErrorKind::NotFound,
            PaymentAlreadyProcessed(..) => ErrorKind::StateConflict,
            InsufficientStock { .. } => ErrorKind::Capacity,
            LockWaitTimeout(_) | ExecutionTimeout(_) => ErrorKind::Transient,
            NoAdminAccount => ErrorKind::Configuration,
            AmountOverflow(_) | DatabaseError(_) => ErrorKind::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        if is_lock_timeout(&e) {
            SettlementError::LockWaitTimeout(e.to_string())
        } else {
            SettlementError::DatabaseError(e.to_string())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classification() {
        let oid = OrderId(1);
        assert_eq!(SettlementError::OrderNotFound(oid).kind(), ErrorKind::NotFound);
        assert_eq!(SettlementError::PaymentNotFound(oid).kind(), ErrorKind::NotFound);
        assert_eq!(SettlementError::ProductNotFound(ProductId(2)).kind(), ErrorKind::NotFound);
        assert_eq!(
            SettlementError::PaymentAlreadyProcessed(oid, PaymentStatus::Confirmed).kind(),
            ErrorKind::StateConflict
        );
        let err = SettlementError::InsufficientStock { product_id: ProductId(2), requested: 3, available: 1 };
        assert_eq!(err.kind(), ErrorKind::Capacity);
        assert_eq!(SettlementError::NoAdminAccount.kind(), ErrorKind::Configuration);
        assert_eq!(SettlementError::DatabaseError("boom".into()).kind(), ErrorKind::Internal);
        assert_eq!(SettlementError::AmountOverflow(oid).kind(), ErrorKind::Internal);
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(SettlementError::ExecutionTimeout(15_000).is_retryable());
        assert!(SettlementError::LockWaitTimeout("busy".into()).is_retryable());
        assert!(!SettlementError::NoAdminAccount.is_retryable());
        assert!(!SettlementError::PaymentAlreadyProcessed(OrderId(1), PaymentStatus::Confirmed).is_retryable());
    }

    #[test]
    fn pool_timeout_is_a_lock_timeout() {
        let err = SettlementError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, SettlementError::LockWaitTimeout(_)));
        let err = SettlementError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, SettlementError::DatabaseError(_)));
    }
}
