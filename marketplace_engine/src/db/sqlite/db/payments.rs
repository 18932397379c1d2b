use log::{debug, trace};
use mkp_common::Money;
use sqlx::SqliteConnection;

use crate::db_types::{OrderId, Payment, PaymentId, PaymentStatus};

/// Creates the payment for an order with status `INITIATED`. Fails with a unique violation if the order already has a
/// payment.
pub async fn insert_payment(
    order_id: OrderId,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment: Payment = sqlx::query_as("INSERT INTO payments (order_id, amount) VALUES ($1, $2) RETURNING *")
        .bind(order_id)
        .bind(amount)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Payment {} of {amount} initiated for order {order_id}", payment.id);
    Ok(payment)
}

pub async fn fetch_payment_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn update_payment_status(
    payment_id: PaymentId,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        "UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status)
    .bind(payment_id)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Payment {payment_id} status set to {status}");
    Ok(payment)
}
