use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderStatusType};

/// Inserts the order and all of its line items. This is not atomic on its own. Embed the call in a transaction and
/// pass `&mut *tx` as the connection to get an all-or-nothing insert.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<(Order, Vec<OrderItem>), sqlx::Error> {
    let NewOrder { user_id, total, items } = order;
    let order: Order = sqlx::query_as("INSERT INTO orders (user_id, total) VALUES ($1, $2) RETURNING *")
        .bind(user_id)
        .bind(total)
        .fetch_one(&mut *conn)
        .await?;
    let mut saved = Vec::with_capacity(items.len());
    for item in items {
        saved.push(insert_order_item(order.id, item, conn).await?);
    }
    debug!("🗃️ Order {} for user {user_id} saved with {} items, total {total}", order.id, saved.len());
    Ok((order, saved))
}

async fn insert_order_item(
    order_id: OrderId,
    item: NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Touches the order row. Run as the first statement of a transaction, this acquires the write lock, so that
/// everything read afterwards reflects the latest committed state. Returns `false` if the order does not exist.
pub async fn lock_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET updated_at = CURRENT_TIMESTAMP WHERE id = $1")
        .bind(order_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Lock on order {order_id} acquired");
    Ok(result.rows_affected() == 1)
}

pub async fn update_order_status(
    order_id: OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status)
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Order {order_id} status set to {status}");
    Ok(order)
}
