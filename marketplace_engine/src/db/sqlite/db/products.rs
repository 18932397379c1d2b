use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product, ProductId};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (owner_id, title, price, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(product.owner_id)
    .bind(product.title)
    .bind(product.price)
    .bind(product.stock)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product {} '{}' created for seller {}", product.id, product.title, product.owner_id);
    Ok(product)
}

pub async fn fetch_product(product_id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Takes `quantity` units out of stock in a single guarded statement. Returns `false`, leaving stock untouched, if the
/// product does not exist or has fewer than `quantity` units.
pub async fn decrement_stock(
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND stock >= $1
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .execute(conn)
    .await?;
    let applied = result.rows_affected() == 1;
    trace!("🗃️ Decrement stock of product {product_id} by {quantity}: applied = {applied}");
    Ok(applied)
}

/// Returns `quantity` units to stock.
pub async fn increment_stock(
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(quantity)
        .bind(product_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Released {quantity} units of product {product_id} back to stock");
    Ok(())
}
