use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{Cart, CartId, CartItem, CartLine, ProductId, UserId};

/// Returns the user's cart, creating an empty one first if necessary. Idempotent, thanks to the uniqueness constraint
/// on `carts.user_id`.
pub async fn fetch_or_create_cart(user_id: UserId, conn: &mut SqliteConnection) -> Result<Cart, sqlx::Error> {
    let inserted = sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    if inserted.rows_affected() > 0 {
        debug!("🗃️ New cart created for user {user_id}");
    }
    let cart = sqlx::query_as("SELECT * FROM carts WHERE user_id = $1").bind(user_id).fetch_one(conn).await?;
    Ok(cart)
}

pub async fn fetch_cart(cart_id: CartId, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    let cart = sqlx::query_as("SELECT * FROM carts WHERE id = $1").bind(cart_id).fetch_optional(conn).await?;
    Ok(cart)
}

pub async fn fetch_cart_for_user(user_id: UserId, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    let cart = sqlx::query_as("SELECT * FROM carts WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(cart)
}

/// The user's cart items joined with each product's current price, in the order they were added.
pub async fn fetch_cart_lines(user_id: UserId, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let lines = sqlx::query_as(
        r#"
            SELECT ci.cart_id, ci.product_id, ci.quantity, p.price AS unit_price
            FROM cart_items ci
            JOIN carts c ON c.id = ci.cart_id
            JOIN products p ON p.id = ci.product_id
            WHERE c.user_id = $1
            ORDER BY ci.id
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

pub async fn fetch_cart_items(cart_id: CartId, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let items =
        sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY id").bind(cart_id).fetch_all(conn).await?;
    Ok(items)
}

/// Adds `quantity` units of the product to the cart, merging with an existing item for the same product.
pub async fn upsert_item(
    cart_id: CartId,
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity
            RETURNING *;
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

/// Deletes the item if it holds no more than `quantity` units, returning the deleted row.
pub async fn delete_item_if_at_most(
    cart_id: CartId,
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    let item = sqlx::query_as(
        "DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2 AND quantity <= $3 RETURNING *",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

/// Reduces the item's quantity by `quantity`, returning the updated row. The caller must make sure that the item holds
/// more than `quantity` units.
pub async fn reduce_item(
    cart_id: CartId,
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    let item = sqlx::query_as(
        "UPDATE cart_items SET quantity = quantity - $1 WHERE cart_id = $2 AND product_id = $3 RETURNING *",
    )
    .bind(quantity)
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

pub async fn delete_item(
    cart_id: CartId,
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    let item = sqlx::query_as("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2 RETURNING *")
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

/// Deletes every item in the cart. Returns the number of items removed.
pub async fn clear_cart(cart_id: CartId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(cart_id).execute(conn).await?;
    trace!("🗃️ Cleared {} items from cart {cart_id}", result.rows_affected());
    Ok(result.rows_affected())
}

/// Deletes every item in the user's cart. A user without a cart is not an error; zero is returned.
pub async fn clear_cart_for_user(user_id: UserId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE user_id = $1)")
        .bind(user_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Cleared {} items from the cart of user {user_id}", result.rows_affected());
    Ok(result.rows_affected())
}
