use thiserror::Error;

use crate::db_types::{Cart, CartId, CartItem, CartLine, ProductId, UserId};

/// Shopping cart storage.
///
/// Adding a product to a cart reserves stock: the product's stock is decremented in the same transaction that
/// records the cart item. Decrementing or deleting an item releases the reservation again. Stock updates use the
/// same single-statement guarded decrement as settlement.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Fetches the user's cart, creating an empty one if the user does not have one yet.
    async fn fetch_or_create_cart(&self, user_id: UserId) -> Result<Cart, CartError>;

    async fn fetch_cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, CartError>;

    /// The items in the user's cart, each joined with the product's current price. Items are ordered by when they were
    /// first added. If the user has no cart, the result is empty.
    async fn fetch_cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, CartError>;

    async fn fetch_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, CartError>;

    /// Adds `quantity` units of the product to the cart and reserves them from stock.
    async fn add_product(&self, cart_id: CartId, product_id: ProductId, quantity: i64) -> Result<CartItem, CartError>;

    /// Removes up to `quantity` units of the product from the cart and returns them to stock. If the item's quantity
    /// drops to zero, the item is removed and `None` is returned.
    async fn decrement_product(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartError>;

    /// Removes the item from the cart entirely and returns its units to stock.
    async fn delete_cart_item(&self, cart_id: CartId, product_id: ProductId) -> Result<CartItem, CartError>;

    /// Deletes every item in the cart without touching stock. Returns the number of items removed.
    async fn clear_cart(&self, cart_id: CartId) -> Result<u64, CartError>;
}

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cart {0} does not exist")]
    CartNotFound(CartId),
    #[error("User {0} does not have a cart")]
    NoCartForUser(UserId),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Product {0} is not in cart {1}")]
    ItemNotFound(ProductId, CartId),
    #[error("Insufficient stock for product {product_id}. Requested {requested}, available {available}")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}
