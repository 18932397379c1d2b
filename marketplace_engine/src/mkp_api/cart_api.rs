use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Cart, CartItem, CartLine, ProductId, UserId},
    traits::{CartError, CartManagement},
};

/// User-scoped shopping cart operations. Adding to a cart reserves stock, removing releases it.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub async fn cart_for_user(&self, user_id: UserId) -> Result<Cart, CartError> {
        self.db.fetch_or_create_cart(user_id).await
    }

    /// The cart contents at current prices.
    pub async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, CartError> {
        self.db.fetch_cart_lines(user_id).await
    }

    pub async fn add_to_cart(&self, user_id: UserId, product_id: ProductId, quantity: i64) -> Result<CartItem, CartError> {
        let cart = self.db.fetch_or_create_cart(user_id).await?;
        let item = self.db.add_product(cart.id, product_id, quantity).await?;
        debug!("🛒️ User {user_id} added {quantity} x product {product_id} to their cart");
        Ok(item)
    }

    /// Removes up to `quantity` units. Returns the remaining item, or `None` if it was removed completely.
    pub async fn remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartError> {
        let cart = self.existing_cart(user_id).await?;
        self.db.decrement_product(cart.id, product_id, quantity).await
    }

    pub async fn delete_item(&self, user_id: UserId, product_id: ProductId) -> Result<CartItem, CartError> {
        let cart = self.existing_cart(user_id).await?;
        self.db.delete_cart_item(cart.id, product_id).await
    }

    /// Empties the cart. Reserved stock is not returned.
    pub async fn clear_cart(&self, user_id: UserId) -> Result<u64, CartError> {
        match self.db.fetch_cart_for_user(user_id).await? {
            Some(cart) => self.db.clear_cart(cart.id).await,
            None => Ok(0),
        }
    }

    async fn existing_cart(&self, user_id: UserId) -> Result<Cart, CartError> {
        self.db.fetch_cart_for_user(user_id).await?.ok_or(CartError::NoCartForUser(user_id))
    }
}
