use mkp_common::Money;

use crate::{
    db_types::{NewProduct, NewUser, Product, Role, User},
    traits::{CatalogError, CatalogManagement},
};

/// A small marketplace: one admin, two sellers with one product each, and a customer.
///
/// Seller A sells a product at 100.00 and seller B sells one at 50.00. Both start with 10 units in stock.
#[derive(Debug, Clone)]
pub struct MarketplaceFixture {
    pub admin: Option<User>,
    pub seller_a: User,
    pub seller_b: User,
    pub customer: User,
    pub product_a: Product,
    pub product_b: Product,
}

impl MarketplaceFixture {
    pub async fn seed<B: CatalogManagement>(db: &B) -> Result<Self, CatalogError> {
        let admin = db.insert_user(NewUser::new("Admin", "admin@marketplace.test", Role::Admin)).await?;
        let mut fixture = Self::seed_without_admin(db).await?;
        fixture.admin = Some(admin);
        Ok(fixture)
    }

    /// As [`Self::seed`], but no admin account is created.
    pub async fn seed_without_admin<B: CatalogManagement>(db: &B) -> Result<Self, CatalogError> {
        let seller_a = db.insert_user(NewUser::new("Alice", "alice@marketplace.test", Role::Seller)).await?;
        let seller_b = db.insert_user(NewUser::new("Bob", "bob@marketplace.test", Role::Seller)).await?;
        let customer = db.insert_user(NewUser::new("Carol", "carol@marketplace.test", Role::Customer)).await?;
        let product_a = db.insert_product(NewProduct::new(seller_a.id, "Teapot", Money::from_units(100), 10)).await?;
        let product_b = db.insert_product(NewProduct::new(seller_b.id, "Kettle", Money::from_units(50), 10)).await?;
        Ok(Self { admin: None, seller_a, seller_b, customer, product_a, product_b })
    }
}
