use cucumber::given;
use marketplace_engine::{
    db_types::{NewProduct, NewUser, Role},
    traits::CatalogManagement,
};
use mkp_common::Money;

use crate::cucumber::{marketplace_world::MarketplaceSystem, MarketplaceWorld};

#[given("a fresh marketplace")]
async fn fresh_database(world: &mut MarketplaceWorld) {
    let system = MarketplaceSystem::new().await;
    world.system = Some(system);
}

async fn add_user(world: &mut MarketplaceWorld, name: String, role: Role) {
    let email = format!("{name}@marketplace.test");
    let user = world.db().insert_user(NewUser::new(name.clone(), email, role)).await.expect("Error creating user");
    world.users.insert(name, user.id);
}

#[given(expr = "an admin account {string}")]
async fn admin_account(world: &mut MarketplaceWorld, name: String) {
    add_user(world, name, Role::Admin).await;
}

#[given(expr = "a seller {string}")]
async fn seller(world: &mut MarketplaceWorld, name: String) {
    add_user(world, name, Role::Seller).await;
}

#[given(expr = "a customer {string}")]
async fn customer(world: &mut MarketplaceWorld, name: String) {
    add_user(world, name, Role::Customer).await;
}

#[given(expr = "seller {string} lists {string} at {word} with {int} in stock")]
async fn list_product(world: &mut MarketplaceWorld, seller: String, title: String, price: String, stock: i64) {
    let owner = world.user(&seller);
    let price = price.parse::<Money>().expect("Invalid price");
    let product = world
        .db()
        .insert_product(NewProduct::new(owner, title.clone(), price, stock))
        .await
        .expect("Error creating product");
    world.products.insert(title, product.id);
}
