use cucumber::{then, when};
use marketplace_engine::{
    db_types::{OrderStatusType, PaymentStatus},
    traits::{CatalogManagement, LedgerManagement, SettlementError},
};
use mkp_common::Money;

use crate::cucumber::MarketplaceWorld;

fn error_name(e: &SettlementError) -> &'static str {
    use SettlementError::*;
    match e {
        OrderNotFound(_) => "OrderNotFound",
        PaymentNotFound(_) => "PaymentNotFound",
        PaymentAlreadyProcessed(..) => "PaymentAlreadyProcessed",
        ProductNotFound(_) => "ProductNotFound",
        InsufficientStock { .. } => "InsufficientStock",
        NoAdminAccount => "NoAdminAccount",
        LockWaitTimeout(_) => "LockWaitTimeout",
        ExecutionTimeout(_) => "ExecutionTimeout",
        AmountOverflow(_) => "AmountOverflow",
        DatabaseError(_) => "DatabaseError",
    }
}

#[when(expr = "{string} adds {int} {string} to the cart")]
async fn add_to_cart(world: &mut MarketplaceWorld, name: String, quantity: i64, title: String) {
    let (user, product) = (world.user(&name), world.product(&title));
    world.carts().add_to_cart(user, product, quantity).await.expect("Error adding to cart");
}

#[when(expr = "{string} checks out")]
async fn checkout(world: &mut MarketplaceWorld, name: String) {
    let user = world.user(&name);
    let order = world.checkout().checkout(user).await.expect("Error checking out");
    world.last_order = Some(order.order_id());
}

#[when("the payment provider confirms the last order")]
async fn confirm_payment(world: &mut MarketplaceWorld) {
    let order_id = world.last_order();
    world.last_error = world.settlement().confirm_payment(order_id).await.err();
}

#[then("the confirmation succeeds")]
async fn confirmation_succeeds(world: &mut MarketplaceWorld) {
    if let Some(e) = &world.last_error {
        panic!("Confirmation failed: {e}");
    }
}

#[then(expr = "the confirmation fails with {word}")]
async fn confirmation_fails(world: &mut MarketplaceWorld, expected: String) {
    let e = world.last_error.as_ref().expect("Confirmation succeeded");
    assert_eq!(error_name(e), expected, "Unexpected error: {e}");
}

#[then(expr = "the last order is {word}")]
async fn order_status(world: &mut MarketplaceWorld, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Invalid order status");
    let order = world.checkout().order_result(world.last_order()).await.expect("Error fetching order");
    assert_eq!(order.status(), expected);
}

#[then(expr = "the payment for the last order is {word}")]
async fn payment_status(world: &mut MarketplaceWorld, status: String) {
    let expected = status.parse::<PaymentStatus>().expect("Invalid payment status");
    let order = world.checkout().order_result(world.last_order()).await.expect("Error fetching order");
    assert_eq!(order.payment_status(), Some(expected));
}

#[then(expr = "the wallet of {string} holds {word}")]
async fn wallet_balance(world: &mut MarketplaceWorld, name: String, amount: String) {
    let expected = amount.parse::<Money>().expect("Invalid amount");
    let wallet = world.db().fetch_wallet_for_user(world.user(&name)).await.expect("Error fetching wallet");
    let balance = wallet.map(|w| w.balance).unwrap_or_default();
    assert_eq!(balance, expected, "Wallet balance of {name} is incorrect");
}

#[then("no wallets exist")]
async fn no_wallets(world: &mut MarketplaceWorld) {
    let wallets = world.ledger().wallets().await.expect("Error fetching wallets");
    assert!(wallets.is_empty(), "Expected no wallets, found {}", wallets.len());
}

#[then(expr = "the cart of {string} is empty")]
async fn cart_is_empty(world: &mut MarketplaceWorld, name: String) {
    let lines = world.carts().cart_lines(world.user(&name)).await.expect("Error fetching cart");
    assert!(lines.is_empty(), "Cart of {name} still has {} items", lines.len());
}

#[then(expr = "the cart of {string} has {int} items")]
async fn cart_has_items(world: &mut MarketplaceWorld, name: String, count: usize) {
    let lines = world.carts().cart_lines(world.user(&name)).await.expect("Error fetching cart");
    assert_eq!(lines.len(), count);
}

#[then(expr = "{string} has {int} in stock")]
async fn stock_level(world: &mut MarketplaceWorld, title: String, stock: i64) {
    let product = world.db().fetch_product(world.product(&title)).await.expect("Error fetching product");
    assert_eq!(product.expect("Product is missing").stock, stock);
}

#[then("every wallet balance matches its ledger")]
async fn ledger_consistency(world: &mut MarketplaceWorld) {
    let audits = world.ledger().audit_all().await.expect("Error auditing wallets");
    for audit in audits {
        assert!(audit.is_consistent(), "Wallet {} is off by {}", audit.wallet.id, audit.discrepancy());
    }
}
