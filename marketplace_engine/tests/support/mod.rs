#![allow(dead_code)]
use std::time::Duration;

use marketplace_engine::{
    db_types::{OrderId, PaymentStatus, ProductId, UserId},
    events::EventProducers,
    settlement_objects::OrderResult,
    test_utils::{
        fixtures::MarketplaceFixture,
        prepare_env::{prepare_test_env, random_db_path},
    },
    traits::{CatalogManagement, CheckoutManagement, LedgerManagement},
    CartApi,
    CheckoutApi,
    LedgerApi,
    SettlementApi,
    SettlementConfig,
    SqliteDatabase,
};
use mkp_common::Money;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub struct TestMarketplace {
    pub url: String,
    pub db: SqliteDatabase,
    pub fixture: MarketplaceFixture,
}

impl TestMarketplace {
    pub async fn new() -> Self {
        Self::with_fixture(true).await
    }

    pub async fn without_admin() -> Self {
        Self::with_fixture(false).await
    }

    async fn with_fixture(with_admin: bool) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_lock_wait(&url, 5, Duration::from_secs(5))
            .await
            .expect("Error creating connection to database");
        let fixture = if with_admin {
            MarketplaceFixture::seed(&db).await
        } else {
            MarketplaceFixture::seed_without_admin(&db).await
        }
        .expect("Error seeding marketplace");
        Self { url, db, fixture }
    }

    pub fn carts(&self) -> CartApi<SqliteDatabase> {
        CartApi::new(self.db.clone())
    }

    pub fn checkout_api(&self) -> CheckoutApi<SqliteDatabase> {
        CheckoutApi::new(self.db.clone(), EventProducers::default())
    }

    pub fn settlement(&self) -> SettlementApi<SqliteDatabase> {
        self.settlement_with(SettlementConfig::default())
    }

    pub fn settlement_with(&self, config: SettlementConfig) -> SettlementApi<SqliteDatabase> {
        SettlementApi::new(self.db.clone(), config, EventProducers::default())
    }

    pub fn ledger(&self) -> LedgerApi<SqliteDatabase> {
        LedgerApi::new(self.db.clone())
    }

    pub fn admin(&self) -> UserId {
        self.fixture.admin.as_ref().expect("fixture has no admin").id
    }

    /// Puts the given products in the user's cart and checks out.
    pub async fn place_order(&self, user: UserId, lines: &[(ProductId, i64)]) -> OrderResult {
        let carts = self.carts();
        for (product, quantity) in lines {
            carts.add_to_cart(user, *product, *quantity).await.expect("Error adding to cart");
        }
        self.checkout_api().checkout(user).await.expect("Error checking out")
    }

    pub async fn stock(&self, product_id: ProductId) -> i64 {
        self.db.fetch_product(product_id).await.expect("Error fetching product").expect("No such product").stock
    }

    /// The user's wallet balance, or zero if they have no wallet.
    pub async fn balance(&self, user_id: UserId) -> Money {
        self.db
            .fetch_wallet_for_user(user_id)
            .await
            .expect("Error fetching wallet")
            .map(|w| w.balance)
            .unwrap_or_default()
    }

    pub async fn payment_status(&self, order_id: OrderId) -> PaymentStatus {
        self.db.fetch_payment_for_order(order_id).await.expect("Error fetching payment").expect("No payment").status
    }

    pub async fn teardown(self) {
        self.db.close().await;
        let _ = Sqlite::drop_database(&self.url).await;
    }
}
