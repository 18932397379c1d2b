use std::collections::HashMap;

use cucumber::World;
use log::*;
use marketplace_engine::{
    db_types::{OrderId, ProductId, UserId},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::SettlementError,
    CartApi,
    CheckoutApi,
    LedgerApi,
    SettlementApi,
    SettlementConfig,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct MarketplaceWorld {
    pub system: Option<MarketplaceSystem>,
    pub users: HashMap<String, UserId>,
    pub products: HashMap<String, ProductId>,
    pub last_order: Option<OrderId>,
    pub last_error: Option<SettlementError>,
}

#[derive(Debug)]
pub struct MarketplaceSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
}

impl MarketplaceSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        Self { db_path: url, db }
    }
}

impl MarketplaceWorld {
    pub fn db(&self) -> &SqliteDatabase {
        &self.system.as_ref().expect("Marketplace not initialised").db
    }

    pub fn carts(&self) -> CartApi<SqliteDatabase> {
        CartApi::new(self.db().clone())
    }

    pub fn checkout(&self) -> CheckoutApi<SqliteDatabase> {
        CheckoutApi::new(self.db().clone(), EventProducers::default())
    }

    pub fn settlement(&self) -> SettlementApi<SqliteDatabase> {
        SettlementApi::new(self.db().clone(), SettlementConfig::default(), EventProducers::default())
    }

    pub fn ledger(&self) -> LedgerApi<SqliteDatabase> {
        LedgerApi::new(self.db().clone())
    }

    pub fn user(&self, name: &str) -> UserId {
        *self.users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn product(&self, title: &str) -> ProductId {
        *self.products.get(title).unwrap_or_else(|| panic!("No product called {title}"))
    }

    pub fn last_order(&self) -> OrderId {
        self.last_order.expect("No order has been placed")
    }
}
