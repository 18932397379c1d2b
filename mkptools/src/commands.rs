use anyhow::{anyhow, Result};
use log::*;
use marketplace_engine::{
    db_types::{NewProduct, NewUser, OrderId, Product, ProductId, Role, User, UserId},
    events::EventProducers,
    traits::CatalogManagement,
    CartApi,
    CheckoutApi,
    LedgerApi,
    SettlementApi,
    SqliteDatabase,
};
use mkp_common::Money;
use serde::Serialize;

use crate::{config::ToolsConfig, formatting::*};

#[derive(Debug, Serialize)]
pub struct SeededMarketplace {
    pub users: Vec<User>,
    pub products: Vec<Product>,
}

pub struct Tools {
    db: SqliteDatabase,
    config: ToolsConfig,
    json: bool,
}

impl Tools {
    pub async fn connect(config: ToolsConfig, json: bool) -> Result<Self> {
        let db =
            SqliteDatabase::new_with_lock_wait(&config.database_url, config.max_connections, config.settlement.lock_wait)
                .await?;
        Ok(Self { db, config, json })
    }

    fn print<T: Serialize>(&self, value: &T, text: String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{text}");
        }
        Ok(())
    }

    pub async fn migrate(&self) -> Result<()> {
        self.db.migrate().await?;
        println!("Migrations applied to {}", self.db.url());
        Ok(())
    }

    /// Creates an admin, two sellers with a few products each, and a customer.
    pub async fn seed(&self) -> Result<()> {
        let users = [
            NewUser::new("Platform", "admin@example.com", Role::Admin),
            NewUser::new("Alice's Teas", "alice@example.com", Role::Seller),
            NewUser::new("Bob's Pottery", "bob@example.com", Role::Seller),
            NewUser::new("Carol", "carol@example.com", Role::Customer),
        ];
        let mut seeded = SeededMarketplace { users: Vec::with_capacity(users.len()), products: Vec::new() };
        for user in users {
            seeded.users.push(self.db.insert_user(user).await?);
        }
        let alice = seeded.users[1].id;
        let bob = seeded.users[2].id;
        let products = [
            NewProduct::new(alice, "Sencha, 100g", Money::from_cents(1_250), 40),
            NewProduct::new(alice, "Oolong, 100g", Money::from_cents(1_800), 25),
            NewProduct::new(bob, "Teapot", Money::from_units(100), 5),
            NewProduct::new(bob, "Tea bowl", Money::from_units(50), 12),
        ];
        for product in products {
            seeded.products.push(self.db.insert_product(product).await?);
        }
        info!("🌱️ Seeded {} users and {} products", seeded.users.len(), seeded.products.len());
        self.print(&seeded, format_seeded(&seeded))
    }

    pub async fn add_to_cart(&self, user_id: UserId, product_id: ProductId, quantity: i64) -> Result<()> {
        let api = CartApi::new(self.db.clone());
        let item = api.add_to_cart(user_id, product_id, quantity).await?;
        self.print(&item, format_cart_item(&item))
    }

    pub async fn checkout(&self, user_id: UserId) -> Result<()> {
        let api = CheckoutApi::new(self.db.clone(), EventProducers::default());
        let result = api.checkout(user_id).await?;
        self.print(&result, format_order_result(&result)?)
    }

    pub async fn confirm(&self, order_id: OrderId) -> Result<()> {
        let api = SettlementApi::new(self.db.clone(), self.config.settlement.clone(), EventProducers::default());
        match api.settle(order_id).await {
            Ok(settlement) => {
                let mut text = format_order_result(&settlement.result)?;
                text.push_str(&format!("\nPayout: {}\n", settlement.payout));
                self.print(&settlement, text)
            },
            Err(e) => {
                let hint = if e.is_retryable() { " It is safe to retry." } else { "" };
                Err(anyhow!("Could not settle order {order_id} ({:?}). {e}.{hint}", e.kind()))
            },
        }
    }

    pub async fn order(&self, order_id: OrderId) -> Result<()> {
        let api = CheckoutApi::new(self.db.clone(), EventProducers::default());
        let result = api.order_result(order_id).await?;
        self.print(&result, format_order_result(&result)?)
    }

    pub async fn wallets(&self) -> Result<()> {
        let api = LedgerApi::new(self.db.clone());
        let wallets = api.wallets().await?;
        self.print(&wallets, format_wallets(&wallets))
    }

    /// Fails if any wallet balance differs from its ledger total.
    pub async fn audit(&self) -> Result<()> {
        let api = LedgerApi::new(self.db.clone());
        let audits = api.audit_all().await?;
        self.print(&audits, format_audits(&audits))?;
        let failures = audits.iter().filter(|a| !a.is_consistent()).count();
        if failures > 0 {
            return Err(anyhow!("{failures} wallets do not match their ledgers"));
        }
        Ok(())
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}
