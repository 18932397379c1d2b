//! # Marketplace engine public API
//!
//! The `mkp_api` module exposes the programmatic API of the marketplace engine. Each API wraps a storage backend that
//! implements the backend traits it needs, so clients can pick the pieces they want.
//!
//! * [`cart_api`] manages a user's shopping cart and the stock reserved by it.
//! * [`checkout_api`] turns a cart into an order with an initiated payment.
//! * [`settlement_api`] confirms payments. This is where stock is committed and sellers are paid.
//! * [`ledger_api`] reads wallets and their ledgers, and audits balances against ledger entries.
//!
//! # API usage
//!
//! ```rust,ignore
//! use marketplace_engine::{SettlementApi, SqliteDatabase, SettlementConfig, events::EventProducers};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = SettlementApi::new(db, SettlementConfig::from_env_or_default(), EventProducers::default());
//! let result = api.confirm_payment(order_id).await?;
//! ```
pub mod cart_api;
pub mod checkout_api;
pub mod ledger_api;
pub mod settlement_api;
pub mod settlement_objects;
