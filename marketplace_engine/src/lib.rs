//! Marketplace Engine
//!
//! The marketplace engine holds the order settlement core of an online marketplace. Buyers check out their carts into
//! orders, and once a payment is confirmed the engine settles the order in a single atomic transaction. Stock is
//! deducted, the platform takes its fee, each seller's share is credited to their wallet through an append-only
//! ledger, and the buyer's cart is cleared.
//!
//! The library is divided into two main sections:
//! 1. Storage ([`mod@db`]). SQLite is the supported backend. You should not need to access the database directly.
//!    The exception is the data types stored in the database. These are defined in [`db_types`] and are public.
//! 2. The public API ([`mod@mkp_api`]). The APIs are generic over the backend traits in [`traits`], which a storage
//!    backend implements in order to be used by the engine.
//!
//! The engine also emits events (see [`events`]) when an order is created and when it is paid.
pub mod config;
mod db;
pub mod db_types;
pub mod events;
mod mkp_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use config::SettlementConfig;
#[cfg(feature = "sqlite")]
pub use db::sqlite::{db::db_url, SqliteDatabase};
pub use mkp_api::{
    cart_api::CartApi,
    checkout_api::CheckoutApi,
    ledger_api::LedgerApi,
    settlement_api::SettlementApi,
    settlement_objects,
};
