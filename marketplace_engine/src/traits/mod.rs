//! # Backend contracts
//!
//! This module defines the behaviour that a storage backend must expose in order to be used by the marketplace
//! engine. The public APIs in [`crate::mkp_api`] are generic over these traits, so that a different backend can be
//! dropped in without touching the settlement flow.
//!
//! * [`CatalogManagement`] provides the user and product lookups that checkout and settlement depend on.
//! * [`CartManagement`] handles the user-scoped shopping cart, including stock reservation.
//! * [`CheckoutManagement`] creates orders and their payments from a cart snapshot.
//! * [`SettlementManagement`] runs the settlement transaction that turns a confirmed payment into stock deductions,
//!   a paid order and ledger credits.
//! * [`LedgerManagement`] provides read access to wallets and their ledger entries.
mod cart_management;
mod catalog_management;
mod checkout_management;
mod ledger_management;
mod settlement_management;

pub use cart_management::{CartError, CartManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use checkout_management::{CheckoutError, CheckoutManagement};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use settlement_management::{ErrorKind, SettlementError, SettlementManagement};

/// True if the driver error means that the database was locked by another writer for longer than the busy timeout,
/// or that no pooled connection became available in time.
pub(crate) fn is_lock_timeout(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => {
            let code = db.code();
            // SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes
            let primary = code.as_deref().and_then(|c| c.parse::<i32>().ok()).map(|c| c & 0xff);
            matches!(primary, Some(5) | Some(6)) || db.message().contains("database is locked")
        },
        _ => false,
    }
}

/// True if the driver error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation),
        _ => false,
    }
}
