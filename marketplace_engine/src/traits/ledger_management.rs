use thiserror::Error;

use crate::db_types::{LedgerEntry, UserId, Wallet, WalletId};

/// Read access to wallets and their append-only ledger entries.
///
/// Credits are only ever posted by the settlement transaction, see [`crate::traits::SettlementManagement`].
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    async fn fetch_wallet(&self, wallet_id: WalletId) -> Result<Option<Wallet>, LedgerError>;

    async fn fetch_wallet_for_user(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError>;

    /// All wallets, ordered by id.
    async fn fetch_wallets(&self) -> Result<Vec<Wallet>, LedgerError>;

    /// The wallet's ledger entries, oldest first.
    async fn fetch_ledger_entries(&self, wallet_id: WalletId) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// The wallet together with its ledger entries, both read from the same snapshot.
    async fn fetch_wallet_with_entries(
        &self,
        wallet_id: WalletId,
    ) -> Result<Option<(Wallet, Vec<LedgerEntry>)>, LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Wallet {0} does not exist")]
    WalletNotFound(WalletId),
    #[error("User {0} does not have a wallet")]
    NoWalletForUser(UserId),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
