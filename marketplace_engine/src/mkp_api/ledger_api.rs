use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{LedgerEntry, UserId, Wallet, WalletId},
    mkp_api::settlement_objects::WalletAudit,
    traits::{LedgerError, LedgerManagement},
};

/// Read access to wallets and ledgers, plus a balance audit.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    pub async fn wallet_for_user(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        self.db.fetch_wallet_for_user(user_id).await
    }

    pub async fn wallets(&self) -> Result<Vec<Wallet>, LedgerError> {
        self.db.fetch_wallets().await
    }

    pub async fn ledger_entries(&self, wallet_id: WalletId) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.db.fetch_ledger_entries(wallet_id).await
    }

    pub async fn entries_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let wallet = self.db.fetch_wallet_for_user(user_id).await?.ok_or(LedgerError::NoWalletForUser(user_id))?;
        self.db.fetch_ledger_entries(wallet.id).await
    }

    /// Compares the wallet's balance with the sum of its ledger entries.
    pub async fn audit_wallet(&self, wallet_id: WalletId) -> Result<WalletAudit, LedgerError> {
        let (wallet, entries) =
            self.db.fetch_wallet_with_entries(wallet_id).await?.ok_or(LedgerError::WalletNotFound(wallet_id))?;
        let audit = WalletAudit::new(wallet, &entries);
        if !audit.is_consistent() {
            error!(
                "📒️ Wallet {wallet_id} balance {} does not match its ledger total {} ({} entries)",
                audit.wallet.balance, audit.ledger_total, audit.entry_count
            );
        }
        Ok(audit)
    }

    /// Audits every wallet, in wallet id order.
    pub async fn audit_all(&self) -> Result<Vec<WalletAudit>, LedgerError> {
        let wallets = self.db.fetch_wallets().await?;
        let mut audits = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            audits.push(self.audit_wallet(wallet.id).await?);
        }
        let failures = audits.iter().filter(|a| !a.is_consistent()).count();
        debug!("📒️ Audited {} wallets. {failures} inconsistent", audits.len());
        Ok(audits)
    }
}
