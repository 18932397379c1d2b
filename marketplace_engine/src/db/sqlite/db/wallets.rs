use log::{debug, trace};
use mkp_common::Money;
use sqlx::SqliteConnection;

use crate::db_types::{LedgerEntry, TransactionType, UserId, Wallet, WalletId};

pub async fn fetch_wallet(wallet_id: WalletId, conn: &mut SqliteConnection) -> Result<Option<Wallet>, sqlx::Error> {
    let wallet = sqlx::query_as("SELECT * FROM wallets WHERE id = $1").bind(wallet_id).fetch_optional(conn).await?;
    Ok(wallet)
}

pub async fn fetch_wallet_for_user(user_id: UserId, conn: &mut SqliteConnection) -> Result<Option<Wallet>, sqlx::Error> {
    let wallet =
        sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(wallet)
}

pub async fn fetch_wallets(conn: &mut SqliteConnection) -> Result<Vec<Wallet>, sqlx::Error> {
    let wallets = sqlx::query_as("SELECT * FROM wallets ORDER BY id").fetch_all(conn).await?;
    Ok(wallets)
}

pub async fn fetch_ledger_entries(
    wallet_id: WalletId,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM ledger_entries WHERE wallet_id = $1 ORDER BY id")
        .bind(wallet_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}

/// Returns the user's wallet, creating it with a zero balance if it does not exist yet.
pub async fn get_or_create_wallet(user_id: UserId, conn: &mut SqliteConnection) -> Result<Wallet, sqlx::Error> {
    let inserted = sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    if inserted.rows_affected() > 0 {
        debug!("🗃️ Wallet created for user {user_id}");
    }
    let wallet = sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1").bind(user_id).fetch_one(conn).await?;
    Ok(wallet)
}

/// Appends a credit entry to the wallet's ledger and increments the balance by the same amount. This is two
/// statements, so it must run inside a transaction.
pub async fn credit_wallet(
    wallet_id: WalletId,
    amount: Money,
    description: &str,
    conn: &mut SqliteConnection,
) -> Result<LedgerEntry, sqlx::Error> {
    let entry: LedgerEntry = sqlx::query_as(
        r#"
            INSERT INTO ledger_entries (wallet_id, entry_type, amount, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(wallet_id)
    .bind(TransactionType::Credit)
    .bind(amount)
    .bind(description)
    .fetch_one(&mut *conn)
    .await?;
    sqlx::query("UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(amount)
        .bind(wallet_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Wallet {wallet_id} credited with {amount}: {description}");
    Ok(entry)
}

/// Credits `amount` to the user's wallet, creating the wallet first if necessary.
pub async fn credit_user(
    user_id: UserId,
    amount: Money,
    description: &str,
    conn: &mut SqliteConnection,
) -> Result<LedgerEntry, sqlx::Error> {
    let wallet = get_or_create_wallet(user_id, &mut *conn).await?;
    credit_wallet(wallet.id, amount, description, conn).await
}
