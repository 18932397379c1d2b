use std::fmt::Write;

use anyhow::Result;
use marketplace_engine::{
    db_types::{CartItem, OrderItem, Wallet},
    settlement_objects::{OrderResult, WalletAudit},
};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

use crate::commands::SeededMarketplace;

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

pub fn format_order_result(result: &OrderResult) -> Result<String> {
    let mut f = String::new();
    let order = &result.order;
    writeln!(f, "===============================================================================")?;
    writeln!(
        f,
        "Order {id:10} User {user:10} Created {created}",
        id = order.id.to_string(),
        user = order.user_id.to_string(),
        created = order.created_at
    )?;
    writeln!(f, "[{:^15}]                  Updated {}", order.status.to_string(), order.updated_at)?;
    writeln!(f, "-------------------------------------------------------------------------------")?;
    writeln!(f, "Total: {}", order.total)?;
    match &result.payment {
        Some(p) => writeln!(f, "Payment {}: {} [{}]", p.id, p.amount, p.status)?,
        None => writeln!(f, "No payment")?,
    }
    writeln!(f, "===============================================================================")?;
    f.write_str(&format_order_items(&result.items))?;
    Ok(f)
}

pub fn format_order_items(items: &[OrderItem]) -> String {
    if items.is_empty() {
        return "No line items\n".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Product", "Quantity", "Unit price", "Gross"]);
    for item in items {
        table.add_row(row![item.product_id, item.quantity, item.unit_price.to_string(), format_gross(item)]);
    }
    markdown_style(&mut table);
    table.to_string()
}

fn format_gross(item: &OrderItem) -> String {
    item.gross().map(|g| g.to_string()).unwrap_or_else(|| "overflow".to_string())
}

pub fn format_cart_item(item: &CartItem) -> String {
    format!("Cart {} now holds {} x product {}", item.cart_id, item.quantity, item.product_id)
}

pub fn format_wallets(wallets: &[Wallet]) -> String {
    if wallets.is_empty() {
        return "No wallets".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Wallet", "User", "Balance", "Created At", "Updated At"]);
    for wallet in wallets {
        table.add_row(row![
            wallet.id,
            wallet.user_id,
            wallet.balance.to_string(),
            wallet.created_at.to_string(),
            wallet.updated_at.to_string()
        ]);
    }
    markdown_style(&mut table);
    table.to_string()
}

pub fn format_audits(audits: &[WalletAudit]) -> String {
    let mut table = Table::new();
    table.set_titles(row!["Wallet", "User", "Balance", "Ledger total", "Entries", "Status"]);
    for audit in audits {
        let status = if audit.is_consistent() { "OK".to_string() } else { format!("OFF BY {}", audit.discrepancy()) };
        table.add_row(row![
            audit.wallet.id,
            audit.wallet.user_id,
            audit.wallet.balance.to_string(),
            audit.ledger_total.to_string(),
            audit.entry_count,
            status
        ]);
    }
    markdown_style(&mut table);
    table.to_string()
}

pub fn format_seeded(seeded: &SeededMarketplace) -> String {
    let mut table = Table::new();
    table.set_titles(row!["Kind", "Id", "Name", "Detail"]);
    for user in &seeded.users {
        table.add_row(row!["user", user.id, user.name, user.role]);
    }
    for product in &seeded.products {
        let detail = format!("{} x {} by {}", product.stock, product.price, product.owner_id);
        table.add_row(row!["product", product.id, product.title, detail]);
    }
    markdown_style(&mut table);
    table.to_string()
}
