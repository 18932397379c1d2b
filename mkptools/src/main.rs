use clap::{Parser, Subcommand};
use marketplace_engine::db_types::{OrderId, ProductId, UserId};

mod commands;
mod config;
mod formatting;

use crate::{commands::Tools, config::ToolsConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Operator tools for the marketplace settlement engine")]
pub struct Arguments {
    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "migrate", about = "Create or upgrade the database schema")]
    Migrate,
    #[clap(name = "seed", about = "Insert a demo admin, two sellers, a customer and some products")]
    Seed,
    #[clap(name = "add-to-cart", about = "Add a product to a user's cart, reserving stock")]
    AddToCart {
        #[arg(short = 'u', long = "user")]
        user: UserId,
        #[arg(short = 'p', long = "product")]
        product: ProductId,
        #[arg(short = 'q', long = "qty", default_value = "1")]
        quantity: i64,
    },
    #[clap(name = "checkout", about = "Turn a user's cart into an order with an initiated payment")]
    Checkout {
        #[arg(short = 'u', long = "user")]
        user: UserId,
    },
    #[clap(name = "confirm", about = "Confirm the payment for an order and settle it")]
    Confirm {
        #[arg(short = 'o', long = "order")]
        order: OrderId,
    },
    #[clap(name = "order", about = "Show an order with its items and payment")]
    Order {
        #[arg(short = 'o', long = "order")]
        order: OrderId,
    },
    #[clap(name = "wallets", about = "List all wallets and their balances")]
    Wallets,
    #[clap(name = "audit", about = "Check every wallet balance against its ledger")]
    Audit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let config = ToolsConfig::from_env_or_default();
    let tools = Tools::connect(config, cli.json).await?;
    let result = match cli.command {
        Command::Migrate => tools.migrate().await,
        Command::Seed => tools.seed().await,
        Command::AddToCart { user, product, quantity } => tools.add_to_cart(user, product, quantity).await,
        Command::Checkout { user } => tools.checkout(user).await,
        Command::Confirm { order } => tools.confirm(order).await,
        Command::Order { order } => tools.order(order).await,
        Command::Wallets => tools.wallets().await,
        Command::Audit => tools.audit().await,
    };
    tools.close().await;
    result
}
