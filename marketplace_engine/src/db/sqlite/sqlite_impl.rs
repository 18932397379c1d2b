//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! It uses SQLite as the storage layer and implements all the traits defined in the [`crate::traits`] module.
use std::{fmt::Debug, time::Duration};

use log::*;
use mkp_common::Money;
use sqlx::{SqliteConnection, SqlitePool};

use super::db::{carts, db_url, new_pool, orders, payments, products, users, wallets};
use crate::{
    config::DEFAULT_LOCK_WAIT,
    db_types::{
        Cart,
        CartId,
        CartItem,
        CartLine,
        LedgerEntry,
        NewOrder,
        NewProduct,
        NewUser,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentStatus,
        Product,
        ProductId,
        Role,
        User,
        UserId,
        Wallet,
        WalletId,
    },
    mkp_api::settlement_objects::{OrderResult, PayoutSplit, Settlement, PLATFORM_FEE_BPS},
    traits::{
        is_unique_violation,
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        CheckoutError,
        CheckoutManagement,
        LedgerError,
        LedgerManagement,
        SettlementError,
        SettlementManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `MKP_DATABASE_URL` and the default lock wait.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        SqliteDatabase::new_with_lock_wait(url, max_connections, DEFAULT_LOCK_WAIT).await
    }

    /// Creates a new database API object. `lock_wait` bounds how long any statement waits for the database write lock,
    /// and how long a caller waits for a free connection.
    pub async fn new_with_lock_wait(url: &str, max_connections: u32, lock_wait: Duration) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections, lock_wait).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let email = user.email.clone();
        users::insert_user(user, &mut conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::DuplicateEmail(email)
            } else {
                CatalogError::from(e)
            }
        })
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_first_user_with_role(&self, role: Role) -> Result<Option<User>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_first_user_with_role(role, &mut conn).await?;
        Ok(user)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        if product.stock < 0 {
            return Err(CatalogError::InvalidProduct(format!("stock cannot be negative ({})", product.stock)));
        }
        if product.price < Money::zero() {
            return Err(CatalogError::InvalidProduct(format!("price cannot be negative ({})", product.price)));
        }
        let mut conn = self.pool.acquire().await?;
        let owner =
            users::fetch_user(product.owner_id, &mut conn).await?.ok_or(CatalogError::UserNotFound(product.owner_id))?;
        if !owner.role.holds_wallet() {
            return Err(CatalogError::NotASeller(owner.id));
        }
        let product = products::insert_product(product, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_or_create_cart(&self, user_id: UserId) -> Result<Cart, CartError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_or_create_cart(user_id, &mut conn).await?;
        Ok(cart)
    }

    async fn fetch_cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_cart_for_user(user_id, &mut conn).await?;
        Ok(cart)
    }

    async fn fetch_cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let lines = carts::fetch_cart_lines(user_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart_items(cart_id, &mut conn).await?;
        Ok(items)
    }

    /// Reserves stock with a guarded decrement before anything else, so the transaction holds the write lock from its
    /// first statement.
    async fn add_product(&self, cart_id: CartId, product_id: ProductId, quantity: i64) -> Result<CartItem, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut tx = self.pool.begin().await?;
        if !products::decrement_stock(product_id, quantity, &mut tx).await? {
            let product = products::fetch_product(product_id, &mut tx).await?;
            let product = product.ok_or(CartError::ProductNotFound(product_id))?;
            debug!("🗃️ Cannot add {quantity} x product {product_id} to cart {cart_id}. Only {} left", product.stock);
            return Err(CartError::InsufficientStock { product_id, requested: quantity, available: product.stock });
        }
        if carts::fetch_cart(cart_id, &mut tx).await?.is_none() {
            return Err(CartError::CartNotFound(cart_id));
        }
        let item = carts::upsert_item(cart_id, product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Added {quantity} x product {product_id} to cart {cart_id}. Item now holds {}", item.quantity);
        Ok(item)
    }

    async fn decrement_product(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut tx = self.pool.begin().await?;
        let result = match carts::delete_item_if_at_most(cart_id, product_id, quantity, &mut tx).await? {
            Some(removed) => {
                products::increment_stock(product_id, removed.quantity, &mut tx).await?;
                trace!("🗃️ Product {product_id} removed from cart {cart_id}");
                None
            },
            None => {
                let item = carts::reduce_item(cart_id, product_id, quantity, &mut tx)
                    .await?
                    .ok_or(CartError::ItemNotFound(product_id, cart_id))?;
                products::increment_stock(product_id, quantity, &mut tx).await?;
                trace!("🗃️ Product {product_id} in cart {cart_id} reduced to {}", item.quantity);
                Some(item)
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn delete_cart_item(&self, cart_id: CartId, product_id: ProductId) -> Result<CartItem, CartError> {
        let mut tx = self.pool.begin().await?;
        let item =
            carts::delete_item(cart_id, product_id, &mut tx).await?.ok_or(CartError::ItemNotFound(product_id, cart_id))?;
        products::increment_stock(product_id, item.quantity, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Deleted product {product_id} from cart {cart_id}. {} units released", item.quantity);
        Ok(item)
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<u64, CartError> {
        let mut conn = self.pool.acquire().await?;
        let count = carts::clear_cart(cart_id, &mut conn).await?;
        Ok(count)
    }
}

impl CheckoutManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderItem>), CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn initiate_payment(&self, order_id: OrderId, amount: Money) -> Result<Payment, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        if orders::fetch_order(order_id, &mut conn).await?.is_none() {
            return Err(CheckoutError::OrderNotFound(order_id));
        }
        payments::insert_payment(order_id, amount, &mut conn)
            .await
            .map_err(|e| CheckoutError::from_payment_insert(order_id, e))
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_payment_for_order(&self, order_id: OrderId) -> Result<Option<Payment>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment)
    }
}

impl SettlementManagement for SqliteDatabase {
    async fn settle_order(
        &self,
        order_id: OrderId,
        platform_account: Option<UserId>,
    ) -> Result<Settlement, SettlementError> {
        let mut tx = self.pool.begin().await?;
        // The first write takes the database lock. Concurrent settlements queue here.
        if !orders::lock_order(order_id, &mut tx).await? {
            return Err(SettlementError::OrderNotFound(order_id));
        }
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(SettlementError::OrderNotFound(order_id))?;
        let payment = payments::fetch_payment_for_order(order_id, &mut tx)
            .await?
            .ok_or(SettlementError::PaymentNotFound(order_id))?;
        if payment.status != PaymentStatus::Initiated {
            warn!("🗃️ Payment {} for order {order_id} is already {}. Not settling again.", payment.id, payment.status);
            return Err(SettlementError::PaymentAlreadyProcessed(order_id, payment.status));
        }
        let payment = payments::update_payment_status(payment.id, PaymentStatus::Confirmed, &mut tx).await?;
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        trace!("🗃️ Settling order {order_id}: {} items, total {}", items.len(), order.total);

        let mut payout = PayoutSplit::default();
        let mut order_gross = Money::zero();
        for item in &items {
            let gross = item.gross().ok_or(SettlementError::AmountOverflow(order_id))?;
            order_gross = order_gross.checked_add(gross).ok_or(SettlementError::AmountOverflow(order_id))?;
            let product = products::fetch_product(item.product_id, &mut tx)
                .await?
                .ok_or(SettlementError::ProductNotFound(item.product_id))?;
            let insufficient = SettlementError::InsufficientStock {
                product_id: product.id,
                requested: item.quantity,
                available: product.stock,
            };
            if product.stock < item.quantity || !products::decrement_stock(product.id, item.quantity, &mut tx).await? {
                debug!("🗃️ Order {order_id} cannot be settled. {insufficient}");
                return Err(insufficient);
            }
            payout.add_line(product.owner_id, gross, PLATFORM_FEE_BPS);
        }
        trace!("🗃️ Payout for order {order_id}: {payout}");

        let admin = resolve_platform_account(platform_account, &mut tx).await?;
        wallets::get_or_create_wallet(admin.id, &mut tx).await?;
        if payout.admin_fee.is_positive() {
            let memo = format!("Platform fee for order {order_id}");
            wallets::credit_user(admin.id, payout.admin_fee, &memo, &mut tx).await?;
        }
        for (seller, amount) in payout.seller_credits() {
            let memo = format!("Sales payout for order {order_id}");
            wallets::credit_user(seller, amount, &memo, &mut tx).await?;
        }

        let order = orders::update_order_status(order_id, OrderStatusType::Paid, &mut tx).await?;
        let cleared = carts::clear_cart_for_user(order.user_id, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {order_id} settled. {payout}. {cleared} items cleared from the cart of user {}",
            order.user_id
        );
        let result = OrderResult::new(order, items, Some(payment));
        Ok(Settlement { result, payout, platform_account: admin.id })
    }

    async fn fetch_payment_status(&self, order_id: OrderId) -> Result<Option<PaymentStatus>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment.map(|p| p.status))
    }
}

/// Finds the admin account that receives the platform fee.
async fn resolve_platform_account(
    configured: Option<UserId>,
    conn: &mut SqliteConnection,
) -> Result<User, SettlementError> {
    match configured {
        Some(user_id) => match users::fetch_user(user_id, conn).await? {
            Some(user) if user.role == Role::Admin => Ok(user),
            Some(user) => {
                error!("🗃️ The configured platform account {user_id} has role {}, not ADMIN", user.role);
                Err(SettlementError::NoAdminAccount)
            },
            None => {
                error!("🗃️ The configured platform account {user_id} does not exist");
                Err(SettlementError::NoAdminAccount)
            },
        },
        None => users::fetch_first_user_with_role(Role::Admin, conn).await?.ok_or_else(|| {
            error!("🗃️ There is no ADMIN user to receive platform fees");
            SettlementError::NoAdminAccount
        }),
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_wallet(&self, wallet_id: WalletId) -> Result<Option<Wallet>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let wallet = wallets::fetch_wallet(wallet_id, &mut conn).await?;
        Ok(wallet)
    }

    async fn fetch_wallet_for_user(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let wallet = wallets::fetch_wallet_for_user(user_id, &mut conn).await?;
        Ok(wallet)
    }

    async fn fetch_wallets(&self) -> Result<Vec<Wallet>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let wallets = wallets::fetch_wallets(&mut conn).await?;
        Ok(wallets)
    }

    async fn fetch_ledger_entries(&self, wallet_id: WalletId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let entries = wallets::fetch_ledger_entries(wallet_id, &mut conn).await?;
        Ok(entries)
    }

    /// Both reads run in one transaction. The snapshot is taken by the first read, so a settlement committing in
    /// between is either fully visible or not at all.
    async fn fetch_wallet_with_entries(
        &self,
        wallet_id: WalletId,
    ) -> Result<Option<(Wallet, Vec<LedgerEntry>)>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let Some(wallet) = wallets::fetch_wallet(wallet_id, &mut tx).await? else {
            return Ok(None);
        };
        let entries = wallets::fetch_ledger_entries(wallet_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Some((wallet, entries)))
    }
}
