//! Records and value types shared by the storage backends and the public API.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use mkp_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                s.trim_start_matches('#')
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| ConversionError(format!("{s} is not a valid {}. {e}", stringify!($name))))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

id_type!(UserId);
id_type!(ProductId);
id_type!(CartId);
id_type!(
    /// The internal order number, generated on insert.
    OrderId
);
id_type!(PaymentId);
id_type!(WalletId);
id_type!(LedgerEntryId);

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// The platform operator. Receives the platform fee.
    Admin,
    /// Owns products and receives sales payouts.
    Seller,
    Customer,
}

impl Role {
    /// Only sellers and admins hold wallets.
    pub fn holds_wallet(&self) -> bool {
        matches!(self, Role::Admin | Role::Seller)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Seller => write!(f, "SELLER"),
            Role::Customer => write!(f, "CUSTOMER"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "SELLER" => Ok(Self::Seller),
            "CUSTOMER" => Ok(Self::Customer),
            _ => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been placed at checkout and is waiting for payment confirmation.
    Created,
    /// Payment has been confirmed, stock has been deducted and the sale has been paid out.
    Paid,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Created => write!(f, "CREATED"),
            OrderStatusType::Paid => write!(f, "PAID"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATED" => Ok(Self::Created),
            "PAID" => Ok(Self::Paid),
            _ => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Initiated,
    Confirmed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Initiated => write!(f, "INITIATED"),
            PaymentStatus::Confirmed => write!(f, "CONFIRMED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INITIATED" => Ok(Self::Initiated),
            "CONFIRMED" => Ok(Self::Confirmed),
            _ => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   TransactionType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Credit,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Credit => write!(f, "CREDIT"),
        }
    }
}

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl NewUser {
    pub fn new<S: Into<String>>(name: S, email: S, role: Role) -> Self {
        Self { name: name.into(), email: email.into(), role }
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// The seller that receives the proceeds of sales of this product
    pub owner_id: UserId,
    pub title: String,
    pub price: Money,
    /// Units available. Never negative.
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub owner_id: UserId,
    pub title: String,
    pub price: Money,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(owner_id: UserId, title: S, price: Money, stock: i64) -> Self {
        Self { owner_id, title: title.into(), price, stock }
    }
}

//--------------------------------------         Cart          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A cart item joined with the live price of its product.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartLine {
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl CartLine {
    /// `None` if the line total does not fit in a `Money`.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Money,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order. The quantity and unit price are copied from the cart at checkout and never change.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderItem {
    /// `None` if the line total does not fit in a `Money`.
    pub fn gross(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    pub fn new(product_id: ProductId, quantity: i64, unit_price: Money) -> Self {
        Self { product_id, quantity, unit_price }
    }
}

impl From<&CartLine> for NewOrderItem {
    fn from(line: &CartLine) -> Self {
        Self::new(line.product_id, line.quantity, line.unit_price)
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total: Money,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn new(user_id: UserId, total: Money, items: Vec<NewOrderItem>) -> Self {
        Self { user_id, total, items }
    }
}

//--------------------------------------        Payment        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Wallet         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserId,
    /// Always equal to the sum of the wallet's ledger entries
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      LedgerEntry      ---------------------------------------------------------
/// An append-only ledger transaction against a wallet.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub wallet_id: WalletId,
    pub entry_type: TransactionType,
    pub amount: Money,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ids_parse_with_or_without_hash() {
        assert_eq!("#42".parse::<OrderId>().unwrap(), OrderId(42));
        assert_eq!(" 7".parse::<ProductId>().unwrap(), ProductId(7));
        assert!("seven".parse::<UserId>().is_err());
        assert_eq!(OrderId(42).to_string(), "#42");
    }

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!("paid".parse::<OrderStatusType>().unwrap(), OrderStatusType::Paid);
        assert_eq!(PaymentStatus::Initiated.to_string().parse::<PaymentStatus>().unwrap(), PaymentStatus::Initiated);
        assert!("refunded".parse::<PaymentStatus>().is_err());
        assert_eq!("Seller".parse::<Role>().unwrap(), Role::Seller);
    }

    #[test]
    fn wallet_roles() {
        assert!(Role::Admin.holds_wallet());
        assert!(Role::Seller.holds_wallet());
        assert!(!Role::Customer.holds_wallet());
    }

    #[test]
    fn line_totals() {
        let line = CartLine { cart_id: CartId(1), product_id: ProductId(2), quantity: 3, unit_price: Money::from(250) };
        assert_eq!(line.line_total(), Some(Money::from(750)));
        let huge = CartLine { quantity: 3, unit_price: Money::from(i64::MAX / 2), ..line.clone() };
        assert_eq!(huge.line_total(), None);
        let item = NewOrderItem::from(&line);
        assert_eq!(item.quantity, 3);
        assert_eq!(item.unit_price, Money::from(250));
    }
}
