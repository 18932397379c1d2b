use std::{collections::BTreeMap, fmt::Display};

use mkp_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{
    CartLine,
    LedgerEntry,
    NewOrderItem,
    Order,
    OrderId,
    OrderItem,
    OrderStatusType,
    Payment,
    PaymentStatus,
    UserId,
    Wallet,
};

/// The platform's cut of every sale, in basis points (10%).
pub const PLATFORM_FEE_BPS: i64 = 1_000;

//--------------------------------------     CartSnapshot      ---------------------------------------------------------
/// An immutable copy of a user's cart taken at checkout. This becomes the content of the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub user_id: UserId,
    pub total: Money,
    pub items: Vec<NewOrderItem>,
}

impl CartSnapshot {
    /// Returns `None` if a line total, or the cart total, does not fit in a `Money`.
    pub fn from_lines(user_id: UserId, lines: &[CartLine]) -> Option<Self> {
        let total = lines.iter().try_fold(Money::zero(), |total, line| total.checked_add(line.line_total()?))?;
        let items = lines.iter().map(NewOrderItem::from).collect();
        Some(Self { user_id, total, items })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

//--------------------------------------      OrderResult      ---------------------------------------------------------
/// An order together with its line items and payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
}

impl OrderResult {
    pub fn new(order: Order, items: Vec<OrderItem>, payment: Option<Payment>) -> Self {
        Self { order, items, payment }
    }

    pub fn order_id(&self) -> OrderId {
        self.order.id
    }

    pub fn status(&self) -> OrderStatusType {
        self.order.status
    }

    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.payment.as_ref().map(|p| p.status)
    }

    /// The sum of the line totals, or `None` if it does not fit in a `Money`.
    pub fn gross(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::zero(), |total, item| total.checked_add(item.gross()?))
    }
}

//--------------------------------------      PayoutSplit      ---------------------------------------------------------
/// How the gross value of an order is divided between the platform and the sellers.
///
/// Seller shares are keyed by seller id in a `BTreeMap`, so iteration (and therefore the order in which credits are
/// posted to the ledger) is always ascending by seller id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSplit {
    pub admin_fee: Money,
    pub seller_shares: BTreeMap<UserId, Money>,
}

impl PayoutSplit {
    /// Adds one order line. The fee is `gross × fee_bps`, rounded to the cent, and the seller keeps the rest.
    pub fn add_line(&mut self, seller: UserId, gross: Money, fee_bps: i64) {
        let fee = gross.fee(fee_bps);
        self.admin_fee += fee;
        *self.seller_shares.entry(seller).or_default() += gross - fee;
    }

    /// Builds the split for `(seller, gross)` pairs. Several lines from the same seller combine into one share.
    pub fn from_lines<I: IntoIterator<Item = (UserId, Money)>>(lines: I, fee_bps: i64) -> Self {
        let mut split = Self::default();
        for (seller, gross) in lines {
            split.add_line(seller, gross, fee_bps);
        }
        split
    }

    /// The total of the fee and every share. This is always equal to the sum of the gross values that went in.
    pub fn gross(&self) -> Money {
        self.admin_fee + self.seller_shares.values().sum::<Money>()
    }

    /// Seller credits to post, in ascending seller id order. Zero shares are skipped.
    pub fn seller_credits(&self) -> impl Iterator<Item = (UserId, Money)> + '_ {
        self.seller_shares.iter().filter(|(_, amount)| amount.is_positive()).map(|(id, amount)| (*id, *amount))
    }

    pub fn share_for(&self, seller: UserId) -> Money {
        self.seller_shares.get(&seller).copied().unwrap_or_default()
    }
}

impl Display for PayoutSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "platform fee {}", self.admin_fee)?;
        for (seller, amount) in &self.seller_shares {
            write!(f, ", seller {seller} {amount}")?;
        }
        Ok(())
    }
}

//--------------------------------------      Settlement       ---------------------------------------------------------
/// Everything that a successful settlement committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub result: OrderResult,
    pub payout: PayoutSplit,
    /// The admin account that received the platform fee
    pub platform_account: UserId,
}

//--------------------------------------      WalletAudit      ---------------------------------------------------------
/// The result of checking a wallet's balance against its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAudit {
    pub wallet: Wallet,
    pub entry_count: usize,
    pub ledger_total: Money,
}

impl WalletAudit {
    pub fn new(wallet: Wallet, entries: &[LedgerEntry]) -> Self {
        let ledger_total = entries.iter().map(|e| e.amount).sum();
        Self { wallet, entry_count: entries.len(), ledger_total }
    }

    pub fn is_consistent(&self) -> bool {
        self.wallet.balance == self.ledger_total
    }

    pub fn discrepancy(&self) -> Money {
        self.wallet.balance - self.ledger_total
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::{CartId, ProductId};

    #[test]
    fn two_sellers_one_line_each() {
        let a = UserId(10);
        let b = UserId(20);
        let split = PayoutSplit::from_lines([(a, Money::from_units(100)), (b, Money::from_units(50))], PLATFORM_FEE_BPS);
        assert_eq!(split.admin_fee, Money::from_units(15));
        assert_eq!(split.share_for(a), Money::from_units(90));
        assert_eq!(split.share_for(b), Money::from_units(45));
        assert_eq!(split.gross(), Money::from_units(150));
    }

    #[test]
    fn lines_from_the_same_seller_combine() {
        let a = UserId(3);
        let lines = [(a, Money::from(1_005)), (UserId(1), Money::from(200)), (a, Money::from(995))];
        let split = PayoutSplit::from_lines(lines, PLATFORM_FEE_BPS);
        assert_eq!(split.seller_shares.len(), 2);
        // 100.5 rounds to 101, 99.5 rounds to 100
        assert_eq!(split.share_for(a), Money::from(1_005 - 101 + 995 - 100));
        let order: Vec<UserId> = split.seller_credits().map(|(id, _)| id).collect();
        assert_eq!(order, vec![UserId(1), a]);
    }

    #[test]
    fn conservation_holds_for_awkward_amounts() {
        let lines: Vec<(UserId, Money)> =
            (1..=40).map(|i| (UserId(i % 7), Money::from(i * 37 + i % 3))).collect();
        let gross: Money = lines.iter().map(|(_, m)| *m).sum();
        let split = PayoutSplit::from_lines(lines, PLATFORM_FEE_BPS);
        assert_eq!(split.gross(), gross);
    }

    #[test]
    fn zero_value_lines_produce_no_credit() {
        let split = PayoutSplit::from_lines([(UserId(1), Money::zero())], PLATFORM_FEE_BPS);
        assert_eq!(split.admin_fee, Money::zero());
        assert_eq!(split.seller_credits().count(), 0);
    }

    #[test]
    fn snapshot_from_cart() {
        let lines = vec![
            CartLine { cart_id: CartId(1), product_id: ProductId(1), quantity: 2, unit_price: Money::from_units(10) },
            CartLine { cart_id: CartId(1), product_id: ProductId(2), quantity: 1, unit_price: Money::from(499) },
        ];
        let snapshot = CartSnapshot::from_lines(UserId(5), &lines).expect("cart total overflowed");
        assert_eq!(snapshot.total, Money::from(2_499));
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].product_id, ProductId(1));
        assert!(!snapshot.is_empty());
        assert!(CartSnapshot::from_lines(UserId(5), &[]).expect("empty cart overflowed").is_empty());
    }

    #[test]
    fn snapshot_totals_that_overflow_are_rejected() {
        let half = Money::from(i64::MAX / 2 + 1);
        let line = CartLine { cart_id: CartId(1), product_id: ProductId(1), quantity: 1, unit_price: half };
        let other = CartLine { product_id: ProductId(2), ..line.clone() };
        assert!(CartSnapshot::from_lines(UserId(5), &[line.clone()]).is_some());
        assert!(CartSnapshot::from_lines(UserId(5), &[line.clone(), other]).is_none());
        let many = CartLine { quantity: 2, ..line };
        assert!(CartSnapshot::from_lines(UserId(5), &[many]).is_none());
    }
}
