use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    config::SettlementConfig,
    db_types::{OrderId, PaymentStatus},
    events::{EventProducers, OrderPaidEvent},
    mkp_api::settlement_objects::{OrderResult, Settlement},
    traits::{ErrorKind, SettlementError, SettlementManagement},
};

/// `SettlementApi` confirms payments for orders.
///
/// Confirming a payment settles the order in one atomic transaction: the payment is confirmed, stock is deducted,
/// the platform fee and seller shares are credited to their wallets, the order is marked paid and the buyer's cart is
/// cleared. If anything fails, nothing is kept.
pub struct SettlementApi<B> {
    db: B,
    config: SettlementConfig,
    producers: EventProducers,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({:?})", self.config)
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, config: SettlementConfig, producers: EventProducers) -> Self {
        Self { db, config, producers }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }
}

impl<B> SettlementApi<B>
where B: SettlementManagement
{
    /// Confirms the payment for `order_id` and settles the order. Returns the paid order with its line items and the
    /// confirmed payment.
    ///
    /// Confirming an order that has already been settled fails with [`SettlementError::PaymentAlreadyProcessed`] and
    /// changes nothing.
    pub async fn confirm_payment(&self, order_id: OrderId) -> Result<OrderResult, SettlementError> {
        let settlement = self.settle(order_id).await?;
        Ok(settlement.result)
    }

    /// As [`Self::confirm_payment`], but also returns the payout that was posted.
    ///
    /// The whole transaction must finish within the configured execution timeout. When the timeout fires, the
    /// in-flight transaction is dropped, which rolls it back. If the payment turns out to be confirmed already, the
    /// result is [`SettlementError::PaymentAlreadyProcessed`] rather than [`SettlementError::ExecutionTimeout`].
    pub async fn settle(&self, order_id: OrderId) -> Result<Settlement, SettlementError> {
        let timeout = self.config.execution_timeout;
        trace!("🔄️💰️ Settling order {order_id}");
        let outcome = tokio::time::timeout(timeout, self.db.settle_order(order_id, self.config.platform_account)).await;
        let settlement = match outcome {
            Ok(Ok(settlement)) => settlement,
            Ok(Err(e)) => {
                match e.kind() {
                    ErrorKind::StateConflict => info!("🔄️💰️ Duplicate confirmation for {order_id}. {e}"),
                    ErrorKind::Configuration => error!("🔄️💰️ Cannot settle order {order_id}. {e}"),
                    _ => warn!("🔄️💰️ Settlement of order {order_id} failed. {e}"),
                }
                return Err(e);
            },
            Err(_) => return Err(self.timed_out(order_id, timeout).await),
        };
        info!(
            "🔄️💰️ Order {order_id} is paid. {} credited to platform account {}",
            settlement.payout.admin_fee, settlement.platform_account
        );
        self.call_order_paid_hook(&settlement).await;
        Ok(settlement)
    }

    /// The transaction may have committed just before the deadline. If the payment is no longer `INITIATED`, the
    /// order was settled, and that is reported instead of a retryable timeout.
    async fn timed_out(&self, order_id: OrderId, timeout: Duration) -> SettlementError {
        match self.db.fetch_payment_status(order_id).await {
            Ok(Some(status)) if status != PaymentStatus::Initiated => {
                warn!(
                    "🔄️💰️ Settlement of order {order_id} timed out after {}ms, but the payment is already {status}",
                    timeout.as_millis()
                );
                SettlementError::PaymentAlreadyProcessed(order_id, status)
            },
            Ok(_) => {
                warn!("🔄️💰️ Settlement of order {order_id} timed out after {}ms", timeout.as_millis());
                SettlementError::ExecutionTimeout(timeout.as_millis())
            },
            Err(e) => {
                warn!("🔄️💰️ Settlement of order {order_id} timed out, and its payment could not be checked. {e}");
                SettlementError::ExecutionTimeout(timeout.as_millis())
            },
        }
    }

    async fn call_order_paid_hook(&self, settlement: &Settlement) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️💰️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent::new(settlement.result.clone(), settlement.payout.clone());
            emitter.publish_event(event).await;
        }
    }
}
