use std::sync::Arc;

use tokio::sync::Mutex;
use validator::Validate;

use crate::backend_client::PaymentApiClient;
use crate::checkout::{CheckoutOutcome, CheckoutService, CheckoutSessionData};
use crate::errors::{PaymentApiError, PaymentFlowError};
use crate::schemas::{PaymentIntent, PaymentRecord, SettlementEvent};
use crate::settlement::SettlementNotifier;

#[derive(Debug)]
pub enum PaymentOutcome {
    /// Verified and settled; the record feeds the receipt view.
    Settled(PaymentRecord),
    /// The user walked away from the checkout. Retrying means a fresh
    /// order.
    Abandoned,
}

/// Drives one payment attempt end to end: order creation, hosted checkout,
/// backend verification, settlement broadcast. One attempt at a time.
pub struct PaymentFlow {
    api_client: Arc<PaymentApiClient>,
    checkout: Arc<CheckoutService>,
    notifier: Arc<SettlementNotifier>,
    gateway_key_id: String,
    attempt_guard: Mutex<()>,
}

impl PaymentFlow {
    pub fn new(
        api_client: Arc<PaymentApiClient>,
        checkout: Arc<CheckoutService>,
        notifier: Arc<SettlementNotifier>,
        gateway_key_id: String,
    ) -> Self {
        Self {
            api_client,
            checkout,
            notifier,
            gateway_key_id,
            attempt_guard: Mutex::new(()),
        }
    }

    pub fn settlements(&self) -> &SettlementNotifier {
        &self.notifier
    }

    #[tracing::instrument(
        name = "payment attempt",
        skip(self, intent),
        fields(amount = intent.amount, payment_type = ?intent.payment_type)
    )]
    pub async fn execute(&self, intent: PaymentIntent) -> Result<PaymentOutcome, PaymentFlowError> {
        // Orders are not idempotent on the backend, so a second attempt is
        // rejected while one is still in flight.
        let _attempt = self
            .attempt_guard
            .try_lock()
            .map_err(|_| PaymentFlowError::AttemptInProgress)?;

        intent
            .validate()
            .map_err(|err| PaymentFlowError::InvalidIntent(err.to_string()))?;

        let order = self
            .api_client
            .create_order(&intent)
            .await
            .map_err(|err| PaymentFlowError::OrderCreationFailed(err.to_string()))?;

        // Fail closed when the echoed amount differs from what was asked
        // for; a manipulated order would otherwise collect less than owed.
        if order.amount != intent.amount {
            tracing::error!(
                requested = intent.amount,
                echoed = order.amount,
                order_id = %order.id,
                "payment order does not echo the requested amount"
            );
            return Err(PaymentFlowError::OrderAmountMismatch {
                requested: intent.amount,
                echoed: order.amount,
            });
        }

        let session = CheckoutSessionData {
            key_id: self.gateway_key_id.clone(),
            order_id: order.id.clone(),
            amount: order.amount,
            currency: order.currency,
            description: intent.description.clone(),
            prefill: intent.customer.clone(),
        };
        let payload = match self.checkout.open_session(session).await? {
            CheckoutOutcome::Completed(payload) => payload,
            CheckoutOutcome::Abandoned => return Ok(PaymentOutcome::Abandoned),
        };

        let verification = self
            .api_client
            .verify_payment(&payload)
            .await
            .map_err(|err| match err {
                PaymentApiError::Rejected(message) => PaymentFlowError::VerificationFailed(message),
                other => PaymentFlowError::VerificationUnreachable(other.to_string()),
            })?;
        let record = verification.completed_payment().ok_or_else(|| {
            PaymentFlowError::VerificationFailed(
                "the backend did not confirm the payment".to_string(),
            )
        })?;

        // Strictly after the positive verification; the notifier's dedup
        // keeps this at most once per order.
        let listeners = self.notifier.publish(
            &order.id,
            SettlementEvent {
                amount: record.amount,
                occurred_at: record.payment_date,
            },
        );
        tracing::info!(order_id = %order.id, listeners, "payment settled");

        Ok(PaymentOutcome::Settled(record))
    }
}
