use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::errors::CheckoutError;
use crate::schemas::{CurrencyType, CustomerContact, GatewayCallbackPayload};

/// Lifecycle of one checkout attempt. A session only ever leaves
/// `CheckoutOpen` through the gateway's single completion callback or the
/// user closing the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Uninitialized,
    Loading,
    Ready,
    CheckoutOpen,
    CallbackReceived,
    UserAbandoned,
}

/// Everything the hosted checkout is constructed with: publishable key,
/// the order it is bound to, and tenant prefill.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionData {
    pub key_id: String,
    pub order_id: String,
    pub amount: u64,
    pub currency: CurrencyType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill: Option<CustomerContact>,
}

#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// The gateway fired its completion callback. The payload is
    /// attacker-observable and proves nothing until verified.
    Completed(GatewayCallbackPayload),
    /// The user closed the checkout surface. Not a failure; the payment
    /// intent is simply unresolved.
    Abandoned,
}

#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Runs one hosted checkout session to its completion outcome.
    /// Wall-clock duration is unbounded; the gateway may expire the
    /// session server-side.
    async fn open(&self, session: CheckoutSessionData) -> Result<CheckoutOutcome, CheckoutError>;

    /// Disposes whatever the gateway holds for the session just run.
    async fn close(&self);
}

#[async_trait]
pub trait CheckoutGatewayLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn CheckoutGateway>, CheckoutError>;
}

/// Owns the process-wide checkout capability: loaded lazily on the first
/// session, reused across sequential sessions afterwards.
pub struct CheckoutService {
    loader: Arc<dyn CheckoutGatewayLoader>,
    gateway: OnceCell<Arc<dyn CheckoutGateway>>,
}

impl CheckoutService {
    pub fn new(loader: Arc<dyn CheckoutGatewayLoader>) -> Self {
        Self {
            loader,
            gateway: OnceCell::new(),
        }
    }

    pub fn state(&self) -> CheckoutState {
        if self.gateway.initialized() {
            CheckoutState::Ready
        } else {
            CheckoutState::Uninitialized
        }
    }

    async fn gateway(&self) -> Result<&Arc<dyn CheckoutGateway>, CheckoutError> {
        // A load failure leaves the cell empty, so a later attempt starts
        // over from Uninitialized.
        self.gateway
            .get_or_try_init(|| async {
                tracing::info!(state = ?CheckoutState::Loading, "Loading the hosted checkout capability.");
                self.loader.load().await
            })
            .await
    }

    #[tracing::instrument(
        name = "checkout session",
        skip(self, session),
        fields(order_id = %session.order_id, amount = session.amount)
    )]
    pub async fn open_session(
        &self,
        session: CheckoutSessionData,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let gateway = match self.gateway().await {
            Ok(gateway) => gateway,
            Err(err) => {
                tracing::warn!("checkout capability failed to load: {}", err);
                return Err(err);
            }
        };
        tracing::debug!(state = ?CheckoutState::CheckoutOpen, "handing control to the gateway checkout");
        let outcome = gateway.open(session).await;
        // Teardown happens on every exit path, abandonment and errors
        // included.
        gateway.close().await;
        match &outcome {
            Ok(CheckoutOutcome::Completed(payload)) => {
                tracing::debug!(
                    state = ?CheckoutState::CallbackReceived,
                    payment_id = %payload.payment_id,
                    "gateway completion callback received"
                );
            }
            Ok(CheckoutOutcome::Abandoned) => {
                tracing::info!(state = ?CheckoutState::UserAbandoned, "checkout closed without payment");
            }
            Err(err) => {
                tracing::warn!("checkout session failed: {}", err);
            }
        }
        outcome
    }
}
