use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rental_payment_flow::backend_client::PaymentApiClient;
use rental_payment_flow::checkout::{
    CheckoutGateway, CheckoutGatewayLoader, CheckoutOutcome, CheckoutService, CheckoutSessionData,
};
use rental_payment_flow::errors::CheckoutError;
use rental_payment_flow::flow::PaymentFlow;
use rental_payment_flow::schemas::{
    CustomerContact, GatewayCallbackPayload, PaymentIntent, PaymentType,
};
use rental_payment_flow::settlement::SettlementNotifier;
use rental_payment_flow::telemetry::{get_subscriber, init_subscriber};
use secrecy::SecretString;
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    let test_log = std::env::var("TEST_LOG")
        .map(|value| value == "true")
        .unwrap_or(false);
    if test_log {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

/// Stand-in for the gateway's hosted checkout: plays back a scripted
/// outcome per opened session and counts opens/closes.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<CheckoutOutcome>>,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    open_delay: Option<Duration>,
}

impl ScriptedGateway {
    pub fn new(outcomes: Vec<CheckoutOutcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into()),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            open_delay: None,
        })
    }

    pub fn with_delay(outcomes: Vec<CheckoutOutcome>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into()),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            open_delay: Some(delay),
        })
    }
}

#[async_trait]
impl CheckoutGateway for ScriptedGateway {
    async fn open(&self, _session: CheckoutSessionData) -> Result<CheckoutOutcome, CheckoutError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.ok_or_else(|| {
            CheckoutError::GatewayUnavailable("checkout script exhausted".to_string())
        })
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct StaticLoader {
    gateway: Arc<ScriptedGateway>,
}

#[async_trait]
impl CheckoutGatewayLoader for StaticLoader {
    async fn load(&self) -> Result<Arc<dyn CheckoutGateway>, CheckoutError> {
        Ok(self.gateway.clone())
    }
}

pub struct TestFlow {
    pub server: mockito::ServerGuard,
    pub flow: Arc<PaymentFlow>,
    pub gateway: Arc<ScriptedGateway>,
    pub notifier: Arc<SettlementNotifier>,
}

pub async fn spawn_flow(outcomes: Vec<CheckoutOutcome>) -> TestFlow {
    spawn_flow_with_gateway(ScriptedGateway::new(outcomes)).await
}

pub async fn spawn_flow_with_gateway(gateway: Arc<ScriptedGateway>) -> TestFlow {
    Lazy::force(&TRACING);

    let server = mockito::Server::new_async().await;
    let api_client = Arc::new(PaymentApiClient::new(
        server.url(),
        SecretString::from("test-token".to_string()),
        Duration::from_secs(2),
    ));
    let checkout = Arc::new(CheckoutService::new(Arc::new(StaticLoader {
        gateway: gateway.clone(),
    })));
    let notifier = Arc::new(SettlementNotifier::new());
    let flow = Arc::new(PaymentFlow::new(
        api_client,
        checkout,
        notifier.clone(),
        "rzp_test_key".to_string(),
    ));

    TestFlow {
        server,
        flow,
        gateway,
        notifier,
    }
}

pub async fn spawn_client() -> (mockito::ServerGuard, PaymentApiClient) {
    Lazy::force(&TRACING);

    let server = mockito::Server::new_async().await;
    let client = PaymentApiClient::new(
        server.url(),
        SecretString::from("test-token".to_string()),
        Duration::from_secs(2),
    );
    (server, client)
}

pub fn get_test_intent(amount: u64) -> PaymentIntent {
    PaymentIntent {
        amount,
        payment_type: PaymentType::Rent,
        tenant_id: Uuid::new_v4(),
        landlord_id: Uuid::new_v4(),
        property_id: Uuid::new_v4(),
        description: "August rent".to_string(),
        customer: Some(CustomerContact {
            name: "Anita Menon".to_string(),
            email: "anita@example.com".to_string(),
            contact: "+919000000000".to_string(),
        }),
    }
}

pub fn get_test_callback_payload() -> GatewayCallbackPayload {
    GatewayCallbackPayload {
        order_id: "order_1".to_string(),
        payment_id: "pay_1".to_string(),
        signature: "sig_1".to_string(),
    }
}
