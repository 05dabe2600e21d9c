use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::configuration::BackendSettings;
use crate::errors::PaymentApiError;
use crate::schemas::{
    CurrencyType, GatewayCallbackPayload, Order, PaymentIntent, PaymentRecord, PaymentType,
    UserType, VerificationResult,
};

/// Client for the rental platform's payment endpoints. Order creation and
/// signature verification both live on the backend; this side only carries
/// the requests.
#[derive(Debug)]
pub struct PaymentApiClient {
    http_client: Client,
    base_url: String,
    authorization_token: SecretString,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateRequest<'a> {
    pub amount: u64,
    pub payment_type: PaymentType,
    pub tenant_id: Uuid,
    pub landlord_id: Uuid,
    pub property_id: Uuid,
    pub description: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct OrderData {
    pub id: String,
    pub amount: u64,
    pub currency: CurrencyType,
}

#[derive(Debug, Deserialize)]
struct OrderCreateResponse {
    order: OrderData,
}

#[derive(Debug, Deserialize)]
struct PaymentHistoryResponse {
    payments: Vec<PaymentRecord>,
}

#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    message: String,
}

impl PaymentApiClient {
    #[tracing::instrument]
    pub fn new(
        base_url: String,
        authorization_token: SecretString,
        timeout: std::time::Duration,
    ) -> Self {
        tracing::info!("Establishing connection to the rental platform backend.");
        let http_client = Client::builder().timeout(timeout).build().unwrap();
        Self {
            http_client,
            base_url,
            authorization_token,
        }
    }

    pub fn from_settings(settings: &BackendSettings) -> Self {
        Self::new(
            settings.base_url.clone(),
            settings.authorization_token.clone(),
            settings.timeout(),
        )
    }

    fn get_auth_token(&self) -> String {
        format!("Bearer {}", self.authorization_token.expose_secret())
    }

    /// Asks the backend to create a gateway order for the intent. Not
    /// idempotent: calling twice creates two distinct orders.
    #[tracing::instrument(skip(self, intent), fields(amount = intent.amount))]
    pub async fn create_order(&self, intent: &PaymentIntent) -> Result<Order, PaymentApiError> {
        let url = format!("{}/api/payments/create", self.base_url);
        let request_body = OrderCreateRequest {
            amount: intent.amount,
            payment_type: intent.payment_type,
            tenant_id: intent.tenant_id,
            landlord_id: intent.landlord_id,
            property_id: intent.property_id,
            description: &intent.description,
        };

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.get_auth_token())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaymentApiError::Rejected(
                rejection_message(status, response).await,
            ));
        }
        let response_body: OrderCreateResponse = response
            .json()
            .await
            .map_err(|err| PaymentApiError::MalformedResponse(err.to_string()))?;
        // The backend owns the order; this is the client's immutable copy
        // for one checkout attempt.
        Ok(Order {
            id: response_body.order.id,
            amount: response_body.order.amount,
            currency: response_body.order.currency,
            created_at: Utc::now(),
        })
    }

    /// Hands the raw checkout callback to the backend, which recomputes the
    /// gateway signature with its private secret and answers with the
    /// authoritative payment record.
    #[tracing::instrument(skip(self, payload), fields(order_id = %payload.order_id))]
    pub async fn verify_payment(
        &self,
        payload: &GatewayCallbackPayload,
    ) -> Result<VerificationResult, PaymentApiError> {
        let url = format!("{}/api/payments/verify", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.get_auth_token())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaymentApiError::Rejected(
                rejection_message(status, response).await,
            ));
        }
        response
            .json()
            .await
            .map_err(|err| PaymentApiError::MalformedResponse(err.to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_payment_history(
        &self,
        user_type: UserType,
        user_id: Uuid,
    ) -> Result<Vec<PaymentRecord>, PaymentApiError> {
        let url = format!(
            "{}/api/payments/history/{}/{}",
            self.base_url, user_type, user_id
        );

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.get_auth_token())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaymentApiError::Rejected(
                rejection_message(status, response).await,
            ));
        }
        let response_body: PaymentHistoryResponse = response
            .json()
            .await
            .map_err(|err| PaymentApiError::MalformedResponse(err.to_string()))?;
        Ok(response_body.payments)
    }
}

async fn rejection_message(status: reqwest::StatusCode, response: reqwest::Response) -> String {
    match response.json::<BackendErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => format!("payment backend answered with status {}", status),
    }
}
