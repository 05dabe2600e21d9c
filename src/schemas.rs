use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyType {
    Inr,
}

impl std::fmt::Display for CurrencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurrencyType::Inr => write!(f, "INR"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentType {
    Rent,
    Deposit,
    Maintenance,
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Tenant,
    Landlord,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Tenant => write!(f, "tenant"),
            UserType::Landlord => write!(f, "landlord"),
        }
    }
}

/// Tenant details handed to the hosted checkout for prefill.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// One payment the tenant is about to make. Lives only for the duration of
/// a single order/checkout attempt.
#[derive(Debug, Clone, Validate)]
pub struct PaymentIntent {
    #[validate(range(min = 1))]
    pub amount: u64,
    pub payment_type: PaymentType,
    pub tenant_id: Uuid,
    pub landlord_id: Uuid,
    pub property_id: Uuid,
    pub description: String,
    pub customer: Option<CustomerContact>,
}

/// Immutable client copy of the gateway order issued by the backend.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: String,
    pub amount: u64,
    pub currency: CurrencyType,
    pub created_at: DateTime<Utc>,
}

/// Raw fields returned by the hosted checkout once the user completes
/// payment. Untrusted until the backend has verified the signature.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCallbackPayload {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub amount: u64,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub property: Uuid,
    pub payment_type: PaymentType,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerificationResult {
    pub verified: bool,
    #[serde(default)]
    pub payment: Option<PaymentRecord>,
}

impl VerificationResult {
    /// The payment record, but only when the backend vouched for it and the
    /// payment actually completed. Anything else is not proof of payment.
    pub fn completed_payment(self) -> Option<PaymentRecord> {
        if !self.verified {
            return None;
        }
        self.payment
            .filter(|record| record.status == PaymentStatus::Completed)
    }
}

/// Fire-and-forget notification that a verified payment settled.
#[derive(Debug, Clone)]
pub struct SettlementEvent {
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}
