use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum PaymentApiError {
    #[error("failed to reach the payment backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Rejected(String),
    #[error("malformed response from the payment backend: {0}")]
    MalformedResponse(String),
}

impl std::fmt::Debug for PaymentApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error)]
pub enum CheckoutError {
    #[error("payment gateway is unavailable: {0}")]
    GatewayUnavailable(String),
}

impl std::fmt::Debug for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error)]
pub enum PaymentFlowError {
    #[error("a payment attempt is already in progress")]
    AttemptInProgress,
    #[error("{0}")]
    InvalidIntent(String),
    #[error("{0}")]
    OrderCreationFailed(String),
    #[error("payment order carries amount {echoed} but {requested} was requested")]
    OrderAmountMismatch { requested: u64, echoed: u64 },
    #[error(transparent)]
    GatewayUnavailable(#[from] CheckoutError),
    #[error("{0}")]
    VerificationFailed(String),
    #[error("could not confirm the payment with the backend: {0}")]
    VerificationUnreachable(String),
}

impl std::fmt::Debug for PaymentFlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
