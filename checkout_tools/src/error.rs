use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckoutApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request to the payment processor failed: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The event does not contain a checkout session: {0}")]
    NotACheckoutSession(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookSignatureError {
    #[error("Signature header is malformed: {0}")]
    MalformedHeader(String),
    #[error("Signature header contains no v1 signatures")]
    NoSignatures,
    #[error("Signature timestamp is outside the tolerance window")]
    TimestampOutsideTolerance,
    #[error("No signature matches the expected signature for the payload")]
    SignatureMismatch,
    #[error("The webhook secret is not configured")]
    MissingSecret,
    #[error("Signed payload is not a valid event: {0}")]
    InvalidPayload(String),
}
