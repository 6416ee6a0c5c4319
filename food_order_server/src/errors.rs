use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use food_order_engine::{ErrorCategory, OrderFlowError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    OrderFlow(#[from] OrderFlowError),
    #[error("Invalid webhook event. {0}")]
    InvalidWebhookEvent(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidWebhookEvent(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::OrderFlow(e) => match e.category() {
                ErrorCategory::Validation | ErrorCategory::Conflict => StatusCode::BAD_REQUEST,
                ErrorCategory::NotFound => StatusCode::NOT_FOUND,
                ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
                ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {status}: {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    ExpiredToken,
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
}

#[cfg(test)]
mod test {
    use food_order_engine::{db_types::GroupOrderId, traits::SessionCreationError, StorageError};

    use super::*;

    #[test]
    fn order_flow_errors_map_to_status_codes() {
        let status = |e: OrderFlowError| ServerError::from(e).status_code();
        assert_eq!(status(OrderFlowError::AlreadyPaid), StatusCode::BAD_REQUEST);
        assert_eq!(status(OrderFlowError::OrderFull), StatusCode::BAD_REQUEST);
        assert_eq!(status(OrderFlowError::Validation("no email".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(OrderFlowError::GroupOrderNotFound(GroupOrderId::from("g1"))), StatusCode::NOT_FOUND);
        assert_eq!(
            status(OrderFlowError::Upstream(SessionCreationError::Unavailable("timeout".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status(OrderFlowError::TooManyConflicts(GroupOrderId::from("g1"))), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status(OrderFlowError::Storage(StorageError::DatabaseError("locked".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn conflict_messages_are_passed_through() {
        let err = ServerError::from(OrderFlowError::OrderFull);
        assert_eq!(err.to_string(), "Group Order is full");
        assert_eq!(ServerError::from(AuthError::MissingToken).status_code(), StatusCode::UNAUTHORIZED);
    }
}
