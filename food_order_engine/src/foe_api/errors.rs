use thiserror::Error;

use crate::{
    db_types::{GroupOrderId, OrderId, RestaurantId},
    share_calculator::InvalidCartError,
    traits::{SessionCreationError, StorageError},
};

/// How a caller should treat a failure. The HTTP layer maps these onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    /// The request clashes with the current state of a record (already paid, order full)
    Conflict,
    Upstream,
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid cart: {0}")]
    InvalidCart(#[from] InvalidCartError),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Restaurant {0} not found")]
    RestaurantNotFound(RestaurantId),
    #[error("Group order {0} not found")]
    GroupOrderNotFound(GroupOrderId),
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("You have already joined and paid for this group order")]
    AlreadyPaid,
    #[error("Group Order is full")]
    OrderFull,
    #[error("Could not create a checkout session. {0}")]
    Upstream(#[from] SessionCreationError),
    #[error("Internal consistency check failed: {0}")]
    InvariantViolation(String),
    #[error("Group order {0} is too busy right now. Try again.")]
    TooManyConflicts(GroupOrderId),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl OrderFlowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCart(_) | Self::Validation(_) => ErrorCategory::Validation,
            Self::AlreadyPaid | Self::OrderFull => ErrorCategory::Conflict,
            Self::RestaurantNotFound(_) | Self::GroupOrderNotFound(_) | Self::OrderNotFound(_) => ErrorCategory::NotFound,
            Self::Upstream(_) => ErrorCategory::Upstream,
            Self::InvariantViolation(_) | Self::TooManyConflicts(_) | Self::Storage(_) => ErrorCategory::Internal,
        }
    }
}
