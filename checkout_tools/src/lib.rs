//! Thin client for a hosted-checkout payment processor.
//!
//! * [`CheckoutApi`] creates checkout sessions. Each session is one payer's redirect to the hosted payment page.
//! * [`webhook`] verifies the signature on asynchronous event callbacks and parses them into [`WebhookEvent`]s.
//!
//! The client knows nothing about group orders. Correlation metadata is passed through as opaque key/value pairs.
mod api;
mod config;
mod error;
mod helpers;

mod data_objects;
pub mod webhook;

pub use api::CheckoutApi;
pub use config::CheckoutConfig;
pub use data_objects::{
    CheckoutSession,
    CheckoutSessionObject,
    CustomerDetails,
    EventData,
    LineItem,
    NewCheckoutSession,
    WebhookEvent,
    CHECKOUT_SESSION_COMPLETED,
};
pub use error::{CheckoutApiError, WebhookSignatureError};
