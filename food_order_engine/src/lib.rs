//! Food Order Engine
//!
//! The engine coordinates orders for a food delivery service, including group orders, where several participants
//! each pay an equal share of one cart and the restaurant receives a single order once every share is paid.
//!
//! The library is divided into these sections:
//! 1. The data types ([`mod@db_types`]) and the storage and payment-processor contracts ([`mod@traits`]). SQLite is
//!    the supported storage backend.
//! 2. Pricing ([`mod@share_calculator`]).
//! 3. The public API ([`mod@foe_api`]): creating and joining group orders, individual checkouts and applying payment
//!    confirmations.
//!
//! The engine also emits events when payments land or when something needs an operator's attention. See
//! [`mod@events`] for how to hook into them.
mod db;

pub mod db_types;
pub mod events;
pub mod foe_api;
pub mod share_calculator;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use foe_api::{
    checkout_session::CheckoutSessionFactory,
    errors::{ErrorCategory, OrderFlowError},
    flow_config::OrderFlowConfig,
    group_order_api::GroupOrderApi,
    materializer::Materializer,
    order_checkout_api::OrderCheckoutApi,
    order_objects,
    payment_callback_api::PaymentCallbackApi,
};
pub use traits::StorageError;
