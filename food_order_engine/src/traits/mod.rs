//! # Storage and payment-processor contracts.
//!
//! This module defines the behaviour that backends need to expose in order to be supported by the food ordering
//! engine.
//!
//! * [`FoodOrderDatabase`] defines the highest level of behaviour for storage backends.
//! * [`Catalog`] provides read-only access to restaurants, menus and delivery prices.
//! * [`GroupOrderManagement`] stores shared-order records, guarded by optimistic versioning.
//! * [`OrderManagement`] stores the orders restaurants actually fulfil.
//! * [`PaymentProcessor`] creates hosted checkout sessions on a remote payment processor.
mod catalog;
mod data_objects;
mod food_order_database;
mod group_order_management;
mod order_management;
mod payment_processor;

pub use catalog::Catalog;
pub use data_objects::ParticipantPaymentUpdate;
pub use food_order_database::{FoodOrderDatabase, StorageError};
pub use group_order_management::GroupOrderManagement;
pub use order_management::OrderManagement;
pub use payment_processor::{
    CheckoutSessionHandle,
    CheckoutSessionRequest,
    CorrelationMetadata,
    MetadataError,
    PaymentProcessor,
    SessionCreationError,
    SessionLineItem,
    META_GROUP_ORDER_ID,
    META_IS_GROUP_ORDER,
    META_ORDER_ID,
    META_PAYER_NAME,
    META_RESTAURANT_ID,
    META_USER_ID,
};
