//! # Food ordering engine public API
//!
//! The `foe_api` module exposes the programmatic API of the engine. Each API is created by supplying a storage
//! backend that implements the traits it needs, and where sessions are created, a [`PaymentProcessor`].
//!
//! * [`group_order_api`] creates group orders and prepares participants' checkouts.
//! * [`order_checkout_api`] handles single-payer orders.
//! * [`payment_callback_api`] applies payment confirmations from the processor.
//!
//! ```rust,ignore
//! use food_order_engine::{GroupOrderApi, OrderFlowConfig, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = GroupOrderApi::new(db, my_processor, OrderFlowConfig::new("https://food.example.com"));
//! let created = api.create_group_order(&restaurant_id, &cart, &initiator).await?;
//! println!("Share this: {}", created.shareable_link);
//! ```
//!
//! [`PaymentProcessor`]: crate::traits::PaymentProcessor
pub mod checkout_session;
pub mod errors;
pub mod flow_config;
pub mod group_order_api;
pub mod materializer;
pub mod order_checkout_api;
pub mod order_objects;
pub mod payment_callback_api;

mod retry;
