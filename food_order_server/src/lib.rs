//! # Food order server
//! This crate hosts the HTTP server for the food ordering service. It is responsible for:
//! * Starting checkouts, for individual orders and for shares of group orders.
//! * Creating group orders and handing out the links that invite others to join them.
//! * Receiving payment confirmations from the payment processor, and passing them on to the ordering engine.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/order/checkout/webhook`: Payment processor callbacks. Requests must carry a valid signature.
//! * `/api/order/...`: Order and group order routes. These require a bearer token.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
