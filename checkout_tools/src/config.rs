use std::time::Duration;

use food_order_common::Secret;
use log::*;

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Base URL of the payment processor REST API, without a trailing slash.
    pub api_base: String,
    /// Secret API key used to create sessions.
    pub api_key: Secret<String>,
    /// Shared secret for webhook signatures. This is NOT the API key.
    pub webhook_secret: Secret<String>,
    /// Upper bound on any single request to the processor.
    pub timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: Secret::default(),
            webhook_secret: Secret::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CheckoutConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_base = std::env::var("FOS_CHECKOUT_API_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                info!("FOS_CHECKOUT_API_BASE not set, using {DEFAULT_API_BASE}");
                DEFAULT_API_BASE.to_string()
            });
        let api_key = Secret::new(std::env::var("FOS_CHECKOUT_API_KEY").unwrap_or_else(|_| {
            warn!("FOS_CHECKOUT_API_KEY not set, using (probably useless) default");
            "sk_test_00000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("FOS_CHECKOUT_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("FOS_CHECKOUT_WEBHOOK_SECRET not set. Every webhook call will fail signature verification.");
            String::default()
        }));
        let timeout = std::env::var("FOS_CHECKOUT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid value for FOS_CHECKOUT_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self { api_base, api_key, webhook_secret, timeout }
    }
}
