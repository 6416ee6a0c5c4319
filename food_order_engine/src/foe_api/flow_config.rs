use chrono::Duration;
use food_order_common::CURRENCY_CODE;

use crate::db_types::{GroupOrderId, RestaurantId};

pub const DEFAULT_PARTICIPANTS_PER_GROUP: i64 = 4;
pub const DEFAULT_GROUP_ORDER_TTL: Duration = Duration::hours(48);
/// How long a hosted checkout session stays payable after it is created.
pub const CHECKOUT_SESSION_LIFETIME: Duration = Duration::hours(24);

/// Policy knobs for the order flows.
#[derive(Debug, Clone)]
pub struct OrderFlowConfig {
    /// Base URL of the customer-facing web app. Checkout redirects and shareable links are built from it.
    pub frontend_url: String,
    pub participants_per_group: i64,
    /// How long a group order stays open for joins. `None` means forever.
    pub group_order_ttl: Option<Duration>,
    /// How long after expiry the sweep leaves a group order open. A participant who joined just before expiry can
    /// still pay until their checkout session lapses, so this must be at least [`CHECKOUT_SESSION_LIFETIME`].
    pub sweep_grace: Duration,
    pub currency: String,
}

impl Default for OrderFlowConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            participants_per_group: DEFAULT_PARTICIPANTS_PER_GROUP,
            group_order_ttl: Some(DEFAULT_GROUP_ORDER_TTL),
            sweep_grace: CHECKOUT_SESSION_LIFETIME,
            currency: CURRENCY_CODE.to_string(),
        }
    }
}

impl OrderFlowConfig {
    pub fn new<S: Into<String>>(frontend_url: S) -> Self {
        Self { frontend_url: frontend_url.into(), ..Default::default() }
    }

    fn base(&self) -> &str {
        self.frontend_url.trim_end_matches('/')
    }

    pub fn shareable_link(&self, id: &GroupOrderId) -> String {
        format!("{}/join-order/{id}", self.base())
    }

    pub fn group_success_url(&self) -> String {
        format!("{}/group-order-status?success=true", self.base())
    }

    pub fn individual_success_url(&self) -> String {
        format!("{}/order-status?success=true", self.base())
    }

    pub fn cancel_url(&self, restaurant_id: &RestaurantId) -> String {
        format!("{}/detail/{restaurant_id}?cancelled=true", self.base())
    }
}
