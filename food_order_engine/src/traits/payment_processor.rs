use std::collections::BTreeMap;

use food_order_common::Cents;
use thiserror::Error;

use crate::db_types::{GroupOrderId, OrderId, RestaurantId, UserId};

pub const META_ORDER_ID: &str = "orderId";
pub const META_RESTAURANT_ID: &str = "restaurantId";
pub const META_USER_ID: &str = "userId";
pub const META_PAYER_NAME: &str = "payerName";
pub const META_IS_GROUP_ORDER: &str = "isGroupOrder";
pub const META_GROUP_ORDER_ID: &str = "groupOrderId";

/// The key-value pairs attached to a checkout session. The payment processor echoes them back unchanged in the
/// completion event, which is how a payment is correlated with a local record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationMetadata {
    /// For individual checkouts, the order that is awaiting payment. For group shares, an id unique to the session.
    pub order_id: OrderId,
    pub restaurant_id: RestaurantId,
    pub user_id: UserId,
    pub payer_name: String,
    pub group_order_id: Option<GroupOrderId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid checkout metadata: {0}")]
pub struct MetadataError(pub String);

impl CorrelationMetadata {
    pub fn is_group_order(&self) -> bool {
        self.group_order_id.is_some()
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(META_ORDER_ID.to_string(), self.order_id.to_string());
        map.insert(META_RESTAURANT_ID.to_string(), self.restaurant_id.to_string());
        map.insert(META_USER_ID.to_string(), self.user_id.to_string());
        map.insert(META_PAYER_NAME.to_string(), self.payer_name.clone());
        map.insert(META_IS_GROUP_ORDER.to_string(), self.is_group_order().to_string());
        if let Some(id) = &self.group_order_id {
            map.insert(META_GROUP_ORDER_ID.to_string(), id.to_string());
        }
        map
    }

    /// Rebuilds the metadata from the map echoed back by the processor. Older sessions carry the payer under `name`.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, MetadataError> {
        let get = |key: &str| map.get(key).map(|s| s.trim()).filter(|s| !s.is_empty());
        let required = |key: &str| get(key).map(str::to_string).ok_or_else(|| MetadataError(format!("{key} is missing")));
        let is_group = get(META_IS_GROUP_ORDER).map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false);
        let group_order_id = get(META_GROUP_ORDER_ID).map(GroupOrderId::from);
        if is_group && group_order_id.is_none() {
            return Err(MetadataError("isGroupOrder is set, but groupOrderId is missing".to_string()));
        }
        Ok(Self {
            order_id: OrderId(required(META_ORDER_ID)?),
            restaurant_id: RestaurantId(required(META_RESTAURANT_ID)?),
            user_id: UserId(required(META_USER_ID)?),
            payer_name: get(META_PAYER_NAME).or_else(|| get("name")).unwrap_or_default().to_string(),
            group_order_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    pub unit_amount: Cents,
    pub quantity: i64,
}

impl SessionLineItem {
    pub fn new<S: Into<String>>(name: S, unit_amount: Cents, quantity: i64) -> Self {
        Self { name: name.into(), unit_amount, quantity }
    }

    pub fn total(&self) -> Cents {
        self.unit_amount * self.quantity
    }
}

/// A request for a hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub line_items: Vec<SessionLineItem>,
    pub delivery_fee: Option<Cents>,
    pub currency: String,
    pub metadata: CorrelationMetadata,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
}

impl CheckoutSessionRequest {
    pub fn total(&self) -> Cents {
        self.line_items.iter().map(|i| i.total()).sum::<Cents>() + self.delivery_fee.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionHandle {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionCreationError {
    #[error("The payment processor rejected the checkout session: {0}")]
    Rejected(String),
    #[error("The payment processor could not be reached: {0}")]
    Unavailable(String),
    #[error("The payment processor did not return a checkout URL for session {0}")]
    MissingUrl(String),
}

/// The remote payment processor that hosts checkout pages.
#[allow(async_fn_in_trait)]
pub trait PaymentProcessor {
    async fn create_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSessionHandle, SessionCreationError>;
}
