use std::fmt::Display;

use food_order_common::Cents;
use food_order_engine::db_types::{CartItem, DeliveryDetails, GroupOrder, GroupOrderId, RestaurantId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupOrderRequest {
    pub cart_items: Vec<CartItem>,
    pub restaurant_id: RestaurantId,
}

/// An individual checkout. If `group_order_id` is present, this is a request to pay a share of that group order
/// instead, and the cart is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionRequest {
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    #[serde(default)]
    pub delivery_details: DeliveryDetails,
    pub restaurant_id: RestaurantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_order_id: Option<GroupOrderId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupOrderRequest {
    #[serde(default)]
    pub delivery_details: DeliveryDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutUrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGroupOrderResponse {
    pub group_order_id: GroupOrderId,
    pub shareable_link: String,
    pub amount_per_person: Cents,
    pub group_order: GroupOrder,
}
